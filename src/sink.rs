//! Common trait over the delivery clients.

use crate::{
    datagram::DatagramClient, event::LogEvent, server::AcceptServer,
    stream_client::StreamClient,
};

/// Destination that accepts log events without blocking the caller.
pub trait ConsoleSink: Send + Sync {
    /// Deliver or enqueue `event`. Failures are absorbed by the sink.
    fn log_event(&self, event: LogEvent);

    /// Whether events are currently going anywhere.
    fn is_active(&self) -> bool;
}

impl ConsoleSink for StreamClient {
    fn log_event(&self, event: LogEvent) {
        StreamClient::log_event(self, event);
    }

    fn is_active(&self) -> bool {
        self.is_running()
    }
}

impl ConsoleSink for DatagramClient {
    fn log_event(&self, event: LogEvent) {
        DatagramClient::log_event(self, event);
    }

    fn is_active(&self) -> bool {
        self.is_initialized()
    }
}

impl ConsoleSink for AcceptServer {
    fn log_event(&self, event: LogEvent) {
        AcceptServer::log_event(self, event);
    }

    fn is_active(&self) -> bool {
        self.has_client()
    }
}

/// Sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl ConsoleSink for NullSink {
    fn log_event(&self, _event: LogEvent) {}

    fn is_active(&self) -> bool {
        false
    }
}

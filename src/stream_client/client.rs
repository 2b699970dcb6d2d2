//! Public stream client type.

use std::{
    sync::Arc,
    thread::JoinHandle,
    time::Duration,
};

use crossbeam_channel::bounded;
use log::warn;
use parking_lot::{Mutex, RwLock};

use crate::{
    config::ConsoleConfig,
    event::LogEvent,
    formatter::WireFormat,
    level::Severity,
    platform::HostInfo,
    rate_limited_warner::RateLimitedWarner,
    transport::{Connector, Destination, TcpConnector, TransportKind},
};

use super::{
    queue::{QueueError, QueueItem, QueueProducer, delivery_queue},
    state::{ClientSettings, ConnectionState, WorkerShared},
    worker::Worker,
};

/// Client delivering events over TCP from a dedicated worker thread.
///
/// [`log`](Self::log) only enqueues, so callers never wait on the network.
/// The worker connects on [`connect`](Self::connect), reconnects after a
/// fixed delay when the connection drops, and stops on
/// [`disconnect`](Self::disconnect) or when dropped.
///
/// Events are delivered in enqueue order as long as no send fails. A failed
/// event is retried after everything enqueued before the failure was noticed.
pub struct StreamClient {
    destination: Destination,
    connector: Arc<dyn Connector>,
    settings: Arc<ClientSettings>,
    shared: Arc<WorkerShared>,
    capacity: usize,
    producer: RwLock<Option<QueueProducer>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    lifecycle: Mutex<()>,
    warner: RateLimitedWarner,
}

impl StreamClient {
    /// Client for `host:port` with default options.
    pub fn new(host: impl Into<String>, port: u16, use_xml_format: bool) -> Self {
        Self::with_config(&ConsoleConfig::new(host, port).with_xml_format(use_xml_format))
    }

    /// Client built from a configuration, connecting over TCP.
    pub fn with_config(config: &ConsoleConfig) -> Self {
        let connector = Arc::new(TcpConnector::new(config.connect_timeout()));
        Self::with_connector(config, connector)
    }

    /// Client using a custom connector for the stream transport.
    pub fn with_connector(config: &ConsoleConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            destination: config.destination(TransportKind::Stream),
            connector,
            settings: Arc::new(ClientSettings::new(
                config.wire_format(),
                config.auto_reconnect,
                config.reconnect_delay(),
            )),
            shared: Arc::new(WorkerShared::default()),
            capacity: config.queue_capacity.max(1),
            producer: RwLock::new(None),
            handle: Mutex::new(None),
            lifecycle: Mutex::new(()),
            warner: RateLimitedWarner::default(),
        }
    }

    /// Start the worker if needed and report connectivity.
    ///
    /// Blocks until the worker has made at least one connection attempt and
    /// returns its outcome. It does not wait for a later reconnect to succeed;
    /// poll [`is_connected`](Self::is_connected) for that.
    pub fn connect(&self) -> bool {
        if self.is_connected() {
            return true;
        }
        {
            let _lifecycle = self.lifecycle.lock();
            if !self.shared.is_running() && !self.start_worker() {
                return false;
            }
        }
        self.shared.wait_for_attempt();
        self.is_connected()
    }

    /// Stop the worker and close the connection.
    ///
    /// Idempotent and callable from any thread. Events still queued are
    /// discarded.
    pub fn disconnect(&self) {
        let _lifecycle = self.lifecycle.lock();
        let producer = self.producer.write().take();
        self.shared.set_running(false);
        if let Some(producer) = &producer {
            producer.shutdown();
        }
        self.shared.close_connection();
        self.shared.release_attempt();
        if let Some(handle) = self.handle.lock().take()
            && handle.join().is_err()
        {
            warn!("log2console: stream worker for {} panicked", self.destination);
        }
        self.shared.set_state(ConnectionState::Disconnected);
        self.warner.flush(|count| {
            warn!("log2console: dropped {count} events for {}", self.destination);
        });
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Whether a worker is currently accepting events.
    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Total events dropped because the client was stopped or the queue was
    /// full.
    pub fn dropped_events(&self) -> u64 {
        self.shared.dropped()
    }

    /// Events waiting in the queue.
    pub fn pending_events(&self) -> usize {
        self.producer.read().as_ref().map_or(0, QueueProducer::len)
    }

    /// Enqueue an event without blocking.
    pub fn log(&self, level: Severity, category: &str, message: &str) {
        self.log_event(LogEvent::new(level, category, message));
    }

    /// Enqueue a prepared event without blocking.
    ///
    /// The event is dropped when no worker is running or the queue is full.
    pub fn log_event(&self, event: LogEvent) {
        if !self.shared.is_running() {
            self.shared.record_drop();
            return;
        }
        let result = match self.producer.read().as_ref() {
            Some(producer) => producer.push(QueueItem::Event(event)),
            None => Err(QueueError::Closed),
        };
        match result {
            Ok(()) => {}
            Err(QueueError::Closed) => self.shared.record_drop(),
            Err(QueueError::Full) => {
                self.shared.record_drop();
                self.warner.record_drop();
                self.warner.warn_if_due(|count| {
                    warn!("log2console: queue full; dropped {count} events");
                });
            }
        }
    }

    /// Wait until every event enqueued so far has been handed to the socket.
    ///
    /// Returns `false` when the client is stopped, the queue is full, or the
    /// worker does not get there within `timeout` (for example while it is
    /// disconnected).
    pub fn flush(&self, timeout: Duration) -> bool {
        if !self.shared.is_running() {
            return false;
        }
        let (ack_tx, ack_rx) = bounded(1);
        let pushed = self
            .producer
            .read()
            .as_ref()
            .is_some_and(|producer| producer.push(QueueItem::Flush(ack_tx)).is_ok());
        pushed && ack_rx.recv_timeout(timeout).is_ok()
    }

    /// Switch between log4j XML and plain text for subsequent sends.
    pub fn set_xml_format(&self, use_xml: bool) {
        self.settings.set_wire_format(WireFormat::from_xml_flag(use_xml));
    }

    pub fn set_auto_reconnect(&self, enabled: bool) {
        self.settings.set_auto_reconnect(enabled);
    }

    /// Delay between failed connection attempts.
    pub fn set_reconnect_delay(&self, delay: Duration) {
        self.settings.set_reconnect_delay(delay);
    }

    pub fn wire_format(&self) -> WireFormat {
        self.settings.wire_format()
    }

    fn start_worker(&self) -> bool {
        if let Some(previous) = self.handle.lock().take() {
            let _ = previous.join();
        }
        let (producer, consumer) = delivery_queue(self.capacity);
        *self.producer.write() = Some(producer);
        self.shared.begin_run();
        let worker = Worker {
            destination: self.destination.clone(),
            connector: Arc::clone(&self.connector),
            consumer,
            settings: Arc::clone(&self.settings),
            shared: Arc::clone(&self.shared),
            host: HostInfo::current(),
        };
        match worker.spawn() {
            Ok(handle) => {
                *self.handle.lock() = Some(handle);
                true
            }
            Err(err) => {
                warn!("log2console: failed to spawn stream worker: {err}");
                self.producer.write().take();
                self.shared.finish_run();
                false
            }
        }
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl std::fmt::Debug for StreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClient")
            .field("destination", &self.destination)
            .field("state", &self.state())
            .finish()
    }
}

//! Worker thread driving the stream connection.
//!
//! The worker owns the socket. Each iteration either (re)establishes the
//! connection or delivers the next queued item:
//!
//! * Disconnected: attempt a connect. On failure, wait the reconnect delay
//!   and retry when auto-reconnect is enabled, otherwise stop.
//! * Connected: dequeue, format, send. A send failure closes the socket and
//!   puts the event back at the end of the queue.
//!
//! Shutdown interrupts both the queue wait and the reconnect delay.

use std::{
    io,
    sync::Arc,
    thread::{self, JoinHandle},
};

use log::{debug, warn};

use crate::{
    event::LogEvent,
    formatter::format_event,
    platform::HostInfo,
    rate_limited_warner::RateLimitedWarner,
    transport::{Connection, Connector, Destination, send_all},
};

use super::{
    queue::{QueueConsumer, QueueError, QueueItem, Shutdown},
    state::{ClientSettings, ConnectionState, WorkerShared},
};

enum Attempt {
    Connected(Box<dyn Connection>),
    Retry,
    Stop,
}

pub(crate) struct Worker {
    pub(crate) destination: Destination,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) consumer: QueueConsumer,
    pub(crate) settings: Arc<ClientSettings>,
    pub(crate) shared: Arc<WorkerShared>,
    pub(crate) host: &'static HostInfo,
}

impl Worker {
    pub(crate) fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("log2console-{}", self.destination))
            .spawn(move || self.run())
    }

    fn shutdown(&self) -> &Shutdown {
        self.consumer.shutdown_signal()
    }

    fn run(self) {
        let warner = RateLimitedWarner::default();
        let mut connection: Option<Box<dyn Connection>> = None;

        while !self.shutdown().is_triggered() {
            if connection.is_none() {
                match self.establish() {
                    Attempt::Connected(conn) => connection = Some(conn),
                    Attempt::Retry => continue,
                    Attempt::Stop => break,
                }
            }
            let Some(conn) = connection.as_mut() else {
                continue;
            };
            let Some(item) = self.consumer.next() else {
                break;
            };
            match item {
                QueueItem::Flush(ack) => {
                    let _ = ack.send(());
                }
                QueueItem::Event(event) => {
                    if let Err(err) = self.deliver(conn.as_mut(), &event) {
                        if !self.shutdown().is_triggered() {
                            warn!("log2console: send to {} failed: {err}", self.destination);
                        }
                        self.shared.clear_closer();
                        self.shared.set_state(ConnectionState::Disconnected);
                        connection = None;
                        self.requeue(event, &warner);
                    }
                }
            }
        }

        let discarded = self.consumer.discard_pending();
        if discarded > 0 {
            debug!(
                "log2console: discarded {discarded} undelivered events for {}",
                self.destination
            );
        }
        self.shared.finish_run();
    }

    fn establish(&self) -> Attempt {
        self.shared.set_state(ConnectionState::Connecting);
        match self.connector.connect(&self.destination) {
            Ok(conn) => {
                match conn.close_handle() {
                    Ok(closer) => self.shared.register_closer(closer),
                    Err(err) => debug!("log2console: no close handle for connection: {err}"),
                }
                self.shared.set_state(ConnectionState::Connected);
                self.shared.release_attempt();
                debug!("log2console: connected to {}", self.destination);
                Attempt::Connected(conn)
            }
            Err(err) => {
                self.shared.set_state(ConnectionState::Disconnected);
                if !self.settings.auto_reconnect() {
                    warn!(
                        "log2console: connect to {} failed: {err}; auto-reconnect disabled",
                        self.destination
                    );
                    self.shared.set_running(false);
                    self.shared.release_attempt();
                    return Attempt::Stop;
                }
                self.shared.release_attempt();
                let delay = self.settings.reconnect_delay();
                debug!(
                    "log2console: connect to {} failed: {err}; retrying in {delay:?}",
                    self.destination
                );
                if self.consumer.wait_for_shutdown(delay) {
                    Attempt::Stop
                } else {
                    Attempt::Retry
                }
            }
        }
    }

    fn deliver(&self, conn: &mut dyn Connection, event: &LogEvent) -> io::Result<()> {
        let payload = format_event(event, self.settings.wire_format(), self.host);
        send_all(conn, payload.as_bytes())
    }

    fn requeue(&self, event: LogEvent, warner: &RateLimitedWarner) {
        match self.consumer.requeue(event) {
            Ok(()) => {}
            Err(QueueError::Closed) => {}
            Err(QueueError::Full) => {
                self.shared.record_drop();
                warner.record_drop();
                warner.warn_if_due(|count| {
                    warn!("log2console: queue full on retry; dropped {count} events");
                });
            }
        }
    }
}

//! Fire-and-forget UDP delivery.
//!
//! Each event becomes one datagram, so a payload that exceeds the path MTU
//! may be fragmented or dropped by the network. Nothing is retried.

use std::{
    io,
    net::{SocketAddr, UdpSocket},
    sync::atomic::{AtomicBool, Ordering},
};

use log::{debug, warn};
use parking_lot::Mutex;

use crate::{
    config::ConsoleConfig,
    event::LogEvent,
    formatter::{WireFormat, format_event},
    level::Severity,
    platform::HostInfo,
    rate_limited_warner::RateLimitedWarner,
    transport::{Destination, TransportKind},
};

#[derive(Debug)]
struct Endpoint {
    socket: UdpSocket,
    target: SocketAddr,
}

/// UDP client sending one datagram per event.
#[derive(Debug)]
pub struct DatagramClient {
    destination: Destination,
    use_xml: AtomicBool,
    endpoint: Mutex<Option<Endpoint>>,
    warner: RateLimitedWarner,
}

impl DatagramClient {
    pub fn new(host: impl Into<String>, port: u16, use_xml_format: bool) -> Self {
        Self::with_config(&ConsoleConfig::new(host, port).with_xml_format(use_xml_format))
    }

    pub fn with_config(config: &ConsoleConfig) -> Self {
        Self {
            destination: config.destination(TransportKind::Datagram),
            use_xml: AtomicBool::new(config.use_xml_format),
            endpoint: Mutex::new(None),
            warner: RateLimitedWarner::default(),
        }
    }

    /// Bind a local socket and resolve the destination.
    ///
    /// Idempotent. Resolution happens once; later address changes are not
    /// picked up until [`cleanup`](Self::cleanup) and a fresh
    /// `initialize`. Returns `false` if either step fails.
    pub fn initialize(&self) -> bool {
        let mut endpoint = self.endpoint.lock();
        if endpoint.is_some() {
            return true;
        }
        match self.open() {
            Ok(opened) => {
                debug!(
                    "log2console: datagram client sending to {} ({})",
                    self.destination, opened.target
                );
                *endpoint = Some(opened);
                true
            }
            Err(err) => {
                warn!(
                    "log2console: cannot initialise datagram client for {}: {err}",
                    self.destination
                );
                false
            }
        }
    }

    fn open(&self) -> io::Result<Endpoint> {
        let target = self
            .destination
            .resolve()?
            .into_iter()
            .next()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        Ok(Endpoint { socket, target })
    }

    /// Release the socket. Safe to call repeatedly.
    pub fn cleanup(&self) {
        if self.endpoint.lock().take().is_some() {
            debug!("log2console: datagram client for {} closed", self.destination);
        }
        self.warner.flush(|count| {
            warn!("log2console: {count} datagrams to {} failed", self.destination);
        });
    }

    pub fn is_initialized(&self) -> bool {
        self.endpoint.lock().is_some()
    }

    pub fn set_xml_format(&self, use_xml: bool) {
        self.use_xml.store(use_xml, Ordering::Relaxed);
    }

    pub fn wire_format(&self) -> WireFormat {
        WireFormat::from_xml_flag(self.use_xml.load(Ordering::Relaxed))
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn log(&self, level: Severity, category: &str, message: &str) {
        self.log_event(LogEvent::new(level, category, message));
    }

    /// Send `event` as a single datagram.
    ///
    /// Does nothing before [`initialize`](Self::initialize). Send failures
    /// are swallowed.
    pub fn log_event(&self, event: LogEvent) {
        let endpoint = self.endpoint.lock();
        let Some(endpoint) = endpoint.as_ref() else {
            return;
        };
        let payload = format_event(&event, self.wire_format(), HostInfo::current());
        if let Err(err) = endpoint.socket.send_to(payload.as_bytes(), endpoint.target) {
            debug!("log2console: datagram to {} failed: {err}", endpoint.target);
            self.warner.record_drop();
            self.warner.warn_if_due(|count| {
                warn!("log2console: {count} datagrams to {} failed", self.destination);
            });
        }
    }
}

impl Drop for DatagramClient {
    fn drop(&mut self) {
        self.cleanup();
    }
}

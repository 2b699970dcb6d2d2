//! Server mode: the viewer connects to us.
//!
//! [`AcceptServer`] listens on a port and streams events to at most one
//! connected viewer. A newly accepted viewer replaces the previous one.

use std::{
    io::{self, Write},
    net::{Shutdown, SocketAddr, TcpListener, TcpStream},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, warn};
use parking_lot::{Mutex, RwLock};

use crate::{
    event::LogEvent,
    formatter::{WireFormat, format_event},
    level::Severity,
    platform::HostInfo,
};

/// Interval between accept polls.
pub const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Callback told whether a viewer is attached (`true`) or was lost (`false`).
pub type ClientCallback = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Default)]
struct ServerShared {
    running: AtomicBool,
    viewer: Mutex<Option<TcpStream>>,
    callback: RwLock<Option<ClientCallback>>,
}

impl ServerShared {
    fn notify(&self, connected: bool) {
        let callback = self.callback.read().clone();
        if let Some(callback) = callback {
            callback(connected);
        }
    }

    fn attach(&self, stream: TcpStream, peer: SocketAddr) {
        if let Err(err) = prepare_viewer(&stream) {
            warn!("log2console: rejecting viewer {peer}: {err}");
            return;
        }
        let previous = self.viewer.lock().replace(stream);
        if let Some(previous) = previous {
            let _ = previous.shutdown(Shutdown::Both);
            debug!("log2console: viewer replaced by {peer}");
        } else {
            debug!("log2console: viewer {peer} attached");
        }
        self.notify(true);
    }

    /// Drop the current viewer, returning whether one was attached.
    fn detach(&self) -> bool {
        match self.viewer.lock().take() {
            Some(stream) => {
                let _ = stream.shutdown(Shutdown::Both);
                true
            }
            None => false,
        }
    }
}

fn prepare_viewer(stream: &TcpStream) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_nodelay(true)
}

fn accept_loop(listener: TcpListener, shared: Arc<ServerShared>) {
    while shared.running.load(Ordering::Acquire) {
        match listener.accept() {
            Ok((stream, peer)) => shared.attach(stream, peer),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(err) => {
                debug!("log2console: accept failed: {err}");
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
        }
    }
}

/// Listens for a single viewer and streams events to it.
pub struct AcceptServer {
    port: u16,
    use_xml: AtomicBool,
    shared: Arc<ServerShared>,
    local_addr: Mutex<Option<SocketAddr>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    lifecycle: Mutex<()>,
}

impl AcceptServer {
    /// Server for `port`; `0` picks an ephemeral port at
    /// [`start`](Self::start).
    pub fn new(port: u16, use_xml_format: bool) -> Self {
        Self {
            port,
            use_xml: AtomicBool::new(use_xml_format),
            shared: Arc::new(ServerShared::default()),
            local_addr: Mutex::new(None),
            handle: Mutex::new(None),
            lifecycle: Mutex::new(()),
        }
    }

    /// Bind `0.0.0.0:port` and start accepting viewers.
    ///
    /// Returns `true` if the server is running afterwards.
    pub fn start(&self) -> bool {
        let _lifecycle = self.lifecycle.lock();
        if self.is_running() {
            return true;
        }
        let listener = match self.bind() {
            Ok(listener) => listener,
            Err(err) => {
                warn!("log2console: cannot listen on port {}: {err}", self.port);
                return false;
            }
        };
        *self.local_addr.lock() = listener.local_addr().ok();
        self.shared.running.store(true, Ordering::Release);
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("log2console-accept".into())
            .spawn(move || accept_loop(listener, shared));
        match spawned {
            Ok(handle) => {
                *self.handle.lock() = Some(handle);
                true
            }
            Err(err) => {
                warn!("log2console: failed to spawn accept loop: {err}");
                self.shared.running.store(false, Ordering::Release);
                self.local_addr.lock().take();
                false
            }
        }
    }

    fn bind(&self) -> io::Result<TcpListener> {
        let listener = TcpListener::bind(("0.0.0.0", self.port))?;
        listener.set_nonblocking(true)?;
        Ok(listener)
    }

    /// Stop accepting and drop the viewer. Idempotent.
    pub fn stop(&self) {
        let _lifecycle = self.lifecycle.lock();
        self.shared.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.lock().take()
            && handle.join().is_err()
        {
            warn!("log2console: accept loop panicked");
        }
        self.local_addr.lock().take();
        if self.shared.detach() {
            self.shared.notify(false);
        }
    }

    /// Register the viewer attach/detach callback, replacing any previous
    /// one.
    pub fn on_client_change(&self, callback: impl Fn(bool) + Send + Sync + 'static) {
        *self.shared.callback.write() = Some(Arc::new(callback));
    }

    /// Bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    pub fn has_client(&self) -> bool {
        self.shared.viewer.lock().is_some()
    }

    pub fn set_xml_format(&self, use_xml: bool) {
        self.use_xml.store(use_xml, Ordering::Relaxed);
    }

    pub fn wire_format(&self) -> WireFormat {
        WireFormat::from_xml_flag(self.use_xml.load(Ordering::Relaxed))
    }

    pub fn log(&self, level: Severity, category: &str, message: &str) {
        self.log_event(LogEvent::new(level, category, message));
    }

    /// Write `event` to the attached viewer, if any.
    ///
    /// Without a viewer the event is not formatted and takes no sequence
    /// number. A failed write detaches the viewer and fires the callback with
    /// `false`.
    pub fn log_event(&self, event: LogEvent) {
        let failed = {
            let mut viewer = self.shared.viewer.lock();
            let Some(stream) = viewer.as_mut() else {
                return;
            };
            let payload = format_event(&event, self.wire_format(), HostInfo::current());
            match stream.write_all(payload.as_bytes()) {
                Ok(()) => false,
                Err(err) => {
                    debug!("log2console: viewer write failed: {err}");
                    if let Some(stream) = viewer.take() {
                        let _ = stream.shutdown(Shutdown::Both);
                    }
                    true
                }
            }
        };
        if failed {
            self.shared.notify(false);
        }
    }
}

impl Drop for AcceptServer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for AcceptServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcceptServer")
            .field("port", &self.port)
            .field("running", &self.is_running())
            .field("has_client", &self.has_client())
            .finish()
    }
}

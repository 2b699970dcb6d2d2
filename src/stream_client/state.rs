//! State shared between a [`StreamClient`](super::StreamClient) and its
//! worker thread.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::{formatter::WireFormat, transport::CloseHandle};

/// Connectivity of a stream client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
}

impl ConnectionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Connecting,
            2 => Self::Connected,
            _ => Self::Disconnected,
        }
    }
}

/// Options the caller may change while the worker runs.
#[derive(Debug)]
pub(crate) struct ClientSettings {
    use_xml: AtomicBool,
    auto_reconnect: AtomicBool,
    reconnect_delay_ms: AtomicU64,
}

impl ClientSettings {
    pub(crate) fn new(format: WireFormat, auto_reconnect: bool, reconnect_delay: Duration) -> Self {
        let settings = Self {
            use_xml: AtomicBool::new(format.is_xml()),
            auto_reconnect: AtomicBool::new(auto_reconnect),
            reconnect_delay_ms: AtomicU64::new(0),
        };
        settings.set_reconnect_delay(reconnect_delay);
        settings
    }

    pub(crate) fn wire_format(&self) -> WireFormat {
        WireFormat::from_xml_flag(self.use_xml.load(Ordering::Relaxed))
    }

    pub(crate) fn set_wire_format(&self, format: WireFormat) {
        self.use_xml.store(format.is_xml(), Ordering::Relaxed);
    }

    pub(crate) fn auto_reconnect(&self) -> bool {
        self.auto_reconnect.load(Ordering::Relaxed)
    }

    pub(crate) fn set_auto_reconnect(&self, enabled: bool) {
        self.auto_reconnect.store(enabled, Ordering::Relaxed);
    }

    pub(crate) fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms.load(Ordering::Relaxed))
    }

    pub(crate) fn set_reconnect_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.reconnect_delay_ms.store(millis, Ordering::Relaxed);
    }
}

/// Worker status observed by the facade.
#[derive(Debug, Default)]
pub(crate) struct WorkerShared {
    state: AtomicU8,
    running: AtomicBool,
    dropped: AtomicU64,
    closer: Mutex<Option<CloseHandle>>,
    attempted: Mutex<bool>,
    attempt_cv: Condvar,
}

impl WorkerShared {
    pub(crate) fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    pub(crate) fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Prepare for a fresh worker run.
    pub(crate) fn begin_run(&self) {
        *self.attempted.lock() = false;
        self.set_state(ConnectionState::Disconnected);
        self.set_running(true);
    }

    /// Mark the worker as gone and wake anyone waiting on it.
    pub(crate) fn finish_run(&self) {
        self.set_running(false);
        self.set_state(ConnectionState::Disconnected);
        self.closer.lock().take();
        self.release_attempt();
    }

    pub(crate) fn register_closer(&self, closer: CloseHandle) {
        *self.closer.lock() = Some(closer);
    }

    pub(crate) fn clear_closer(&self) {
        self.closer.lock().take();
    }

    /// Close the live connection, if any, from the calling thread.
    pub(crate) fn close_connection(&self) {
        if let Some(closer) = self.closer.lock().take() {
            closer.close();
        }
    }

    /// Record that the first connection attempt has completed.
    pub(crate) fn release_attempt(&self) {
        let mut attempted = self.attempted.lock();
        if !*attempted {
            *attempted = true;
            self.attempt_cv.notify_all();
        }
    }

    /// Block until the current run has made a connection attempt.
    pub(crate) fn wait_for_attempt(&self) {
        let mut attempted = self.attempted.lock();
        while !*attempted {
            self.attempt_cv.wait(&mut attempted);
        }
    }
}

//! Fixtures for exercising clients against local sockets.

use std::{
    io,
    net::{TcpListener, UdpSocket},
    sync::atomic::{AtomicUsize, Ordering},
    thread,
    time::{Duration, Instant},
};

use log2console::{Connection, Connector, Destination};
use rstest::fixture;

/// Listener on an ephemeral loopback port.
#[fixture]
pub fn tcp_listener() -> TcpListener {
    TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener")
}

/// UDP socket on an ephemeral loopback port with a two second read timeout.
#[fixture]
pub fn udp_receiver() -> UdpSocket {
    let socket = UdpSocket::bind(("127.0.0.1", 0)).expect("bind udp receiver");
    socket
        .set_read_timeout(Some(Duration::from_secs(2)))
        .expect("set read timeout");
    socket
}

/// Poll `condition` for up to five seconds.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Connector that refuses every attempt and counts them.
#[derive(Debug, Default)]
pub struct RefusingConnector {
    attempts: AtomicUsize,
}

impl RefusingConnector {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Connector for RefusingConnector {
    fn connect(&self, _destination: &Destination) -> io::Result<Box<dyn Connection>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(io::ErrorKind::ConnectionRefused.into())
    }
}

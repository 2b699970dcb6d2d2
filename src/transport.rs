//! Socket primitives shared by the clients.
//!
//! The stream worker talks to the network only through [`Connector`] and
//! [`Connection`], so tests can substitute in-memory transports. The default
//! implementation wraps `std::net::TcpStream`.

use std::{
    fmt, io,
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    sync::Arc,
    thread,
    time::Duration,
};

/// Pause applied before retrying a write that would block.
pub const WOULD_BLOCK_BACKOFF: Duration = Duration::from_millis(10);

/// Connection-oriented or connectionless delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportKind {
    Stream,
    Datagram,
}

/// Where events are delivered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Destination {
    pub host: String,
    pub port: u16,
    pub kind: TransportKind,
}

impl Destination {
    pub fn new(host: impl Into<String>, port: u16, kind: TransportKind) -> Self {
        Self {
            host: host.into(),
            port,
            kind,
        }
    }

    /// Resolve to IPv4 socket addresses, in resolver order.
    pub fn resolve(&self) -> io::Result<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .filter(SocketAddr::is_ipv4)
            .collect();
        if addrs.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no IPv4 address for {self}"),
            ));
        }
        Ok(addrs)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Tears a connection down from a thread other than its owner.
///
/// Closing makes any blocked or future `send` on the connection fail.
#[derive(Clone)]
pub struct CloseHandle(Arc<dyn Fn() + Send + Sync>);

impl CloseHandle {
    pub fn new(close: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(close))
    }

    pub fn close(&self) {
        (self.0)();
    }
}

impl fmt::Debug for CloseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CloseHandle")
    }
}

/// An established stream connection.
pub trait Connection: Send {
    /// Write some prefix of `buf`, returning the number of bytes accepted.
    fn send(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Handle able to close this connection concurrently.
    fn close_handle(&self) -> io::Result<CloseHandle>;
}

/// Opens stream connections to a destination.
pub trait Connector: Send + Sync {
    fn connect(&self, destination: &Destination) -> io::Result<Box<dyn Connection>>;
}

/// TCP connector with `TCP_NODELAY` and a bounded connect time.
#[derive(Clone, Debug)]
pub struct TcpConnector {
    connect_timeout: Duration,
}

impl TcpConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Connector for TcpConnector {
    fn connect(&self, destination: &Destination) -> io::Result<Box<dyn Connection>> {
        let mut last_err = None;
        for addr in destination.resolve()? {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    stream.set_nonblocking(false)?;
                    return Ok(Box::new(TcpConnection { stream }));
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotConnected,
                format!("unable to connect to {destination}"),
            )
        }))
    }
}

/// Live TCP connection.
#[derive(Debug)]
pub struct TcpConnection {
    stream: TcpStream,
}

impl Connection for TcpConnection {
    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut self.stream, buf)
    }

    fn close_handle(&self) -> io::Result<CloseHandle> {
        let clone = self.stream.try_clone()?;
        Ok(CloseHandle::new(move || {
            let _ = clone.shutdown(Shutdown::Both);
        }))
    }
}

/// Write the whole of `buf`, tolerating partial writes.
///
/// A write that would block is retried after [`WOULD_BLOCK_BACKOFF`]; an
/// interrupted write is retried at once. Any other error, including a write
/// that accepts zero bytes, fails the whole message.
pub fn send_all(conn: &mut dyn Connection, buf: &[u8]) -> io::Result<()> {
    let mut sent = 0;
    while sent < buf.len() {
        match conn.send(&buf[sent..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "connection accepted no bytes",
                ));
            }
            Ok(n) => sent += n,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(WOULD_BLOCK_BACKOFF);
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

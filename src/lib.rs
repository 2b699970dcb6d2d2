//! Deliver application log events to log2console-style viewers.
//!
//! Three delivery modes are provided:
//!
//! * [`StreamClient`]: TCP with a background worker, a bounded queue, and
//!   fixed-delay reconnects. Logging never blocks on the network.
//! * [`DatagramClient`]: one UDP datagram per event, sent on the caller's
//!   thread.
//! * [`AcceptServer`]: listens for a viewer and streams events to it.
//!
//! Events are encoded either as CRLF-terminated plain text or as log4j XML
//! fragments. [`Console`] ties a configured sink to a minimum level and is
//! the intended entry point for applications, usually through the
//! `console_*!` macros.

mod config;
mod console;
mod datagram;
mod event;
mod formatter;
mod level;
#[macro_use]
mod logging_macros;
mod platform;
mod rate_limited_warner;
mod server;
mod sink;
mod stream_client;
mod transport;

#[cfg(test)]
mod test_utils;

pub use config::{
    ConfigError, ConsoleConfig, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_RECONNECT_DELAY_SECONDS, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, SinkKind,
};
pub use console::Console;
pub use datagram::DatagramClient;
pub use event::{LogEvent, SourceLocation};
pub use formatter::{
    EventFormatter, Log4jXmlFormatter, PlainTextFormatter, WireFormat, escape_xml, format_event,
    next_sequence_number, render_template,
};
pub use level::{ParseSeverityError, Severity, log4j_level_name, plain_level_name};
pub use platform::{HostInfo, current_thread_id};
pub use rate_limited_warner::{DEFAULT_WARN_INTERVAL, RateLimitedWarner};
pub use server::{ACCEPT_POLL_INTERVAL, AcceptServer, ClientCallback};
pub use sink::{ConsoleSink, NullSink};
pub use stream_client::{ConnectionState, QueueError, StreamClient};
pub use transport::{
    CloseHandle, Connection, Connector, Destination, TcpConnection, TcpConnector, TransportKind,
    WOULD_BLOCK_BACKOFF, send_all,
};

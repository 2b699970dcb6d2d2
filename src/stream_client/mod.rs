//! TCP delivery with a background worker.
//!
//! [`StreamClient`] queues events on the caller's thread and hands them to a
//! dedicated worker that owns the connection, formats each event in the
//! configured wire format, and reconnects after failures using a fixed
//! delay.

mod client;
mod queue;
mod state;
mod worker;

#[cfg(test)]
mod tests;

pub use client::StreamClient;
pub use queue::QueueError;
pub use state::ConnectionState;

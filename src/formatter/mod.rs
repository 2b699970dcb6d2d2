//! Wire-format encoders for log events.
//!
//! Two encodings are supported: a CRLF-terminated plain-text line and the
//! log4j XML event fragment understood by log2console and similar viewers.
//! Neither format adds framing; receivers split the stream on CRLF or on
//! `</log4j:event>` respectively.

use crate::{event::LogEvent, platform::HostInfo};

mod log4j;
mod plain;
mod template;

pub use log4j::{Log4jXmlFormatter, escape_xml, next_sequence_number};
pub use plain::PlainTextFormatter;
pub use template::render_template;

/// Trait for turning events into wire payloads.
///
/// Implementors must be `Send + Sync` so a formatter can be shared between
/// the caller threads and a client's worker.
pub trait EventFormatter: Send + Sync {
    /// Encode `event` as a complete wire message.
    fn format(&self, event: &LogEvent) -> String;
}

/// Encoding selected on a client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WireFormat {
    PlainText,
    #[default]
    Log4jXml,
}

impl WireFormat {
    /// Map the `useXmlFormat` flag onto a format.
    pub fn from_xml_flag(use_xml: bool) -> Self {
        if use_xml {
            Self::Log4jXml
        } else {
            Self::PlainText
        }
    }

    pub fn is_xml(self) -> bool {
        matches!(self, Self::Log4jXml)
    }
}

/// Encode `event` in `format`, stamping XML events with `host`.
pub fn format_event(event: &LogEvent, format: WireFormat, host: &HostInfo) -> String {
    match format {
        WireFormat::PlainText => PlainTextFormatter.format(event),
        WireFormat::Log4jXml => Log4jXmlFormatter::new(host).format(event),
    }
}

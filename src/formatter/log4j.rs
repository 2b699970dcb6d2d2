//! log4j XML event encoding.
//!
//! The message body is wrapped verbatim in a CDATA section. A message
//! containing `]]>` therefore produces a malformed event; receivers depend
//! on the exact framing so the body is left untouched.

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::UNIX_EPOCH;

use super::EventFormatter;
use crate::{event::LogEvent, platform::HostInfo};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Next value of the process-wide event sequence, starting at 1.
pub fn next_sequence_number() -> u64 {
    // Only atomicity of the increment matters; no other memory is published.
    SEQUENCE.fetch_add(1, Ordering::Relaxed) + 1
}

/// Escape the five XML-reserved characters in a single pass.
///
/// Returns the input unchanged when nothing needs escaping.
pub fn escape_xml(text: &str) -> Cow<'_, str> {
    let Some(first) = text.find(['&', '<', '>', '"', '\'']) else {
        return Cow::Borrowed(text);
    };
    let mut escaped = String::with_capacity(text.len() + 16);
    escaped.push_str(&text[..first]);
    for ch in text[first..].chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Formatter producing `<log4j:event>` fragments.
#[derive(Clone, Copy, Debug)]
pub struct Log4jXmlFormatter<'a> {
    host: &'a HostInfo,
}

impl<'a> Log4jXmlFormatter<'a> {
    pub fn new(host: &'a HostInfo) -> Self {
        Self { host }
    }
}

impl EventFormatter for Log4jXmlFormatter<'_> {
    fn format(&self, event: &LogEvent) -> String {
        let sequence = next_sequence_number();
        let timestamp_ms = event
            .timestamp()
            .duration_since(UNIX_EPOCH)
            .map(|dur| dur.as_millis())
            .unwrap_or_default();
        let logger = escape_xml(event.category());

        let mut out = String::with_capacity(320 + event.message().len());
        out.push_str("<log4j:event logger=\"");
        out.push_str(&logger);
        out.push_str("\" timestamp=\"");
        out.push_str(&timestamp_ms.to_string());
        out.push_str("\" level=\"");
        out.push_str(event.level().as_str());
        out.push_str("\" thread=\"");
        out.push_str(&event.thread_id().to_string());
        out.push_str("\">");

        out.push_str("<log4j:message><![CDATA[");
        out.push_str(event.message());
        out.push_str("]]></log4j:message>");

        if let Some(location) = event.location() {
            out.push_str("<log4j:locationInfo class=\"");
            out.push_str(&logger);
            out.push_str("\" method=\"");
            out.push_str(&escape_xml(&location.method));
            out.push_str("\" file=\"");
            out.push_str(&escape_xml(location.file_name()));
            out.push_str("\" line=\"");
            out.push_str(&location.line.to_string());
            out.push_str("\"/>");
        }

        out.push_str("<log4j:properties>");
        out.push_str("<log4j:data name=\"log4net:HostName\" value=\"");
        out.push_str(&escape_xml(&self.host.host_name));
        out.push_str("\"/>");
        if event.location().is_some() {
            out.push_str("<log4j:data name=\"log4net:UserName\" value=\"");
            out.push_str(&escape_xml(&self.host.user_name));
            out.push_str("\"/>");
        }
        out.push_str("<nlog:eventSequenceNumber>");
        out.push_str(&sequence.to_string());
        out.push_str("</nlog:eventSequenceNumber>");
        out.push_str("</log4j:properties>");
        out.push_str("</log4j:event>");
        out
    }
}

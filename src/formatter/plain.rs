//! Plain-text line encoding.

use chrono::{DateTime, Local};

use super::EventFormatter;
use crate::event::LogEvent;

/// Renders `YYYY-MM-DD HH:MM:SS.mmm [LEVEL] [category] message\r\n` using
/// the local wall-clock time of the event.
#[derive(Copy, Clone, Debug, Default)]
pub struct PlainTextFormatter;

impl EventFormatter for PlainTextFormatter {
    fn format(&self, event: &LogEvent) -> String {
        let local: DateTime<Local> = event.timestamp().into();
        format!(
            "{} [{}] [{}] {}\r\n",
            local.format("%Y-%m-%d %H:%M:%S%.3f"),
            event.level(),
            event.category(),
            event.message()
        )
    }
}

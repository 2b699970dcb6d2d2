//! Log event representation.
//!
//! A [`LogEvent`] is created at the call site, captures the wall-clock time
//! and calling thread at that moment, and is consumed exactly once by a
//! formatter.

use std::fmt;
use std::time::SystemTime;

use crate::{level::Severity, platform::current_thread_id};

/// Call-site information attached to an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLocation {
    /// Function or module path that emitted the event.
    pub method: String,
    /// Source file; directory components are stripped when formatted.
    pub file: String,
    /// Line number in `file`.
    pub line: u32,
}

impl SourceLocation {
    pub fn new(method: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            method: method.into(),
            file: file.into(),
            line,
        }
    }

    /// The file name without any `/` or `\` separated directories.
    pub fn file_name(&self) -> &str {
        self.file
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.file.as_str())
    }
}

/// A single record bound for the console.
#[derive(Clone, Debug)]
pub struct LogEvent {
    level: Severity,
    category: String,
    message: String,
    timestamp: SystemTime,
    thread_id: u64,
    location: Option<SourceLocation>,
}

impl LogEvent {
    /// Capture an event on the current thread.
    pub fn new(level: Severity, category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            category: category.into(),
            message: message.into(),
            timestamp: SystemTime::now(),
            thread_id: current_thread_id(),
            location: None,
        }
    }

    /// Attach call-site information.
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Override the capture time.
    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn level(&self) -> Severity {
        self.level
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    pub fn thread_id(&self) -> u64 {
        self.thread_id
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] [{}] {}", self.level, self.category, self.message)
    }
}

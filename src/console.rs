//! Application-facing logging context.
//!
//! A [`Console`] owns one [`ConsoleSink`] and applies the minimum level
//! before anything is formatted. Build one at startup with
//! [`Console::from_config`] and share it (it is `Send + Sync`) with whatever
//! needs to log.

use std::{fmt, sync::Arc};

use log::{debug, warn};

use crate::{
    config::{ConfigError, ConsoleConfig, SinkKind},
    datagram::DatagramClient,
    event::{LogEvent, SourceLocation},
    formatter::render_template,
    level::Severity,
    sink::{ConsoleSink, NullSink},
    stream_client::StreamClient,
};

/// Front end dispatching events to a configured sink.
#[derive(Clone)]
pub struct Console {
    sink: Arc<dyn ConsoleSink>,
    min_level: Severity,
}

impl Console {
    /// Wrap an existing sink, accepting every level.
    pub fn new(sink: Arc<dyn ConsoleSink>) -> Self {
        Self {
            sink,
            min_level: Severity::Trace,
        }
    }

    /// Console that discards everything.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NullSink))
    }

    /// Validate `config` and build the sink it selects.
    ///
    /// A datagram sink is initialised and a stream sink connected straight
    /// away. An unreachable viewer is not an error: the datagram client
    /// stays inert, and the stream client keeps reconnecting in the
    /// background when auto-reconnect is on.
    pub fn from_config(config: &ConsoleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let sink: Arc<dyn ConsoleSink> = match config.transport {
            SinkKind::Datagram => {
                let client = DatagramClient::with_config(config);
                if !client.initialize() {
                    warn!(
                        "log2console: datagram sink for {} is inactive",
                        client.destination()
                    );
                }
                Arc::new(client)
            }
            SinkKind::Stream => {
                let client = StreamClient::with_config(config);
                if !client.connect() {
                    debug!(
                        "log2console: viewer at {} not reachable yet",
                        client.destination()
                    );
                }
                Arc::new(client)
            }
            SinkKind::Disabled => Arc::new(NullSink),
        };
        Ok(Self::new(sink).with_min_level(config.min_level))
    }

    /// Drop events below `level`.
    pub fn with_min_level(mut self, level: Severity) -> Self {
        self.min_level = level;
        self
    }

    pub fn min_level(&self) -> Severity {
        self.min_level
    }

    pub fn sink(&self) -> &Arc<dyn ConsoleSink> {
        &self.sink
    }

    /// Whether events at `level` pass the minimum level.
    pub fn enabled(&self, level: Severity) -> bool {
        level >= self.min_level
    }

    pub fn is_active(&self) -> bool {
        self.sink.is_active()
    }

    /// Forward a prepared event. Returns `false` if it was filtered out.
    pub fn log_event(&self, event: LogEvent) -> bool {
        if !self.enabled(event.level()) {
            return false;
        }
        self.sink.log_event(event);
        true
    }

    pub fn log(&self, level: Severity, category: &str, message: &str) -> bool {
        self.enabled(level) && self.log_event(LogEvent::new(level, category, message))
    }

    /// Log with call-site information.
    pub fn log_at(
        &self,
        level: Severity,
        category: &str,
        message: &str,
        location: SourceLocation,
    ) -> bool {
        self.enabled(level)
            && self.log_event(LogEvent::new(level, category, message).with_location(location))
    }

    /// Log a message built with [`render_template`].
    ///
    /// The template is only rendered when `level` is enabled.
    pub fn log_fmt(
        &self,
        level: Severity,
        category: &str,
        template: &str,
        args: &[&dyn fmt::Display],
    ) -> bool {
        self.enabled(level) && self.log(level, category, &render_template(template, args))
    }

    pub fn trace(&self, category: &str, message: &str) -> bool {
        self.log(Severity::Trace, category, message)
    }

    pub fn debug(&self, category: &str, message: &str) -> bool {
        self.log(Severity::Debug, category, message)
    }

    pub fn info(&self, category: &str, message: &str) -> bool {
        self.log(Severity::Info, category, message)
    }

    pub fn warn(&self, category: &str, message: &str) -> bool {
        self.log(Severity::Warn, category, message)
    }

    pub fn error(&self, category: &str, message: &str) -> bool {
        self.log(Severity::Error, category, message)
    }

    pub fn fatal(&self, category: &str, message: &str) -> bool {
        self.log(Severity::Fatal, category, message)
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("min_level", &self.min_level)
            .field("active", &self.is_active())
            .finish()
    }
}

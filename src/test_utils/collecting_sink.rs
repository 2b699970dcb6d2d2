//! A sink that keeps every event in memory for assertions.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{event::LogEvent, sink::ConsoleSink};

/// Sink storing every event it receives.
#[derive(Clone, Default)]
pub struct CollectingSink {
    events: Arc<Mutex<Vec<LogEvent>>>,
}

impl CollectingSink {
    /// Snapshot of the events received so far.
    pub fn collected(&self) -> Vec<LogEvent> {
        self.events.lock().clone()
    }
}

impl ConsoleSink for CollectingSink {
    fn log_event(&self, event: LogEvent) {
        self.events.lock().push(event);
    }

    fn is_active(&self) -> bool {
        true
    }
}

use std::io::{self, Result as IoResult, Write};
use std::sync::{Arc, Mutex};

use super::event::SimEvent;
use crate::telemetry::{PlainFormatter, TelemetryFormatter};

/// Abstraction over an output target that consumes full display events.
pub trait EventSink: Send + Sync {
    /// Handle a structured event. The sink decides how to format it.
    fn handle(&mut self, event: &SimEvent) -> IoResult<()>;
}

/// Stdout sink rendering one line per event; the demo binary's narrator.
pub struct StdOutSink<F: TelemetryFormatter = PlainFormatter> {
    formatter: F,
}

impl Default for StdOutSink {
    fn default() -> Self {
        Self {
            formatter: PlainFormatter::new(),
        }
    }
}

impl<F: TelemetryFormatter> StdOutSink<F> {
    pub fn with_formatter(formatter: F) -> Self {
        Self { formatter }
    }
}

impl<F: TelemetryFormatter> EventSink for StdOutSink<F> {
    fn handle(&mut self, event: &SimEvent) -> IoResult<()> {
        let rendered = self.formatter.render_event(event);
        let mut out = io::stdout().lock();
        out.write_all(rendered.as_bytes())?;
        out.flush()
    }
}

/// In-memory sink for tests and snapshots.
#[derive(Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<SimEvent>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every captured event, in emit order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SimEvent> {
        self.entries.lock().expect("sink poisoned").clone()
    }

    pub fn clear(&self) {
        self.entries.lock().expect("sink poisoned").clear();
    }
}

impl EventSink for MemorySink {
    fn handle(&mut self, event: &SimEvent) -> IoResult<()> {
        self.entries
            .lock()
            .expect("sink poisoned")
            .push(event.clone());
        Ok(())
    }
}

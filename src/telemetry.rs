//! Tracing setup and display-event formatting.
//!
//! Structured diagnostics go through `tracing`; display events headed for a
//! stdout sink are rendered by a [`TelemetryFormatter`], with ANSI color
//! gated on TTY detection.

use std::io::IsTerminal;

use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::events::SimEvent;

pub const LINE_COLOR: &str = "\x1b[36m"; // cyan
pub const RESET_COLOR: &str = "\x1b[0m";

/// Install the global tracing subscriber and miette panic hook.
///
/// Filter defaults to `error,claimsim=info` and is overridable via
/// `RUST_LOG`. Safe to call once per process; typically from `main` or a
/// demo binary.
pub fn init_tracing() {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("error,claimsim=info"))
        .unwrap_or_else(|_| EnvFilter::new("error"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();

    miette::set_panic_hook();
}

/// Formatter color mode for sink output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatterMode {
    /// Auto-detect TTY capability (checks `stderr.is_terminal()`).
    #[default]
    Auto,
    /// Always include ANSI color codes.
    Colored,
    /// Never include ANSI color codes.
    Plain,
}

impl FormatterMode {
    #[must_use]
    pub fn is_colored(&self) -> bool {
        match self {
            FormatterMode::Auto => std::io::stderr().is_terminal(),
            FormatterMode::Colored => true,
            FormatterMode::Plain => false,
        }
    }
}

/// Renders a display event into the line a sink writes.
pub trait TelemetryFormatter: Send + Sync {
    fn render_event(&self, event: &SimEvent) -> String;
}

/// Plain text formatter with optional ANSI color.
pub struct PlainFormatter {
    mode: FormatterMode,
}

impl PlainFormatter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: FormatterMode::Auto,
        }
    }

    #[must_use]
    pub fn with_mode(mode: FormatterMode) -> Self {
        Self { mode }
    }
}

impl Default for PlainFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryFormatter for PlainFormatter {
    fn render_event(&self, event: &SimEvent) -> String {
        if self.mode.is_colored() {
            format!("{LINE_COLOR}{event}{RESET_COLOR}\n")
        } else {
            format!("{event}\n")
        }
    }
}

//! Engine diagnostic stream.
//!
//! The engine reports warnings and errors through one process-wide sink, not
//! through per-call return values. A host registers a sink with
//! [`set_error_sink`], chooses the lowest severity it wants with
//! [`set_error_threshold`], and calls [`reset_errors`] before each operation.
//! Anything below the threshold, or reported while no sink is registered, is
//! logged through `tracing` instead.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

// ─── Severity ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning = 1,
    Error = 2,
}

impl Severity {
    fn prefix(self) -> &'static str {
        match self {
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }

    #[cfg(test)]
    fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Severity::Warning),
            2 => Some(Severity::Error),
            _ => None,
        }
    }
}

/// What the engine should do with further diagnostics of the current operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkAction {
    Continue,
    Stop,
}

/// A diagnostic sink receives one formatted line per diagnostic.
pub type ErrorSink = fn(&str) -> SinkAction;

// ─── Process-wide state ──────────────────────────────────────────────────────

static SINK: RwLock<Option<ErrorSink>> = RwLock::new(None);
static THRESHOLD: AtomicU8 = AtomicU8::new(Severity::Error as u8);
static STOPPED: AtomicBool = AtomicBool::new(false);
static WORST: AtomicU8 = AtomicU8::new(0);

/// Register `sink` as the receiver of all engine diagnostics.
pub fn set_error_sink(sink: ErrorSink) {
    let mut slot = SINK.write().unwrap_or_else(|e| e.into_inner());
    *slot = Some(sink);
}

/// Lowest severity delivered to the sink.
pub fn set_error_threshold(level: Severity) {
    THRESHOLD.store(level as u8, Ordering::SeqCst);
}

/// Forget the worst severity seen so far and re-open a stopped sink.
pub fn reset_errors() {
    STOPPED.store(false, Ordering::SeqCst);
    WORST.store(0, Ordering::SeqCst);
}

/// Worst severity reported since the last [`reset_errors`].
#[cfg(test)]
pub(crate) fn worst_severity() -> Option<Severity> {
    Severity::from_u8(WORST.load(Ordering::SeqCst))
}

// ─── Reporting ───────────────────────────────────────────────────────────────

/// Report one diagnostic.
pub fn report(level: Severity, message: impl AsRef<str>) {
    let message = message.as_ref().trim_end_matches('\n');
    WORST.fetch_max(level as u8, Ordering::SeqCst);

    let line = format!("{}: {}", level.prefix(), message);
    if (level as u8) < THRESHOLD.load(Ordering::SeqCst) {
        tracing::debug!(target: "viz::engine", "{line}");
        return;
    }
    if STOPPED.load(Ordering::SeqCst) {
        return;
    }

    // Copy the sink out so it runs without the registration lock held.
    let sink = *SINK.read().unwrap_or_else(|e| e.into_inner());
    match sink {
        Some(sink) => {
            if sink(&line) == SinkAction::Stop {
                STOPPED.store(true, Ordering::SeqCst);
            }
        }
        None => tracing::warn!(target: "viz::engine", "{line}"),
    }
}

pub fn warn(message: impl AsRef<str>) {
    report(Severity::Warning, message);
}

pub fn error(message: impl AsRef<str>) {
    report(Severity::Error, message);
}

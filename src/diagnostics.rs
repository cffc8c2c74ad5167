//! Error channel.
//!
//! The engine reports diagnostics through one process-wide sink. The channel
//! collects those lines for the duration of a single boundary call so they
//! can be merged into that call's error value.
//!
//! Boundary calls run inside a [`Session`], which holds the boundary-wide
//! lock for its whole lifetime and resets the channel on entry. Two calls
//! therefore never interleave their diagnostics.

use std::sync::{Mutex, MutexGuard};

use crate::engine::diag::{self, Severity, SinkAction};

/// Capacity of the collected text, separators included.
pub const CAPACITY: usize = 1024;

static BOUNDARY: Mutex<()> = Mutex::new(());
static CHANNEL: Mutex<ErrorChannel> = Mutex::new(ErrorChannel::new());

/// Bounded, newline-separated diagnostic text.
#[derive(Debug, Default)]
pub struct ErrorChannel {
    text: String,
}

impl ErrorChannel {
    pub const fn new() -> Self {
        Self {
            text: String::new(),
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Append one line. Lines that would not fit are dropped whole.
    pub fn append(&mut self, line: &str) {
        if self.text.len() + line.len() + 1 >= CAPACITY {
            return;
        }
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str(line);
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

fn channel() -> MutexGuard<'static, ErrorChannel> {
    CHANNEL.lock().unwrap_or_else(|e| e.into_inner())
}

/// The sink registered with the engine while a session is open.
pub fn channel_sink(line: &str) -> SinkAction {
    channel().append(line);
    SinkAction::Continue
}

/// Clear collected text and point the engine's diagnostics at this channel,
/// warnings included.
pub fn reset() {
    channel().clear();
    diag::set_error_sink(channel_sink);
    diag::set_error_threshold(Severity::Warning);
    diag::reset_errors();
}

/// One boundary call's exclusive hold on the engine.
pub struct Session {
    _guard: MutexGuard<'static, ()>,
}

impl Session {
    /// Take the boundary lock and reset the channel.
    pub fn begin() -> Self {
        let guard = BOUNDARY.lock().unwrap_or_else(|e| e.into_inner());
        reset();
        Session { _guard: guard }
    }

    pub fn has_diagnostics(&self) -> bool {
        !channel().is_empty()
    }

    /// Collected text, if any.
    pub fn diagnostics(&self) -> Option<String> {
        let channel = channel();
        (!channel.is_empty()).then(|| channel.text().to_string())
    }

    /// Collected text, or `fallback` when nothing was collected.
    pub fn error_or(&self, fallback: &str) -> String {
        self.diagnostics().unwrap_or_else(|| fallback.to_string())
    }
}

#[cfg(test)]
#[path = "../tests/rust/test_diagnostics.rs"]
mod tests;

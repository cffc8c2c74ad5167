/// Engine switches and render configuration.
///
/// `y_invert` and `reduce` are process-wide, like the rest of the engine
/// state: set once through the boundary, read by every later layout and
/// render. `RenderConfig` bundles what one CLI run needs.
use std::sync::atomic::{AtomicBool, Ordering};

static Y_INVERT: AtomicBool = AtomicBool::new(false);
static REDUCE: AtomicBool = AtomicBool::new(false);

pub fn set_y_invert(on: bool) {
    Y_INVERT.store(on, Ordering::SeqCst);
}

pub fn set_reduce(on: bool) {
    REDUCE.store(on, Ordering::SeqCst);
}

/// Snapshot of the process-wide switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineFlags {
    /// Report y growing downwards in coordinate-bearing text output.
    pub y_invert: bool,
    /// Drop isolated nodes before force-directed layout.
    pub reduce: bool,
}

impl EngineFlags {
    pub fn current() -> Self {
        Self {
            y_invert: Y_INVERT.load(Ordering::SeqCst),
            reduce: REDUCE.load(Ordering::SeqCst),
        }
    }
}

/// Configuration for one render run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Layout engine name (e.g. "dot", "neato").
    pub engine: String,
    /// Output format name (e.g. "svg", "plain").
    pub format: String,
    pub y_invert: bool,
    pub reduce: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            engine: "dot".to_string(),
            format: "svg".to_string(),
            y_invert: false,
            reduce: false,
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push this run's switches into the process-wide engine state.
    pub fn apply(&self) {
        set_y_invert(self.y_invert);
        set_reduce(self.reduce);
    }
}

//! Built-in plugin table consulted by every new context.

use crate::engine::layout::{DOT_LAYOUT_LIBRARY, NEATO_LAYOUT_LIBRARY};
use crate::engine::plugin::PreloadedSymbol;
use crate::engine::render::CORE_LIBRARY;
use crate::engine::{Context, Failure};

pub static PRELOADED: &[PreloadedSymbol] = &[
    PreloadedSymbol {
        symbol: "gvplugin_core_LTX_library",
        library: &CORE_LIBRARY,
    },
    PreloadedSymbol {
        symbol: "gvplugin_dot_layout_LTX_library",
        library: &DOT_LAYOUT_LIBRARY,
    },
    PreloadedSymbol {
        symbol: "gvplugin_neato_layout_LTX_library",
        library: &NEATO_LAYOUT_LIBRARY,
    },
];

/// A fresh engine context with every built-in plugin registered.
pub fn new_context() -> Result<Context, Failure> {
    Context::with_plugins(PRELOADED)
}

//! Output formats.
//!
//! A renderer draws the laid-out view of a graph into bytes. Every renderer
//! works from the [`Layout`] attached to the view; the context refuses to
//! render a view that has none.

pub mod dot;
pub mod json;
pub mod plain;
pub mod svg;

use std::sync::LazyLock;

use regex::Regex;

use super::graph::{Graph, SubgraphId};
use super::layout::{Layout, POINTS_PER_INCH, Point};
use super::plugin::{ApiKind, PluginApi, PluginImpl, PluginLibrary, PluginType};
use crate::config::EngineFlags;

/// Trait for output formats.
pub trait Renderer: Sync {
    /// Draw the `sub` view of `graph` using `layout`.
    fn render(&self, graph: &Graph, sub: SubgraphId, layout: &Layout, flags: &EngineFlags) -> Vec<u8>;
}

// ── Shared helpers ───────────────────────────────────────────────────────────

/// Compact decimal: at most two places, no trailing zeros.
pub fn num(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let text = format!("{rounded:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

pub fn inches(points: f64) -> String {
    num(points / POINTS_PER_INCH)
}

/// Cubic Bézier control points tracing a polyline: `3k + 1` points for `k`
/// segments.
pub fn bezier(points: &[Point]) -> Vec<Point> {
    let Some(&first) = points.first() else {
        return Vec::new();
    };
    let mut out = vec![first];
    for w in points.windows(2) {
        let (p, q) = (w[0], w[1]);
        out.push(Point::new(p.x + (q.x - p.x) / 3.0, p.y + (q.y - p.y) / 3.0));
        out.push(Point::new(p.x + 2.0 * (q.x - p.x) / 3.0, p.y + 2.0 * (q.y - p.y) / 3.0));
        out.push(q);
    }
    out
}

/// Maps layout y into the output convention.
#[derive(Debug, Clone, Copy)]
pub struct YAxis {
    invert: bool,
    height: f64,
}

impl YAxis {
    pub fn new(layout: &Layout, flags: &EngineFlags) -> Self {
        Self {
            invert: flags.y_invert,
            height: layout.bb.height(),
        }
    }

    pub fn y(self, y: f64) -> f64 {
        if self.invert { self.height - y } else { y }
    }

    pub fn point(self, p: Point) -> String {
        format!("{},{}", num(p.x), num(self.y(p.y)))
    }
}

static PLAIN_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z_\x{80}-\x{10FFFF}][A-Za-z0-9_\x{80}-\x{10FFFF}]*|-?(?:\.[0-9]+|[0-9]+(?:\.[0-9]*)?))$")
        .expect("id pattern is valid")
});

const KEYWORDS: &[&str] = &["node", "edge", "graph", "digraph", "subgraph", "strict"];

/// An identifier as it must appear in DOT text.
pub fn quote_id(id: &str) -> String {
    let keyword = KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(id));
    if !keyword && PLAIN_ID.is_match(id) {
        return id.to_string();
    }
    let mut out = String::with_capacity(id.len() + 2);
    out.push('"');
    for c in id.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Name shown for the view: the graph name at the root, else the subgraph's.
pub fn view_name(graph: &Graph, sub: SubgraphId) -> &str {
    if sub.is_root() {
        graph.name()
    } else {
        graph.subgraph_name(sub).unwrap_or_default()
    }
}

// ── Plugin library ───────────────────────────────────────────────────────────

pub static CORE_LIBRARY: PluginLibrary = PluginLibrary {
    name: "core",
    apis: &[PluginApi {
        kind: ApiKind::Render,
        types: &[
            PluginType {
                name: "svg",
                quality: 1,
                imp: PluginImpl::Render(&svg::SvgRenderer),
            },
            PluginType {
                name: "dot",
                quality: 1,
                imp: PluginImpl::Render(&dot::DotRenderer { layout_attrs: true }),
            },
            PluginType {
                name: "gv",
                quality: 1,
                imp: PluginImpl::Render(&dot::DotRenderer { layout_attrs: true }),
            },
            PluginType {
                name: "canon",
                quality: 1,
                imp: PluginImpl::Render(&dot::DotRenderer { layout_attrs: false }),
            },
            PluginType {
                name: "plain",
                quality: 1,
                imp: PluginImpl::Render(&plain::PlainRenderer),
            },
            PluginType {
                name: "json",
                quality: 1,
                imp: PluginImpl::Render(&json::JsonRenderer),
            },
        ],
    }],
};

#[cfg(test)]
#[path = "../../../tests/rust/test_engine_render.rs"]
mod tests;

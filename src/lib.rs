//! viz-component: a graph layout and rendering engine behind a narrow,
//! handle-based boundary.
//!
//! Hosts build or parse graphs, lay them out with a reusable [`Context`] and
//! render them to text or bytes. Engine diagnostics reported during a call
//! come back as that call's [`VizError`].
//!
//! ```
//! use viz_component::{add_edge, create_context, create_graph, layout, render};
//!
//! let graph = create_graph("g", true, false);
//! add_edge(&graph, "A", "B");
//! let ctx = create_context();
//! layout(&ctx, &graph, "dot").unwrap();
//! let svg = render(&ctx, &graph, "svg").unwrap();
//! assert!(svg.contains("<title>A</title>"));
//! ```
//!
//! Modules:
//!   marshal      boundary string ⇄ engine string copies
//!   diagnostics  error channel and boundary lock
//!   resource     Graph / Context / Node / Edge handles
//!   api          boundary operations
//!   plugins      built-in plugin table
//!   config       engine switches and CLI render config
//!   engine       DOT reader, graph store, layouts, renderers

pub mod api;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod marshal;
pub mod plugins;
pub mod resource;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use api::{
    add_edge, add_node, add_subgraph, create_context, create_graph, free_layout,
    get_graphviz_version, get_plugin_list, layout, read_one_graph, render, render_bytes,
    render_dot, render_dot_bytes, set_attribute, set_default_edge_attribute,
    set_default_graph_attribute, set_default_node_attribute, set_node_attribute, set_reduce,
    set_y_invert,
};
pub use config::RenderConfig;
pub use error::{VizError, VizResult};
pub use resource::{AttributeValue, Context, Edge, Graph, Node, Object, Ownership};

/// Parse `text`, lay it out and render it as configured, applying the
/// config's engine switches first.
pub fn render_with_config(text: &str, config: &RenderConfig) -> VizResult<Vec<u8>> {
    config.apply();
    let ctx = create_context();
    render_dot_bytes(&ctx, text, &config.engine, &config.format)
}

//! Boundary operations.
//!
//! Graph construction, layout and rendering as exposed to embedding hosts.
//! Every call that can fail runs inside a [`Session`]: it holds the boundary
//! lock, starts from an empty error channel, and merges the engine's
//! structural result with whatever diagnostics it reported into one
//! [`VizError`].

use crate::config;
use crate::diagnostics::Session;
use crate::engine::graph::set_global_default;
use crate::engine::{self, Desc, Failure, ObjKind, SubgraphId, Value, read};
use crate::error::{VizError, VizResult};
use crate::marshal::{from_native, from_native_bytes, to_native};
use crate::plugins;
use crate::resource::{AttributeValue, Context, Edge, Graph, Node, Object};

const CONTEXT_UNAVAILABLE: &str = "Error: Could not create Graphviz context.";
const READ_FAILED: &str = "Failed to read graph: unknown error.";
const RENDER_NO_DATA: &str = "Failed to render graph: no data returned.";
const RENDER_FAILED: &str = "Failed to render graph.";
const LAYOUT_FAILED: &str = "Layout failed.";
const PIPELINE_READ_FAILED: &str = "Failed to read graph from DOT string.";
const PIPELINE_RENDER_FAILED: &str = "Render failed.";

// ─── Engine switches ─────────────────────────────────────────────────────────

pub fn set_y_invert(flag: i32) {
    config::set_y_invert(flag != 0);
}

pub fn set_reduce(flag: i32) {
    config::set_reduce(flag != 0);
}

// ─── Queries ─────────────────────────────────────────────────────────────────

/// Version of the engine, read from a throwaway context.
pub fn get_graphviz_version() -> String {
    let _session = Session::begin();
    match plugins::new_context() {
        Ok(mut ctx) => {
            let version = from_native(Some(ctx.version()));
            ctx.finalize();
            version
        }
        Err(Failure) => CONTEXT_UNAVAILABLE.to_string(),
    }
}

/// Names of the registered plugins of `kind` ("layout", "render" or "device"), read
/// from a throwaway context. Empty when the context or the kind is unknown.
pub fn get_plugin_list(kind: &str) -> Vec<String> {
    let _session = Session::begin();
    let Ok(mut ctx) = plugins::new_context() else {
        return Vec::new();
    };
    let kind = to_native(kind);
    let names = ctx.plugin_list(kind.as_str()).unwrap_or_default();
    ctx.finalize();
    names
}

// ─── Graph construction ──────────────────────────────────────────────────────

pub fn create_graph(name: &str, directed: bool, strict: bool) -> Graph {
    let name = to_native(name);
    Graph::owned(engine::Graph::open(name.as_str(), Desc { directed, strict }))
}

fn apply_label_default() {
    set_global_default(ObjKind::Node, "label", Value::plain("\\N"));
}

/// Parse exactly one graph from `text`.
///
/// Any further graphs in `text` are read and closed so the reader is left
/// empty. Diagnostics from any of them fail the call.
pub fn read_one_graph(text: &str) -> VizResult<Graph> {
    let session = Session::begin();
    read_one_graph_in(&session, text)
}

fn read_one_graph_in(session: &Session, text: &str) -> VizResult<Graph> {
    apply_label_default();

    let text = to_native(text);
    let graph = read::mem_read(Some(text.as_c_str()));
    while let Some(extra) = read::mem_read(None) {
        tracing::debug!(graph = extra.name(), "discarding trailing graph");
    }

    if let Some(message) = session.diagnostics() {
        drop(graph);
        return Err(VizError::Parse(message));
    }
    graph
        .map(Graph::owned)
        .ok_or_else(|| VizError::Parse(READ_FAILED.to_string()))
}

/// Get or create the node `name` in `graph`.
pub fn add_node(graph: &Graph, name: &str) -> Node {
    let name = to_native(name);
    let id = graph
        .native()
        .with_mut(|g| g.node(graph.sub(), name.as_str(), true))
        .flatten()
        .unwrap_or_else(engine::NodeId::end);
    Node::new(graph.native().clone(), id)
}

/// Get or create both endpoints, then add an unkeyed edge between them.
pub fn add_edge(graph: &Graph, tail: &str, head: &str) -> Edge {
    let (tail, head) = (to_native(tail), to_native(head));
    let sub = graph.sub();
    let id = graph
        .native()
        .with_mut(|g| {
            let t = g.node(sub, tail.as_str(), true)?;
            let h = g.node(sub, head.as_str(), true)?;
            g.edge(sub, t, h, None, true)
        })
        .flatten()
        .unwrap_or_else(engine::EdgeId::end);
    Edge::new(graph.native().clone(), id)
}

/// Get or create the subgraph `name` under `graph`.
pub fn add_subgraph(graph: &Graph, name: &str) -> Graph {
    let name = to_native(name);
    let sub = graph
        .native()
        .with_mut(|g| g.subgraph(graph.sub(), name.as_str(), true))
        .flatten();
    match sub {
        Some(sub) => Graph::borrowed(graph.native().clone(), sub),
        None => {
            tracing::debug!(name = name.as_str(), "subgraph requested on a closed graph");
            Graph::borrowed(graph.native().clone(), graph.sub())
        }
    }
}

fn set_default(graph: &Graph, kind: ObjKind, name: &str, value: &AttributeValue) {
    let name = to_native(name);
    let value = value.to_engine();
    graph
        .native()
        .with_mut(|g| g.declare(graph.sub(), kind, name.as_str(), value));
}

pub fn set_default_graph_attribute(graph: &Graph, name: &str, value: &AttributeValue) {
    set_default(graph, ObjKind::Graph, name, value);
}

pub fn set_default_node_attribute(graph: &Graph, name: &str, value: &AttributeValue) {
    set_default(graph, ObjKind::Node, name, value);
}

pub fn set_default_edge_attribute(graph: &Graph, name: &str, value: &AttributeValue) {
    set_default(graph, ObjKind::Edge, name, value);
}

/// Set `name` on one graph, node or edge, declaring it with an empty
/// default if the graph does not know it. Does nothing for objects of a
/// closed graph.
pub fn set_attribute<'a>(object: impl Into<Object<'a>>, name: &str, value: &AttributeValue) {
    let Some((native, obj)) = object.into().resolve() else {
        return;
    };
    let name = to_native(name);
    native.with_mut(|g| g.set(obj, name.as_str(), value.to_engine()));
}

/// Get or create the node `node_name`, then set `name` on it.
pub fn set_node_attribute(graph: &Graph, node_name: &str, name: &str, value: &AttributeValue) {
    let node = add_node(graph, node_name);
    set_attribute(&node, name, value);
}

// ─── Layout and render ───────────────────────────────────────────────────────

/// A context with the built-in plugins registered.
///
/// The plugin table is static, so failure here means the process cannot
/// allocate; it aborts like any other allocation failure.
pub fn create_context() -> Context {
    match plugins::new_context() {
        Ok(ctx) => Context::new(ctx),
        Err(Failure) => {
            tracing::error!("engine context could not be created");
            std::process::abort()
        }
    }
}

/// Lay out `graph` with `engine`, replacing any layout it already has.
pub fn layout(ctx: &Context, graph: &Graph, engine: &str) -> VizResult<()> {
    let session = Session::begin();
    let engine = to_native(engine);
    let status = graph
        .native()
        .with_mut(|g| ctx.engine().layout(g, graph.sub(), engine.as_str()));

    match status {
        Some(Ok(())) if !session.has_diagnostics() => Ok(()),
        _ => Err(VizError::Layout(session.error_or(LAYOUT_FAILED))),
    }
}

/// Release the layout attached to `graph`. No-op when there is none.
pub fn free_layout(ctx: &Context, graph: &Graph) {
    graph
        .native()
        .with_mut(|g| ctx.engine().free_layout(g, graph.sub()));
}

/// Render the laid-out `graph` as `format`, returning the exact bytes.
pub fn render_bytes(ctx: &Context, graph: &Graph, format: &str) -> VizResult<Vec<u8>> {
    let session = Session::begin();
    let format = to_native(format);
    let status = graph
        .native()
        .with(|g| ctx.engine().render(g, graph.sub(), format.as_str()));

    match status {
        Some(Ok(data)) if !session.has_diagnostics() => {
            if data.is_empty() {
                return Err(VizError::Render(RENDER_NO_DATA.to_string()));
            }
            Ok(from_native_bytes(Some(data.as_bytes())))
        }
        _ => Err(VizError::Render(session.error_or(RENDER_FAILED))),
    }
}

/// [`render_bytes`] as text. Invalid UTF-8 is replaced, never truncated.
pub fn render(ctx: &Context, graph: &Graph, format: &str) -> VizResult<String> {
    render_bytes(ctx, graph, format).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

/// Parse, lay out and render one graph in a single call.
///
/// The graph never reaches the caller: its layout is freed and the graph
/// closed on every path out of this function.
pub fn render_dot_bytes(ctx: &Context, text: &str, engine: &str, format: &str) -> VizResult<Vec<u8>> {
    let session = Session::begin();
    apply_label_default();

    let text = to_native(text);
    let Some(mut graph) = read::mem_read(Some(text.as_c_str())) else {
        return Err(VizError::Parse(session.error_or(PIPELINE_READ_FAILED)));
    };

    let result = layout_and_render(ctx.engine(), &mut graph, engine, format, &session);

    ctx.engine().free_layout(&mut graph, SubgraphId::ROOT);
    tracing::debug!(graph = graph.name(), ok = result.is_ok(), "pipeline graph closed");
    drop(graph);
    result
}

fn layout_and_render(
    ctx: &engine::Context,
    graph: &mut engine::Graph,
    layout_engine: &str,
    format: &str,
    session: &Session,
) -> VizResult<Vec<u8>> {
    let layout_engine = to_native(layout_engine);
    ctx.layout(graph, SubgraphId::ROOT, layout_engine.as_str())
        .map_err(|Failure| VizError::Layout(session.error_or(LAYOUT_FAILED)))?;

    let format = to_native(format);
    match ctx.render(graph, SubgraphId::ROOT, format.as_str()) {
        Ok(data) if !data.is_empty() => Ok(from_native_bytes(Some(data.as_bytes()))),
        _ => Err(VizError::Render(session.error_or(PIPELINE_RENDER_FAILED))),
    }
}

/// [`render_dot_bytes`] as text.
pub fn render_dot(ctx: &Context, text: &str, engine: &str, format: &str) -> VizResult<String> {
    render_dot_bytes(ctx, text, engine, format).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
#[path = "../tests/rust/test_api.rs"]
mod tests;

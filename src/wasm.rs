//! WASM bindings.
//!
//! Exposes graphs, nodes, edges and contexts as JavaScript classes plus one-shot
//! `renderDot`, `graphvizVersion` and `pluginList` functions. Errors become
//! `JsError`s carrying the merged diagnostic text.

use wasm_bindgen::prelude::*;

use crate::api;
use crate::resource::{AttributeValue, Context, Edge, Graph, Node};

fn value(text: &str, html: bool) -> AttributeValue {
    if html {
        AttributeValue::Html(text.to_string())
    } else {
        AttributeValue::Plain(text.to_string())
    }
}

fn js_err(e: crate::VizError) -> JsError {
    JsError::new(e.message())
}

/// A root graph or subgraph view.
#[wasm_bindgen]
pub struct VizGraph {
    inner: Graph,
}

#[wasm_bindgen]
impl VizGraph {
    #[wasm_bindgen(constructor)]
    pub fn new(name: &str, directed: bool, strict: bool) -> VizGraph {
        VizGraph {
            inner: api::create_graph(name, directed, strict),
        }
    }

    /// Parse one graph from DOT text.
    #[wasm_bindgen(js_name = "fromDot")]
    pub fn from_dot(text: &str) -> Result<VizGraph, JsError> {
        let inner = api::read_one_graph(text).map_err(js_err)?;
        Ok(VizGraph { inner })
    }

    #[wasm_bindgen(js_name = "addNode")]
    pub fn add_node(&self, name: &str) -> VizNode {
        VizNode {
            inner: api::add_node(&self.inner, name),
        }
    }

    #[wasm_bindgen(js_name = "addEdge")]
    pub fn add_edge(&self, tail: &str, head: &str) -> VizEdge {
        VizEdge {
            inner: api::add_edge(&self.inner, tail, head),
        }
    }

    #[wasm_bindgen(js_name = "addSubgraph")]
    pub fn add_subgraph(&self, name: &str) -> VizGraph {
        VizGraph {
            inner: api::add_subgraph(&self.inner, name),
        }
    }

    #[wasm_bindgen(js_name = "setDefaultGraphAttribute")]
    pub fn set_default_graph_attribute(&self, name: &str, text: &str, html: bool) {
        api::set_default_graph_attribute(&self.inner, name, &value(text, html));
    }

    #[wasm_bindgen(js_name = "setDefaultNodeAttribute")]
    pub fn set_default_node_attribute(&self, name: &str, text: &str, html: bool) {
        api::set_default_node_attribute(&self.inner, name, &value(text, html));
    }

    #[wasm_bindgen(js_name = "setDefaultEdgeAttribute")]
    pub fn set_default_edge_attribute(&self, name: &str, text: &str, html: bool) {
        api::set_default_edge_attribute(&self.inner, name, &value(text, html));
    }

    #[wasm_bindgen(js_name = "setAttribute")]
    pub fn set_attribute(&self, name: &str, text: &str, html: bool) {
        api::set_attribute(&self.inner, name, &value(text, html));
    }

    #[wasm_bindgen(js_name = "setNodeAttribute")]
    pub fn set_node_attribute(&self, node: &str, name: &str, text: &str, html: bool) {
        api::set_node_attribute(&self.inner, node, name, &value(text, html));
    }

    #[wasm_bindgen(js_name = "nodeCount")]
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    #[wasm_bindgen(js_name = "edgeCount")]
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }
}

/// A node of a graph. Inert once its root graph is freed.
#[wasm_bindgen]
pub struct VizNode {
    inner: Node,
}

#[wasm_bindgen]
impl VizNode {
    pub fn name(&self) -> Option<String> {
        self.inner.name()
    }

    #[wasm_bindgen(js_name = "setAttribute")]
    pub fn set_attribute(&self, name: &str, text: &str, html: bool) {
        api::set_attribute(&self.inner, name, &value(text, html));
    }

    /// Text of attribute `name`, or `undefined` when unset.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.inner.attribute(name).map(|v| v.text().to_string())
    }
}

/// An edge of a graph. Inert once its root graph is freed.
#[wasm_bindgen]
pub struct VizEdge {
    inner: Edge,
}

#[wasm_bindgen]
impl VizEdge {
    pub fn tail(&self) -> Option<VizNode> {
        self.inner.tail().map(|inner| VizNode { inner })
    }

    pub fn head(&self) -> Option<VizNode> {
        self.inner.head().map(|inner| VizNode { inner })
    }

    #[wasm_bindgen(js_name = "setAttribute")]
    pub fn set_attribute(&self, name: &str, text: &str, html: bool) {
        api::set_attribute(&self.inner, name, &value(text, html));
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.inner.attribute(name).map(|v| v.text().to_string())
    }
}

/// A reusable layout and render context.
#[wasm_bindgen]
pub struct VizContext {
    inner: Context,
}

#[wasm_bindgen]
impl VizContext {
    #[wasm_bindgen(constructor)]
    pub fn new() -> VizContext {
        VizContext {
            inner: api::create_context(),
        }
    }

    pub fn layout(&self, graph: &VizGraph, engine: &str) -> Result<(), JsError> {
        api::layout(&self.inner, &graph.inner, engine).map_err(js_err)
    }

    #[wasm_bindgen(js_name = "freeLayout")]
    pub fn free_layout(&self, graph: &VizGraph) {
        api::free_layout(&self.inner, &graph.inner);
    }

    pub fn render(&self, graph: &VizGraph, format: &str) -> Result<String, JsError> {
        api::render(&self.inner, &graph.inner, format).map_err(js_err)
    }

    /// Rendered output as raw bytes (`Uint8Array`).
    #[wasm_bindgen(js_name = "renderBytes")]
    pub fn render_bytes(&self, graph: &VizGraph, format: &str) -> Result<Vec<u8>, JsError> {
        api::render_bytes(&self.inner, &graph.inner, format).map_err(js_err)
    }
}

impl Default for VizContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse, lay out and render DOT text in one call.
#[wasm_bindgen(js_name = "renderDot")]
pub fn render_dot(text: &str, engine: &str, format: &str) -> Result<String, JsError> {
    let ctx = api::create_context();
    api::render_dot(&ctx, text, engine, format).map_err(js_err)
}

#[wasm_bindgen(js_name = "graphvizVersion")]
pub fn graphviz_version() -> String {
    api::get_graphviz_version()
}

#[wasm_bindgen(js_name = "pluginList")]
pub fn plugin_list(kind: &str) -> Vec<String> {
    api::get_plugin_list(kind)
}

#[wasm_bindgen(js_name = "setYInvert")]
pub fn set_y_invert(on: bool) {
    api::set_y_invert(on as i32);
}

#[wasm_bindgen(js_name = "setReduce")]
pub fn set_reduce(on: bool) {
    api::set_reduce(on as i32);
}

#[cfg(test)]
#[path = "../tests/rust/test_wasm.rs"]
mod tests;

//! Boundary handles.
//!
//! Every engine object handed across the boundary is wrapped in a handle. A
//! root graph lives in a shared slot that its own handle empties on drop;
//! subgraph, node and edge handles keep a reference to the same slot, so
//! once the root is closed they see an empty slot and stop touching engine
//! storage. Contexts are owned outright and finalized exactly once.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::engine::{self, EdgeId, NodeId, ObjRef, SubgraphId, Value, html};

// ─── Shared slot ─────────────────────────────────────────────────────────────

pub(crate) struct Native<T>(Rc<RefCell<Option<T>>>);

impl<T> Clone for Native<T> {
    fn clone(&self) -> Self {
        Native(Rc::clone(&self.0))
    }
}

impl<T> Native<T> {
    fn new(value: T) -> Self {
        Native(Rc::new(RefCell::new(Some(value))))
    }

    /// Run `f` on the object, or return `None` if it has been released.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let slot = self.0.try_borrow().ok()?;
        slot.as_ref().map(f)
    }

    pub(crate) fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut slot = self.0.try_borrow_mut().ok()?;
        slot.as_mut().map(f)
    }

    fn take(&self) -> Option<T> {
        self.0.try_borrow_mut().ok()?.take()
    }

    fn same(&self, other: &Native<T>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Whether a handle releases its object when dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owned,
    Borrowed,
}

// ─── Attribute values ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Plain(String),
    Html(String),
}

impl AttributeValue {
    pub(crate) fn to_engine(&self) -> Value {
        match self {
            AttributeValue::Plain(text) => Value::plain(text.as_str()),
            AttributeValue::Html(text) => html::strdup_html(text),
        }
    }

    fn from_engine(value: &Value) -> Self {
        if value.html {
            AttributeValue::Html(value.text.clone())
        } else {
            AttributeValue::Plain(value.text.clone())
        }
    }

    pub fn text(&self) -> &str {
        match self {
            AttributeValue::Plain(t) | AttributeValue::Html(t) => t,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(text: &str) -> Self {
        AttributeValue::Plain(text.to_string())
    }
}

// ─── Graph ───────────────────────────────────────────────────────────────────

/// A root graph (owned) or a subgraph view into one (borrowed).
pub struct Graph {
    native: Native<engine::Graph>,
    sub: SubgraphId,
    ownership: Ownership,
}

impl Graph {
    pub(crate) fn owned(graph: engine::Graph) -> Self {
        Graph {
            native: Native::new(graph),
            sub: SubgraphId::ROOT,
            ownership: Ownership::Owned,
        }
    }

    pub(crate) fn borrowed(native: Native<engine::Graph>, sub: SubgraphId) -> Self {
        Graph {
            native,
            sub,
            ownership: Ownership::Borrowed,
        }
    }

    pub(crate) fn native(&self) -> &Native<engine::Graph> {
        &self.native
    }

    pub(crate) fn sub(&self) -> SubgraphId {
        self.sub
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Whether the underlying graph is still open.
    pub fn is_open(&self) -> bool {
        self.native.with(|g| g.has_subgraph(self.sub)).unwrap_or(false)
    }

    /// Whether both handles view the same graph or subgraph.
    pub fn same_as(&self, other: &Graph) -> bool {
        self.native.same(&other.native) && self.sub == other.sub
    }

    pub fn name(&self) -> Option<String> {
        self.native
            .with(|g| {
                if self.sub.is_root() {
                    Some(g.name().to_string())
                } else {
                    g.subgraph_name(self.sub).map(str::to_string)
                }
            })
            .flatten()
    }

    pub fn is_directed(&self) -> Option<bool> {
        self.native.with(|g| g.is_directed())
    }

    pub fn is_strict(&self) -> Option<bool> {
        self.native.with(|g| g.is_strict())
    }

    pub fn node_count(&self) -> usize {
        self.native.with(|g| g.subgraph_nodes(self.sub).len()).unwrap_or(0)
    }

    pub fn edge_count(&self) -> usize {
        self.native.with(|g| g.subgraph_edges(self.sub).len()).unwrap_or(0)
    }

    /// Names of the nodes in this view, in creation order.
    pub fn node_names(&self) -> Vec<String> {
        self.native
            .with(|g| {
                g.subgraph_nodes(self.sub)
                    .iter()
                    .filter_map(|&n| g.node_name(n).map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `(tail, head)` names of the edges in this view, in creation order.
    pub fn edge_names(&self) -> Vec<(String, String)> {
        self.native
            .with(|g| {
                g.subgraph_edges(self.sub)
                    .iter()
                    .filter_map(|&e| {
                        let (t, h) = g.endpoints(e)?;
                        Some((g.node_name(t)?.to_string(), g.node_name(h)?.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn attribute(&self, name: &str) -> Option<AttributeValue> {
        attribute(&self.native, ObjRef::Graph(self.sub), name)
    }

    /// Look up an existing node by name without creating it.
    pub fn find_node(&self, name: &str) -> Option<Node> {
        let id = self
            .native
            .with(|g| g.find_node(name).filter(|&n| g.contains_node(self.sub, n)))
            .flatten()?;
        Some(Node::new(self.native.clone(), id))
    }

    /// Whether a layout is attached to this view.
    pub fn has_layout(&self) -> bool {
        self.native.with(|g| g.layout(self.sub).is_some()).unwrap_or(false)
    }
}

impl Drop for Graph {
    fn drop(&mut self) {
        if self.ownership != Ownership::Owned {
            return;
        }
        if let Some(graph) = self.native.take() {
            tracing::debug!(
                graph = graph.name(),
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                "graph closed"
            );
        }
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("name", &self.name())
            .field("sub", &self.sub)
            .field("ownership", &self.ownership)
            .field("open", &self.is_open())
            .finish()
    }
}

fn attribute(native: &Native<engine::Graph>, obj: ObjRef, name: &str) -> Option<AttributeValue> {
    native
        .with(|g| g.get(obj, name).map(AttributeValue::from_engine))
        .flatten()
}

// ─── Node / Edge ─────────────────────────────────────────────────────────────

/// A node of an open graph. Dropping it releases nothing.
#[derive(Clone)]
pub struct Node {
    graph: Native<engine::Graph>,
    id: NodeId,
}

impl Node {
    pub(crate) fn new(graph: Native<engine::Graph>, id: NodeId) -> Self {
        Node { graph, id }
    }

    pub(crate) fn native(&self) -> &Native<engine::Graph> {
        &self.graph
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> Option<String> {
        self.graph
            .with(|g| g.node_name(self.id).map(str::to_string))
            .flatten()
    }

    pub fn attribute(&self, name: &str) -> Option<AttributeValue> {
        attribute(&self.graph, ObjRef::Node(self.id), name)
    }

    /// Whether both handles refer to the same engine node.
    pub fn same_as(&self, other: &Node) -> bool {
        self.graph.same(&other.graph) && self.id == other.id
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node").field("name", &self.name()).finish()
    }
}

/// An edge of an open graph. Dropping it releases nothing.
#[derive(Clone)]
pub struct Edge {
    graph: Native<engine::Graph>,
    id: EdgeId,
}

impl Edge {
    pub(crate) fn new(graph: Native<engine::Graph>, id: EdgeId) -> Self {
        Edge { graph, id }
    }

    pub(crate) fn native(&self) -> &Native<engine::Graph> {
        &self.graph
    }

    pub(crate) fn id(&self) -> EdgeId {
        self.id
    }

    pub fn tail(&self) -> Option<Node> {
        let (t, _) = self.graph.with(|g| g.endpoints(self.id)).flatten()?;
        Some(Node::new(self.graph.clone(), t))
    }

    pub fn head(&self) -> Option<Node> {
        let (_, h) = self.graph.with(|g| g.endpoints(self.id)).flatten()?;
        Some(Node::new(self.graph.clone(), h))
    }

    pub fn attribute(&self, name: &str) -> Option<AttributeValue> {
        attribute(&self.graph, ObjRef::Edge(self.id), name)
    }

    pub fn same_as(&self, other: &Edge) -> bool {
        self.graph.same(&other.graph) && self.id == other.id
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |n: Option<Node>| n.and_then(|n| n.name());
        f.debug_struct("Edge")
            .field("tail", &name(self.tail()))
            .field("head", &name(self.head()))
            .finish()
    }
}

// ─── Object ──────────────────────────────────────────────────────────────────

/// Anything `set_attribute` can target.
#[derive(Debug, Clone, Copy)]
pub enum Object<'a> {
    Graph(&'a Graph),
    Node(&'a Node),
    Edge(&'a Edge),
}

impl<'a> Object<'a> {
    /// The owning graph slot and the engine object, if the object is still
    /// part of an open graph.
    pub(crate) fn resolve(&self) -> Option<(&'a Native<engine::Graph>, ObjRef)> {
        let (native, obj) = match *self {
            Object::Graph(g) => (g.native(), ObjRef::Graph(g.sub())),
            Object::Node(n) => (n.native(), ObjRef::Node(n.id())),
            Object::Edge(e) => (e.native(), ObjRef::Edge(e.id())),
        };
        native.with(|_| ())?;
        Some((native, obj))
    }
}

impl<'a> From<&'a Graph> for Object<'a> {
    fn from(g: &'a Graph) -> Self {
        Object::Graph(g)
    }
}

impl<'a> From<&'a Node> for Object<'a> {
    fn from(n: &'a Node) -> Self {
        Object::Node(n)
    }
}

impl<'a> From<&'a Edge> for Object<'a> {
    fn from(e: &'a Edge) -> Self {
        Object::Edge(e)
    }
}

// ─── Context ─────────────────────────────────────────────────────────────────

/// A reusable layout/render context, finalized and freed when dropped.
pub struct Context {
    engine: engine::Context,
}

impl Context {
    pub(crate) fn new(engine: engine::Context) -> Self {
        Context { engine }
    }

    pub(crate) fn engine(&self) -> &engine::Context {
        &self.engine
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.engine.finalize();
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Context").field(&self.engine.id()).finish()
    }
}

#[cfg(test)]
#[path = "../tests/rust/test_resource.rs"]
mod tests;

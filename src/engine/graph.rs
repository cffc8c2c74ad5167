//! Attributed graph store.
//!
//! A root [`Graph`] owns every node, edge and subgraph reachable from it.
//! Topology lives in a petgraph `DiGraph`; undirected graphs use the same
//! storage and simply ignore edge orientation where it matters (strict
//! lookup, rendering).
//!
//! Attributes follow a symbol-table model: each object kind has a dictionary
//! of declared names with a root default, and every object carries one value
//! slot per declared symbol. Declaring a new symbol stamps its default into
//! all existing objects; re-declaring only changes what future objects get.
//! Subgraphs may override defaults locally for objects created through them.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use super::html;
use super::layout::Layout;

pub type NodeId = NodeIndex;
pub type EdgeId = EdgeIndex;

// ─── Identifiers and descriptors ─────────────────────────────────────────────

/// Index of a subgraph inside its root graph. The root itself is `ROOT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubgraphId(usize);

impl SubgraphId {
    pub const ROOT: SubgraphId = SubgraphId(0);

    pub fn is_root(self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjKind {
    Graph,
    Node,
    Edge,
}

impl ObjKind {
    fn slot(self) -> usize {
        match self {
            ObjKind::Graph => 0,
            ObjKind::Node => 1,
            ObjKind::Edge => 2,
        }
    }
}

/// Directedness and strictness, fixed when a graph is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Desc {
    pub directed: bool,
    pub strict: bool,
}

/// Any object that can carry attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjRef {
    Graph(SubgraphId),
    Node(NodeId),
    Edge(EdgeId),
}

impl ObjRef {
    pub fn kind(self) -> ObjKind {
        match self {
            ObjRef::Graph(_) => ObjKind::Graph,
            ObjRef::Node(_) => ObjKind::Node,
            ObjRef::Edge(_) => ObjKind::Edge,
        }
    }
}

/// An attribute value. HTML-like values keep their markup and are validated
/// when the graph is laid out.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Value {
    pub text: String,
    pub html: bool,
}

impl Value {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

// ─── Prototype defaults ──────────────────────────────────────────────────────

static PROTO: RwLock<Vec<(ObjKind, String, Value)>> = RwLock::new(Vec::new());

/// Declare a default applied to every graph opened or parsed from now on.
pub fn set_global_default(kind: ObjKind, name: &str, value: Value) {
    let mut proto = PROTO.write().unwrap_or_else(|e| e.into_inner());
    match proto.iter_mut().find(|(k, n, _)| *k == kind && n == name) {
        Some(entry) => entry.2 = value,
        None => proto.push((kind, name.to_string(), value)),
    }
}

fn proto_defaults() -> Vec<(ObjKind, String, Value)> {
    PROTO.read().unwrap_or_else(|e| e.into_inner()).clone()
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
struct AttrDict {
    names: Vec<String>,
    index: HashMap<String, usize>,
    defaults: Vec<Value>,
}

impl AttrDict {
    fn lookup(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    fn insert(&mut self, name: &str, default: Value) -> usize {
        let sym = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), sym);
        self.defaults.push(default);
        sym
    }
}

#[derive(Debug, Clone)]
struct NodeRec {
    name: String,
    attrs: Vec<Value>,
}

#[derive(Debug, Clone)]
struct EdgeRec {
    key: Option<String>,
    attrs: Vec<Value>,
}

#[derive(Debug)]
struct SubgraphRec {
    name: String,
    parent: Option<SubgraphId>,
    children: Vec<SubgraphId>,
    nodes: Vec<NodeId>,
    node_set: HashSet<NodeId>,
    edges: Vec<EdgeId>,
    edge_set: HashSet<EdgeId>,
    attrs: Vec<Value>,
    local: [HashMap<usize, Value>; 3],
    layout: Option<Layout>,
}

impl SubgraphRec {
    fn new(name: &str, parent: Option<SubgraphId>, attrs: Vec<Value>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            nodes: Vec::new(),
            node_set: HashSet::new(),
            edges: Vec::new(),
            edge_set: HashSet::new(),
            attrs,
            local: Default::default(),
            layout: None,
        }
    }
}

// ─── Graph ───────────────────────────────────────────────────────────────────


/// A root graph and everything it owns.
#[derive(Debug)]
pub struct Graph {
    desc: Desc,
    store: DiGraph<NodeRec, EdgeRec>,
    node_index: HashMap<String, NodeId>,
    dicts: [AttrDict; 3],
    subgraphs: Vec<SubgraphRec>,
    anonymous: usize,
    #[cfg(test)]
    _open: open_count::Token,
}

impl Graph {
    /// Open an empty root graph, seeded with the prototype defaults.
    pub fn open(name: &str, desc: Desc) -> Self {
        let mut g = Self {
            desc,
            store: DiGraph::new(),
            node_index: HashMap::new(),
            dicts: Default::default(),
            subgraphs: vec![SubgraphRec::new(name, None, Vec::new())],
            anonymous: 0,
            #[cfg(test)]
            _open: open_count::Token::acquire(),
        };
        for (kind, attr, value) in proto_defaults() {
            g.declare(SubgraphId::ROOT, kind, &attr, value);
        }
        g
    }

    pub fn name(&self) -> &str {
        &self.subgraphs[0].name
    }

    pub fn desc(&self) -> Desc {
        self.desc
    }

    pub fn is_directed(&self) -> bool {
        self.desc.directed
    }

    pub fn is_strict(&self) -> bool {
        self.desc.strict
    }

    pub fn node_count(&self) -> usize {
        self.store.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.store.edge_count()
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.store.node_indices()
    }

    /// All edges in creation order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.store.edge_indices()
    }

    // ── Subgraphs ────────────────────────────────────────────────────────────

    pub fn has_subgraph(&self, sub: SubgraphId) -> bool {
        sub.0 < self.subgraphs.len()
    }

    /// Look up a subgraph by name under `parent`, creating it if asked.
    pub fn subgraph(&mut self, parent: SubgraphId, name: &str, create: bool) -> Option<SubgraphId> {
        let existing = self
            .subgraphs
            .get(parent.0)?
            .children
            .iter()
            .copied()
            .find(|c| self.subgraphs[c.0].name == name);
        if existing.is_some() || !create {
            return existing;
        }

        let attrs = (0..self.dicts[ObjKind::Graph.slot()].names.len())
            .map(|sym| self.effective_default(parent, ObjKind::Graph, sym))
            .collect();
        let id = SubgraphId(self.subgraphs.len());
        self.subgraphs.push(SubgraphRec::new(name, Some(parent), attrs));
        self.subgraphs[parent.0].children.push(id);
        Some(id)
    }

    /// Create an unnamed subgraph (`{ ... }` in DOT text).
    pub fn anonymous_subgraph(&mut self, parent: SubgraphId) -> Option<SubgraphId> {
        self.anonymous += 1;
        let name = format!("%{}", self.anonymous);
        self.subgraph(parent, &name, true)
    }

    pub fn subgraph_name(&self, sub: SubgraphId) -> Option<&str> {
        self.subgraphs.get(sub.0).map(|s| s.name.as_str())
    }

    pub fn subgraph_children(&self, sub: SubgraphId) -> &[SubgraphId] {
        self.subgraphs
            .get(sub.0)
            .map(|s| s.children.as_slice())
            .unwrap_or(&[])
    }

    /// Nodes that belong to `sub` (and therefore to all of its ancestors).
    pub fn subgraph_nodes(&self, sub: SubgraphId) -> &[NodeId] {
        self.subgraphs
            .get(sub.0)
            .map(|s| s.nodes.as_slice())
            .unwrap_or(&[])
    }

    pub fn subgraph_edges(&self, sub: SubgraphId) -> &[EdgeId] {
        self.subgraphs
            .get(sub.0)
            .map(|s| s.edges.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains_node(&self, sub: SubgraphId, n: NodeId) -> bool {
        self.subgraphs
            .get(sub.0)
            .is_some_and(|s| s.node_set.contains(&n))
    }

    fn enroll_node(&mut self, sub: SubgraphId, n: NodeId) {
        let mut cur = Some(sub);
        while let Some(s) = cur {
            let rec = &mut self.subgraphs[s.0];
            if rec.node_set.insert(n) {
                rec.nodes.push(n);
            }
            cur = rec.parent;
        }
    }

    fn enroll_edge(&mut self, sub: SubgraphId, e: EdgeId) {
        let mut cur = Some(sub);
        while let Some(s) = cur {
            let rec = &mut self.subgraphs[s.0];
            if rec.edge_set.insert(e) {
                rec.edges.push(e);
            }
            cur = rec.parent;
        }
    }

    // ── Nodes ────────────────────────────────────────────────────────────────

    /// Look up a node by name, creating it (or adding it to `sub`) if asked.
    pub fn node(&mut self, sub: SubgraphId, name: &str, create: bool) -> Option<NodeId> {
        if !self.has_subgraph(sub) {
            return None;
        }
        if let Some(&n) = self.node_index.get(name) {
            if !self.contains_node(sub, n) {
                if !create {
                    return None;
                }
                self.enroll_node(sub, n);
            }
            return Some(n);
        }
        if !create {
            return None;
        }

        let attrs = (0..self.dicts[ObjKind::Node.slot()].names.len())
            .map(|sym| self.effective_default(sub, ObjKind::Node, sym))
            .collect();
        let n = self.store.add_node(NodeRec {
            name: name.to_string(),
            attrs,
        });
        self.node_index.insert(name.to_string(), n);
        self.enroll_node(sub, n);
        Some(n)
    }

    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.node_index.get(name).copied()
    }

    pub fn node_name(&self, n: NodeId) -> Option<&str> {
        self.store.node_weight(n).map(|r| r.name.as_str())
    }

    /// Number of edges touching `n`, ignoring orientation.
    pub fn degree(&self, n: NodeId) -> usize {
        self.store
            .edges_directed(n, petgraph::Direction::Outgoing)
            .count()
            + self
                .store
                .edges_directed(n, petgraph::Direction::Incoming)
                .count()
    }

    // ── Edges ────────────────────────────────────────────────────────────────

    /// Look up or create an edge between two existing nodes.
    ///
    /// Strict graphs never hold two edges between the same pair (in either
    /// orientation when undirected). Otherwise an unkeyed request always
    /// creates a new parallel edge; a keyed one reuses the edge with that key.
    pub fn edge(
        &mut self,
        sub: SubgraphId,
        tail: NodeId,
        head: NodeId,
        key: Option<&str>,
        create: bool,
    ) -> Option<EdgeId> {
        if !self.has_subgraph(sub)
            || self.store.node_weight(tail).is_none()
            || self.store.node_weight(head).is_none()
        {
            return None;
        }

        if let Some(e) = self.find_edge(tail, head, key) {
            if create {
                self.enroll_node(sub, tail);
                self.enroll_node(sub, head);
                self.enroll_edge(sub, e);
            }
            return Some(e);
        }
        if !create {
            return None;
        }

        self.enroll_node(sub, tail);
        self.enroll_node(sub, head);
        let attrs = (0..self.dicts[ObjKind::Edge.slot()].names.len())
            .map(|sym| self.effective_default(sub, ObjKind::Edge, sym))
            .collect();
        let e = self.store.add_edge(
            tail,
            head,
            EdgeRec {
                key: key.map(str::to_string),
                attrs,
            },
        );
        self.enroll_edge(sub, e);
        Some(e)
    }

    fn find_edge(&self, tail: NodeId, head: NodeId, key: Option<&str>) -> Option<EdgeId> {
        let mut candidates: Vec<EdgeId> =
            self.store.edges_connecting(tail, head).map(|e| e.id()).collect();
        if !self.desc.directed && tail != head {
            candidates.extend(self.store.edges_connecting(head, tail).map(|e| e.id()));
        }
        if self.desc.strict {
            return candidates.first().copied();
        }
        let key = key?;
        candidates
            .into_iter()
            .find(|&e| self.store[e].key.as_deref() == Some(key))
    }

    pub fn endpoints(&self, e: EdgeId) -> Option<(NodeId, NodeId)> {
        self.store.edge_endpoints(e)
    }

    // ── Attributes ───────────────────────────────────────────────────────────

    fn effective_default(&self, sub: SubgraphId, kind: ObjKind, sym: usize) -> Value {
        let mut cur = Some(sub);
        while let Some(s) = cur {
            let rec = &self.subgraphs[s.0];
            if let Some(v) = rec.local[kind.slot()].get(&sym) {
                return v.clone();
            }
            cur = rec.parent;
        }
        self.dicts[kind.slot()].defaults[sym].clone()
    }

    /// Declare `name` for objects of `kind` with `value` as the default seen
    /// through `sub`. Graph-kind declarations also set `sub`'s own value.
    /// Returns the symbol index.
    pub fn declare(&mut self, sub: SubgraphId, kind: ObjKind, name: &str, value: Value) -> usize {
        let slot = kind.slot();
        let sub = if self.has_subgraph(sub) { sub } else { SubgraphId::ROOT };

        let sym = match self.dicts[slot].lookup(name) {
            Some(sym) => {
                if sub.is_root() {
                    self.dicts[slot].defaults[sym] = value.clone();
                } else {
                    self.subgraphs[sub.0].local[slot].insert(sym, value.clone());
                }
                sym
            }
            None => {
                let default = if sub.is_root() {
                    value.clone()
                } else {
                    Value::default()
                };
                let sym = self.dicts[slot].insert(name, default.clone());
                match kind {
                    ObjKind::Graph => {
                        for rec in &mut self.subgraphs {
                            rec.attrs.push(default.clone());
                        }
                    }
                    ObjKind::Node => {
                        for rec in self.store.node_weights_mut() {
                            rec.attrs.push(default.clone());
                        }
                    }
                    ObjKind::Edge => {
                        for rec in self.store.edge_weights_mut() {
                            rec.attrs.push(default.clone());
                        }
                    }
                }
                if !sub.is_root() {
                    self.subgraphs[sub.0].local[slot].insert(sym, value.clone());
                }
                sym
            }
        };

        if kind == ObjKind::Graph {
            self.subgraphs[sub.0].attrs[sym] = value;
        }
        sym
    }

    /// Set one attribute on one object, declaring the name with an empty
    /// default first if the graph does not know it yet. Returns false if the
    /// object does not belong to this graph.
    pub fn set(&mut self, obj: ObjRef, name: &str, value: Value) -> bool {
        let exists = match obj {
            ObjRef::Graph(s) => self.has_subgraph(s),
            ObjRef::Node(n) => self.store.node_weight(n).is_some(),
            ObjRef::Edge(e) => self.store.edge_weight(e).is_some(),
        };
        if !exists {
            return false;
        }

        let kind = obj.kind();
        let sym = match self.dicts[kind.slot()].lookup(name) {
            Some(sym) => sym,
            None => self.declare(SubgraphId::ROOT, kind, name, Value::default()),
        };
        match obj {
            ObjRef::Graph(s) => self.subgraphs[s.0].attrs[sym] = value,
            ObjRef::Node(n) => self.store[n].attrs[sym] = value,
            ObjRef::Edge(e) => self.store[e].attrs[sym] = value,
        }
        true
    }

    pub fn get(&self, obj: ObjRef, name: &str) -> Option<&Value> {
        let sym = self.dicts[obj.kind().slot()].lookup(name)?;
        let attrs = match obj {
            ObjRef::Graph(s) => &self.subgraphs.get(s.0)?.attrs,
            ObjRef::Node(n) => &self.store.node_weight(n)?.attrs,
            ObjRef::Edge(e) => &self.store.edge_weight(e)?.attrs,
        };
        attrs.get(sym)
    }

    /// Attribute text, treating unset or empty values as absent.
    pub fn get_str(&self, obj: ObjRef, name: &str) -> Option<&str> {
        self.get(obj, name)
            .map(|v| v.text.as_str())
            .filter(|s| !s.is_empty())
    }

    /// The default a new object of `kind` would receive through `sub`.
    pub fn default_value(&self, sub: SubgraphId, kind: ObjKind, name: &str) -> Option<Value> {
        if !self.has_subgraph(sub) {
            return None;
        }
        let sym = self.dicts[kind.slot()].lookup(name)?;
        Some(self.effective_default(sub, kind, sym))
    }

    /// Root-level declarations of `kind` with their defaults.
    pub fn declarations(&self, kind: ObjKind) -> impl Iterator<Item = (&str, &Value)> + '_ {
        let dict = &self.dicts[kind.slot()];
        dict.names
            .iter()
            .map(String::as_str)
            .zip(dict.defaults.iter())
    }

    /// Defaults overridden locally by `sub`, in declaration order.
    pub fn local_declarations(&self, sub: SubgraphId, kind: ObjKind) -> Vec<(&str, &Value)> {
        let Some(rec) = self.subgraphs.get(sub.0) else {
            return Vec::new();
        };
        let dict = &self.dicts[kind.slot()];
        let mut out: Vec<(usize, &Value)> = rec.local[kind.slot()]
            .iter()
            .map(|(&sym, v)| (sym, v))
            .collect();
        out.sort_by_key(|(sym, _)| *sym);
        out.into_iter()
            .map(|(sym, v)| (dict.names[sym].as_str(), v))
            .collect()
    }

    /// Every declared attribute of `obj` with its current value.
    pub fn attributes(&self, obj: ObjRef) -> Vec<(&str, &Value)> {
        let dict = &self.dicts[obj.kind().slot()];
        let attrs = match obj {
            ObjRef::Graph(s) => self.subgraphs.get(s.0).map(|r| &r.attrs),
            ObjRef::Node(n) => self.store.node_weight(n).map(|r| &r.attrs),
            ObjRef::Edge(e) => self.store.edge_weight(e).map(|r| &r.attrs),
        };
        match attrs {
            Some(attrs) => dict.names.iter().map(String::as_str).zip(attrs.iter()).collect(),
            None => Vec::new(),
        }
    }

    // ── Labels ───────────────────────────────────────────────────────────────

    /// Display text of a node label with `\N`, `\G` and line escapes expanded.
    pub fn node_label(&self, n: NodeId) -> String {
        let name = self.node_name(n).unwrap_or_default();
        match self.get(ObjRef::Node(n), "label") {
            Some(v) if v.html => html::strip(&v.text),
            Some(v) if !v.text.is_empty() => self.expand(&v.text, name, "", ""),
            _ => name.to_string(),
        }
    }

    /// Display text of an edge label, empty when unset.
    pub fn edge_label(&self, e: EdgeId) -> String {
        let Some(v) = self.get(ObjRef::Edge(e), "label") else {
            return String::new();
        };
        if v.html {
            return html::strip(&v.text);
        }
        let (tail, head) = match self.endpoints(e) {
            Some((t, h)) => (
                self.node_name(t).unwrap_or_default(),
                self.node_name(h).unwrap_or_default(),
            ),
            None => ("", ""),
        };
        let op = if self.desc.directed { "->" } else { "--" };
        self.expand(&v.text, &format!("{tail}{op}{head}"), tail, head)
    }

    /// Display text of a graph or subgraph label, empty when unset.
    pub fn graph_label(&self, sub: SubgraphId) -> String {
        match self.get(ObjRef::Graph(sub), "label") {
            Some(v) if v.html => html::strip(&v.text),
            Some(v) => {
                let name = self.subgraph_name(sub).unwrap_or_default();
                self.expand(&v.text, name, "", "")
            }
            None => String::new(),
        }
    }

    fn expand(&self, text: &str, object: &str, tail: &str, head: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('N') | Some('E') => out.push_str(object),
                Some('G') => out.push_str(self.name()),
                Some('T') => out.push_str(tail),
                Some('H') => out.push_str(head),
                Some('n') | Some('l') | Some('r') => out.push('\n'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        }
        out
    }

    // ── Layout slot ──────────────────────────────────────────────────────────

    pub fn layout(&self, sub: SubgraphId) -> Option<&Layout> {
        self.subgraphs.get(sub.0)?.layout.as_ref()
    }

    /// Attach a layout to `sub`, returning whatever was attached before.
    pub fn attach_layout(&mut self, sub: SubgraphId, layout: Layout) -> Option<Layout> {
        self.subgraphs.get_mut(sub.0)?.layout.replace(layout)
    }

    pub fn detach_layout(&mut self, sub: SubgraphId) -> Option<Layout> {
        self.subgraphs.get_mut(sub.0)?.layout.take()
    }
}

#[cfg(test)]
#[path = "../../tests/rust/test_engine_graph.rs"]
mod tests;

//! Layout engines.
//!
//! Every engine turns a [`LayoutInput`] (node sizes, edges, graph settings
//! gathered from a graph or subgraph view) into a [`Placement`]. The shared
//! [`finish`] step clips edge routes at node boundaries, places edge labels,
//! measures clusters and normalises everything into a [`Layout`] whose
//! bounding box starts at the origin. Coordinates are points, y up.

pub mod circular;
pub mod force;
pub mod layered;

use std::collections::HashMap;

use super::diag;
use super::graph::{EdgeId, Graph, NodeId, ObjRef, SubgraphId};
use super::html;
use super::plugin::{ApiKind, PluginApi, PluginImpl, PluginLibrary, PluginType};
use crate::config::EngineFlags;

pub const POINTS_PER_INCH: f64 = 72.0;
pub const DEFAULT_FONT_SIZE: f64 = 14.0;
const CLUSTER_MARGIN: f64 = 8.0;

// ─── Geometry ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
    pub ll: Point,
    pub ur: Point,
}

impl BBox {
    pub fn width(&self) -> f64 {
        self.ur.x - self.ll.x
    }

    pub fn height(&self) -> f64 {
        self.ur.y - self.ll.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Ellipse,
    Circle,
    DoubleCircle,
    Box,
    Diamond,
    Plaintext,
    Point,
}

impl Shape {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ellipse" | "oval" => Some(Shape::Ellipse),
            "circle" => Some(Shape::Circle),
            "doublecircle" => Some(Shape::DoubleCircle),
            "box" | "rect" | "rectangle" | "square" => Some(Shape::Box),
            "diamond" => Some(Shape::Diamond),
            "plaintext" | "plain" | "none" => Some(Shape::Plaintext),
            "point" => Some(Shape::Point),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Shape::Ellipse => "ellipse",
            Shape::Circle => "circle",
            Shape::DoubleCircle => "doublecircle",
            Shape::Box => "box",
            Shape::Diamond => "diamond",
            Shape::Plaintext => "plaintext",
            Shape::Point => "point",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankDir {
    #[default]
    TB,
    LR,
    BT,
    RL,
}

impl RankDir {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "TB" => Some(RankDir::TB),
            "LR" => Some(RankDir::LR),
            "BT" => Some(RankDir::BT),
            "RL" => Some(RankDir::RL),
            _ => None,
        }
    }
}

// ─── Layout result ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct NodeGeom {
    pub node: NodeId,
    pub center: Point,
    pub width: f64,
    pub height: f64,
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeGeom {
    pub edge: EdgeId,
    pub points: Vec<Point>,
    pub label_pos: Option<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterGeom {
    pub sub: SubgraphId,
    pub bb: BBox,
}

/// Geometry attached to a graph by a context.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Name of the engine that produced this layout.
    pub engine: String,
    /// Id of the context that produced this layout.
    pub context: u64,
    pub bb: BBox,
    pub nodes: Vec<NodeGeom>,
    pub edges: Vec<EdgeGeom>,
    pub clusters: Vec<ClusterGeom>,
    node_index: HashMap<NodeId, usize>,
}

impl Layout {
    pub fn node(&self, n: NodeId) -> Option<&NodeGeom> {
        self.node_index.get(&n).map(|&i| &self.nodes[i])
    }

    pub fn edge(&self, e: EdgeId) -> Option<&EdgeGeom> {
        self.edges.iter().find(|g| g.edge == e)
    }
}

// ─── Engine input ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct InputNode {
    pub id: NodeId,
    pub width: f64,
    pub height: f64,
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputEdge {
    pub id: EdgeId,
    /// Index into `LayoutInput::nodes`.
    pub tail: usize,
    /// Index into `LayoutInput::nodes`.
    pub head: usize,
    /// Preferred length in points.
    pub len: f64,
    pub has_label: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutInput {
    pub nodes: Vec<InputNode>,
    pub edges: Vec<InputEdge>,
    pub rankdir: RankDir,
    pub nodesep: f64,
    pub ranksep: f64,
    /// Clusters as (subgraph, member node indices).
    pub clusters: Vec<(SubgraphId, Vec<usize>)>,
}

/// What an engine produces: one center per input node and, optionally, a
/// route (tail center … head center) per input edge.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Placement {
    pub centers: Vec<Point>,
    pub routes: Vec<Option<Vec<Point>>>,
}

impl Placement {
    pub fn straight(centers: Vec<Point>) -> Self {
        Self {
            centers,
            routes: Vec::new(),
        }
    }
}

/// A layout algorithm registered under one or more names.
pub trait LayoutEngine: Sync {
    fn place(&self, input: &LayoutInput) -> Placement;

    /// Whether the reduce switch removes isolated nodes for this engine.
    fn drops_isolated(&self) -> bool {
        false
    }
}

/// Run `engine` on the `sub` view of `graph`.
pub fn compute(
    name: &str,
    engine: &dyn LayoutEngine,
    graph: &Graph,
    sub: SubgraphId,
    context: u64,
    flags: &EngineFlags,
) -> Layout {
    let input = prepare(graph, sub, flags.reduce && engine.drops_isolated());
    let placement = engine.place(&input);
    finish(&input, placement, name, context)
}

// ─── Preparation ─────────────────────────────────────────────────────────────

/// Gather sizes, edges and settings for the `sub` view of `graph`.
pub fn prepare(graph: &Graph, sub: SubgraphId, drop_isolated: bool) -> LayoutInput {
    let edge_ids = graph.subgraph_edges(sub);
    let mut degree: HashMap<NodeId, usize> = HashMap::new();
    for &e in edge_ids {
        if let Some((t, h)) = graph.endpoints(e) {
            *degree.entry(t).or_insert(0) += 1;
            *degree.entry(h).or_insert(0) += 1;
        }
    }

    let mut index: HashMap<NodeId, usize> = HashMap::new();
    let mut nodes = Vec::new();
    for &n in graph.subgraph_nodes(sub) {
        if drop_isolated && !degree.contains_key(&n) {
            continue;
        }
        let name = graph.node_name(n).unwrap_or_default();
        check_html_label(graph, ObjRef::Node(n), &format!("node {name}"));
        let shape = node_shape(graph, n);
        let (width, height) = node_size(graph, n, shape);
        index.insert(n, nodes.len());
        nodes.push(InputNode {
            id: n,
            width,
            height,
            shape,
        });
    }

    let op = if graph.is_directed() { "->" } else { "--" };
    let mut edges = Vec::new();
    for &e in edge_ids {
        let Some((t, h)) = graph.endpoints(e) else {
            continue;
        };
        let (Some(&tail), Some(&head)) = (index.get(&t), index.get(&h)) else {
            continue;
        };
        let what = format!(
            "edge {}{op}{}",
            graph.node_name(t).unwrap_or_default(),
            graph.node_name(h).unwrap_or_default()
        );
        check_html_label(graph, ObjRef::Edge(e), &what);
        edges.push(InputEdge {
            id: e,
            tail,
            head,
            len: inches(graph, ObjRef::Edge(e), "len", 1.0),
            has_label: graph.get_str(ObjRef::Edge(e), "label").is_some(),
        });
    }

    let gobj = ObjRef::Graph(sub);
    check_html_label(graph, gobj, &format!("graph {}", graph.name()));

    LayoutInput {
        nodes,
        edges,
        rankdir: graph
            .get_str(gobj, "rankdir")
            .and_then(RankDir::from_name)
            .unwrap_or_default(),
        nodesep: inches(graph, gobj, "nodesep", 0.25).max(1.5),
        ranksep: inches(graph, gobj, "ranksep", 0.5).max(1.5),
        clusters: clusters(graph, sub, &index),
    }
}

fn clusters(
    graph: &Graph,
    sub: SubgraphId,
    index: &HashMap<NodeId, usize>,
) -> Vec<(SubgraphId, Vec<usize>)> {
    let mut out = Vec::new();
    let mut stack: Vec<SubgraphId> = graph.subgraph_children(sub).iter().rev().copied().collect();
    while let Some(s) = stack.pop() {
        let is_cluster = graph
            .subgraph_name(s)
            .is_some_and(|name| name.starts_with("cluster"));
        if is_cluster {
            let members: Vec<usize> = graph
                .subgraph_nodes(s)
                .iter()
                .filter_map(|n| index.get(n).copied())
                .collect();
            if !members.is_empty() {
                out.push((s, members));
            }
        }
        stack.extend(graph.subgraph_children(s).iter().rev().copied());
    }
    out
}

fn check_html_label(graph: &Graph, obj: ObjRef, what: &str) {
    let Some(value) = graph.get(obj, "label") else {
        return;
    };
    if !value.html {
        return;
    }
    if let Err(reason) = html::validate(&value.text) {
        diag::error(format!("syntax error in line 1: {reason} in label of {what}"));
    }
}

/// A positive size attribute in inches, converted to points.
fn inches(graph: &Graph, obj: ObjRef, name: &str, default: f64) -> f64 {
    graph
        .get_str(obj, name)
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(default)
        * POINTS_PER_INCH
}

fn node_shape(graph: &Graph, n: NodeId) -> Shape {
    let Some(name) = graph.get_str(ObjRef::Node(n), "shape") else {
        return Shape::Ellipse;
    };
    Shape::from_name(name).unwrap_or_else(|| {
        diag::warn(format!(
            "node {}, unknown shape {}, using box",
            graph.node_name(n).unwrap_or_default(),
            name
        ));
        Shape::Box
    })
}

/// Width and height of a block of text in points.
pub fn text_size(text: &str, font_size: f64) -> (f64, f64) {
    if text.is_empty() {
        return (0.0, 0.0);
    }
    let lines: Vec<&str> = text.split('\n').collect();
    let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    (
        widest as f64 * font_size * 0.6,
        lines.len() as f64 * font_size * 1.2,
    )
}

pub fn font_size(graph: &Graph, obj: ObjRef) -> f64 {
    graph
        .get_str(obj, "fontsize")
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 1.0)
        .unwrap_or(DEFAULT_FONT_SIZE)
}

fn node_size(graph: &Graph, n: NodeId, shape: Shape) -> (f64, f64) {
    let obj = ObjRef::Node(n);
    let min_w = inches(graph, obj, "width", 0.75);
    let min_h = inches(graph, obj, "height", 0.5);
    let (tw, th) = text_size(&graph.node_label(n), font_size(graph, obj));

    match shape {
        Shape::Point => {
            let d = inches(graph, obj, "width", 0.05);
            (d, d)
        }
        Shape::Box | Shape::Plaintext => ((tw + 16.0).max(min_w), (th + 8.0).max(min_h)),
        Shape::Ellipse => (
            (tw * std::f64::consts::SQRT_2 + 8.0).max(min_w),
            (th * std::f64::consts::SQRT_2).max(min_h),
        ),
        Shape::Diamond => ((tw * 2.0 + 8.0).max(min_w), (th * 2.0).max(min_h)),
        Shape::Circle | Shape::DoubleCircle => {
            let ring = if shape == Shape::DoubleCircle { 8.0 } else { 0.0 };
            let d = (tw.max(th) * 1.1 + 16.0).max(min_h) + ring;
            (d, d)
        }
    }
}

// ─── Finishing ───────────────────────────────────────────────────────────────

/// Clip routes, place labels, measure clusters and move the drawing so its
/// bounding box starts at the origin.
pub fn finish(input: &LayoutInput, placement: Placement, engine: &str, context: u64) -> Layout {
    let mut nodes: Vec<NodeGeom> = input
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| NodeGeom {
            node: n.id,
            center: placement.centers.get(i).copied().unwrap_or_default(),
            width: n.width,
            height: n.height,
            shape: n.shape,
        })
        .collect();

    let mut edges: Vec<EdgeGeom> = Vec::with_capacity(input.edges.len());
    for (i, e) in input.edges.iter().enumerate() {
        let points = if e.tail == e.head {
            self_loop(&nodes[e.tail])
        } else {
            let mut pts = match placement.routes.get(i).cloned().flatten() {
                Some(route) if route.len() >= 2 => route,
                _ => vec![nodes[e.tail].center, nodes[e.head].center],
            };
            let last = pts.len() - 1;
            pts[0] = clip(&nodes[e.tail], pts[1]);
            pts[last] = clip(&nodes[e.head], pts[last - 1]);
            pts
        };
        let label_pos = e.has_label.then(|| midpoint(&points));
        edges.push(EdgeGeom {
            edge: e.id,
            points,
            label_pos,
        });
    }

    let mut clusters: Vec<ClusterGeom> = input
        .clusters
        .iter()
        .map(|(sub, members)| {
            let mut bb = node_bounds(members.iter().map(|&i| &nodes[i]));
            bb.ll.x -= CLUSTER_MARGIN;
            bb.ll.y -= CLUSTER_MARGIN;
            bb.ur.x += CLUSTER_MARGIN;
            bb.ur.y += CLUSTER_MARGIN;
            ClusterGeom { sub: *sub, bb }
        })
        .collect();

    // Overall extent.
    let mut bb = node_bounds(nodes.iter());
    let mut grow = |p: Point| {
        bb.ll.x = bb.ll.x.min(p.x);
        bb.ll.y = bb.ll.y.min(p.y);
        bb.ur.x = bb.ur.x.max(p.x);
        bb.ur.y = bb.ur.y.max(p.y);
    };
    for e in &edges {
        e.points.iter().copied().for_each(&mut grow);
        e.label_pos.into_iter().for_each(&mut grow);
    }
    for c in &clusters {
        grow(c.bb.ll);
        grow(c.bb.ur);
    }
    if nodes.is_empty() {
        bb = BBox::default();
    }

    let (dx, dy) = (-bb.ll.x, -bb.ll.y);
    let shift = |p: &mut Point| {
        p.x += dx;
        p.y += dy;
    };
    nodes.iter_mut().for_each(|n| shift(&mut n.center));
    for e in &mut edges {
        e.points.iter_mut().for_each(shift);
        e.label_pos.iter_mut().for_each(shift);
    }
    for c in &mut clusters {
        shift(&mut c.bb.ll);
        shift(&mut c.bb.ur);
    }

    let node_index = nodes.iter().enumerate().map(|(i, n)| (n.node, i)).collect();
    Layout {
        engine: engine.to_string(),
        context,
        bb: BBox {
            ll: Point::default(),
            ur: Point::new(bb.width(), bb.height()),
        },
        nodes,
        edges,
        clusters,
        node_index,
    }
}

fn node_bounds<'a>(nodes: impl Iterator<Item = &'a NodeGeom>) -> BBox {
    let mut bb = BBox {
        ll: Point::new(f64::INFINITY, f64::INFINITY),
        ur: Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
    };
    let mut any = false;
    for n in nodes {
        any = true;
        bb.ll.x = bb.ll.x.min(n.center.x - n.width / 2.0);
        bb.ll.y = bb.ll.y.min(n.center.y - n.height / 2.0);
        bb.ur.x = bb.ur.x.max(n.center.x + n.width / 2.0);
        bb.ur.y = bb.ur.y.max(n.center.y + n.height / 2.0);
    }
    if any { bb } else { BBox::default() }
}

/// Where the segment from the node center toward `toward` leaves the node.
pub fn clip(node: &NodeGeom, toward: Point) -> Point {
    let c = node.center;
    let (dx, dy) = (toward.x - c.x, toward.y - c.y);
    let (rx, ry) = (node.width / 2.0, node.height / 2.0);
    if (dx.abs() < 1e-9 && dy.abs() < 1e-9) || rx <= 0.0 || ry <= 0.0 {
        return c;
    }

    let t = match node.shape {
        Shape::Box | Shape::Plaintext => {
            let tx = if dx.abs() > 1e-9 { rx / dx.abs() } else { f64::INFINITY };
            let ty = if dy.abs() > 1e-9 { ry / dy.abs() } else { f64::INFINITY };
            tx.min(ty)
        }
        Shape::Diamond => 1.0 / (dx.abs() / rx + dy.abs() / ry),
        Shape::Ellipse | Shape::Circle | Shape::DoubleCircle | Shape::Point => {
            1.0 / ((dx / rx).powi(2) + (dy / ry).powi(2)).sqrt()
        }
    };
    if t >= 1.0 {
        return c;
    }
    Point::new(c.x + t * dx, c.y + t * dy)
}

fn self_loop(node: &NodeGeom) -> Vec<Point> {
    let Point { x, y } = node.center;
    let rx = node.width / 2.0;
    let q = node.height / 4.0;
    vec![
        Point::new(x + rx * 0.8, y + q),
        Point::new(x + rx + 18.0, y + q * 1.5),
        Point::new(x + rx + 18.0, y - q * 1.5),
        Point::new(x + rx * 0.8, y - q),
    ]
}

/// The point halfway along a polyline.
pub fn midpoint(points: &[Point]) -> Point {
    let total: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    let mut remaining = total / 2.0;
    for w in points.windows(2) {
        let seg = w[0].distance(w[1]);
        if seg >= remaining && seg > 0.0 {
            let t = remaining / seg;
            return Point::new(
                w[0].x + t * (w[1].x - w[0].x),
                w[0].y + t * (w[1].y - w[0].y),
            );
        }
        remaining -= seg;
    }
    points.first().copied().unwrap_or_default()
}

// ─── Plugin libraries ────────────────────────────────────────────────────────

pub static DOT_LAYOUT_LIBRARY: PluginLibrary = PluginLibrary {
    name: "dot_layout",
    apis: &[PluginApi {
        kind: ApiKind::Layout,
        types: &[PluginType {
            name: "dot",
            quality: 0,
            imp: PluginImpl::Layout(&layered::DotLayout),
        }],
    }],
};

pub static NEATO_LAYOUT_LIBRARY: PluginLibrary = PluginLibrary {
    name: "neato_layout",
    apis: &[PluginApi {
        kind: ApiKind::Layout,
        types: &[
            PluginType {
                name: "neato",
                quality: 0,
                imp: PluginImpl::Layout(&force::NeatoLayout),
            },
            PluginType {
                name: "fdp",
                quality: 0,
                imp: PluginImpl::Layout(&force::FdpLayout),
            },
            PluginType {
                name: "circo",
                quality: 0,
                imp: PluginImpl::Layout(&circular::CircoLayout),
            },
        ],
    }],
};

#[cfg(test)]
#[path = "../../../tests/rust/test_engine_layout.rs"]
mod tests;

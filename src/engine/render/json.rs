//! JSON output.
//!
//! Clusters come first in `objects`, followed by the laid-out nodes; every
//! object and edge carries a `_gvid` and edges refer to nodes by it.

use std::collections::HashMap;

use serde_json::{Map, Value as Json, json};

use super::{Renderer, YAxis, bezier, inches, num, view_name};
use crate::config::EngineFlags;
use crate::engine::graph::{Graph, NodeId, ObjRef, SubgraphId};
use crate::engine::layout::{BBox, Layout};

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, graph: &Graph, sub: SubgraphId, layout: &Layout, flags: &EngineFlags) -> Vec<u8> {
        let doc = document(graph, sub, layout, flags);
        let mut bytes = serde_json::to_vec_pretty(&doc).unwrap_or_default();
        bytes.push(b'\n');
        bytes
    }
}

fn attrs_into(map: &mut Map<String, Json>, graph: &Graph, obj: ObjRef) {
    for (name, value) in graph.attributes(obj) {
        if !value.is_empty() {
            map.insert(name.to_string(), Json::String(value.text.clone()));
        }
    }
}

fn bb_text(bb: BBox, axis: YAxis) -> String {
    let (y0, y1) = (axis.y(bb.ll.y), axis.y(bb.ur.y));
    format!("{},{},{},{}", num(bb.ll.x), num(y0.min(y1)), num(bb.ur.x), num(y0.max(y1)))
}

pub fn document(graph: &Graph, sub: SubgraphId, layout: &Layout, flags: &EngineFlags) -> Json {
    let axis = YAxis::new(layout, flags);

    let mut root = Map::new();
    root.insert("name".into(), json!(view_name(graph, sub)));
    root.insert("directed".into(), json!(graph.is_directed()));
    root.insert("strict".into(), json!(graph.is_strict()));
    attrs_into(&mut root, graph, ObjRef::Graph(sub));
    root.insert("bb".into(), json!(bb_text(layout.bb, axis)));
    root.insert("_subgraph_cnt".into(), json!(layout.clusters.len()));

    let cluster_count = layout.clusters.len();
    let gvid: HashMap<NodeId, usize> = layout
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.node, cluster_count + i))
        .collect();

    let mut objects = Vec::new();
    for (i, cluster) in layout.clusters.iter().enumerate() {
        let mut obj = Map::new();
        obj.insert("_gvid".into(), json!(i));
        obj.insert(
            "name".into(),
            json!(graph.subgraph_name(cluster.sub).unwrap_or_default()),
        );
        attrs_into(&mut obj, graph, ObjRef::Graph(cluster.sub));
        obj.insert("bb".into(), json!(bb_text(cluster.bb, axis)));
        let nodes: Vec<usize> = graph
            .subgraph_nodes(cluster.sub)
            .iter()
            .filter_map(|n| gvid.get(n).copied())
            .collect();
        obj.insert("nodes".into(), json!(nodes));
        objects.push(Json::Object(obj));
    }
    for geom in &layout.nodes {
        let mut obj = Map::new();
        obj.insert("_gvid".into(), json!(gvid.get(&geom.node)));
        obj.insert(
            "name".into(),
            json!(graph.node_name(geom.node).unwrap_or_default()),
        );
        attrs_into(&mut obj, graph, ObjRef::Node(geom.node));
        obj.insert("label".into(), json!(graph.node_label(geom.node)));
        obj.insert("pos".into(), json!(axis.point(geom.center)));
        obj.insert("width".into(), json!(inches(geom.width)));
        obj.insert("height".into(), json!(inches(geom.height)));
        obj.insert("shape".into(), json!(geom.shape.name()));
        objects.push(Json::Object(obj));
    }
    if !objects.is_empty() {
        root.insert("objects".into(), Json::Array(objects));
    }

    let mut edges = Vec::new();
    for (i, geom) in layout.edges.iter().enumerate() {
        let Some((t, h)) = graph.endpoints(geom.edge) else {
            continue;
        };
        let mut obj = Map::new();
        obj.insert("_gvid".into(), json!(i));
        obj.insert("tail".into(), json!(gvid.get(&t)));
        obj.insert("head".into(), json!(gvid.get(&h)));
        attrs_into(&mut obj, graph, ObjRef::Edge(geom.edge));
        let pts: Vec<String> = bezier(&geom.points).into_iter().map(|p| axis.point(p)).collect();
        obj.insert("pos".into(), json!(pts.join(" ")));
        if let Some(lp) = geom.label_pos {
            obj.insert("label".into(), json!(graph.edge_label(geom.edge)));
            obj.insert("lp".into(), json!(axis.point(lp)));
        }
        edges.push(Json::Object(obj));
    }
    if !edges.is_empty() {
        root.insert("edges".into(), Json::Array(edges));
    }

    Json::Object(root)
}

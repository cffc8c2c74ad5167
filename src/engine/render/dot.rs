//! DOT writers: `dot`/`gv` (with layout attributes) and `canon` (without).

use std::collections::HashSet;
use std::fmt::Write as _;

use super::{Renderer, YAxis, bezier, inches, num, quote_id, view_name};
use crate::config::EngineFlags;
use crate::engine::graph::{Graph, NodeId, ObjKind, ObjRef, SubgraphId, Value};
use crate::engine::layout::Layout;

pub struct DotRenderer {
    pub layout_attrs: bool,
}

impl Renderer for DotRenderer {
    fn render(&self, graph: &Graph, sub: SubgraphId, layout: &Layout, flags: &EngineFlags) -> Vec<u8> {
        let writer = DotWriter {
            graph,
            layout: self.layout_attrs.then_some(layout),
            y: YAxis::new(layout, flags),
            members: layout.nodes.iter().map(|n| n.node).collect(),
        };
        writer.write(sub).into_bytes()
    }
}

fn value_text(value: &Value) -> String {
    if value.html {
        format!("<{}>", value.text)
    } else {
        quote_id(&value.text)
    }
}

fn attr_list(attrs: &[(String, String)]) -> String {
    let parts: Vec<String> = attrs.iter().map(|(k, v)| format!("{}={v}", quote_id(k))).collect();
    parts.join(",\n\t\t")
}

struct DotWriter<'a> {
    graph: &'a Graph,
    layout: Option<&'a Layout>,
    y: YAxis,
    /// Nodes present in the laid-out view.
    members: HashSet<NodeId>,
}

impl DotWriter<'_> {
    fn write(&self, sub: SubgraphId) -> String {
        let g = self.graph;
        let mut out = String::new();
        let strict = if g.is_strict() { "strict " } else { "" };
        let kind = if g.is_directed() { "digraph" } else { "graph" };
        let _ = writeln!(out, "{strict}{kind} {} {{", quote_id(view_name(g, sub)));

        self.write_defaults(&mut out, sub, 1, true);
        for &child in g.subgraph_children(sub) {
            self.write_subgraph(&mut out, child, 1);
        }
        for n in self.nodes(sub) {
            self.write_node(&mut out, n, 1);
        }
        self.write_edges(&mut out, sub, 1);
        out.push_str("}\n");
        out
    }

    fn nodes(&self, sub: SubgraphId) -> Vec<NodeId> {
        self.graph
            .subgraph_nodes(sub)
            .iter()
            .copied()
            .filter(|n| self.members.contains(n))
            .collect()
    }

    fn write_defaults(&self, out: &mut String, sub: SubgraphId, depth: usize, root: bool) {
        let g = self.graph;
        let tabs = "\t".repeat(depth);

        let mut graph_attrs: Vec<(String, String)> = g
            .attributes(ObjRef::Graph(sub))
            .into_iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.to_string(), value_text(v)))
            .collect();
        if let Some(layout) = self.layout {
            let bb = if root {
                Some(layout.bb)
            } else {
                layout.clusters.iter().find(|c| c.sub == sub).map(|c| c.bb)
            };
            if let Some(bb) = bb {
                let (y0, y1) = (self.y.y(bb.ll.y), self.y.y(bb.ur.y));
                let text = format!(
                    "{},{},{},{}",
                    num(bb.ll.x),
                    num(y0.min(y1)),
                    num(bb.ur.x),
                    num(y0.max(y1))
                );
                graph_attrs.retain(|(k, _)| k != "bb");
                graph_attrs.push(("bb".to_string(), quote_id(&text)));
            }
        }
        if !graph_attrs.is_empty() {
            let _ = writeln!(out, "{tabs}graph [{}];", attr_list(&graph_attrs));
        }

        for (kind, keyword) in [(ObjKind::Node, "node"), (ObjKind::Edge, "edge")] {
            let defaults: Vec<(String, String)> = if root && sub.is_root() {
                g.declarations(kind)
                    .filter(|(_, v)| !v.is_empty())
                    .map(|(k, v)| (k.to_string(), value_text(v)))
                    .collect()
            } else {
                g.local_declarations(sub, kind)
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), value_text(v)))
                    .collect()
            };
            if !defaults.is_empty() {
                let _ = writeln!(out, "{tabs}{keyword} [{}];", attr_list(&defaults));
            }
        }
    }

    fn write_subgraph(&self, out: &mut String, sub: SubgraphId, depth: usize) {
        let g = self.graph;
        let tabs = "\t".repeat(depth);
        let name = g.subgraph_name(sub).unwrap_or_default();
        if name.starts_with('%') {
            let _ = writeln!(out, "{tabs}{{");
        } else {
            let _ = writeln!(out, "{tabs}subgraph {} {{", quote_id(name));
        }
        self.write_defaults(out, sub, depth + 1, false);
        for &child in g.subgraph_children(sub) {
            self.write_subgraph(out, child, depth + 1);
        }
        for n in self.nodes(sub) {
            let _ = writeln!(out, "{tabs}\t{};", quote_id(g.node_name(n).unwrap_or_default()));
        }
        let _ = writeln!(out, "{tabs}}}");
    }

    /// Attributes of `obj` that differ from the default it would get at the root.
    fn explicit_attrs(&self, obj: ObjRef) -> Vec<(String, String)> {
        let g = self.graph;
        g.attributes(obj)
            .into_iter()
            .filter(|(k, v)| {
                let default = g.default_value(SubgraphId::ROOT, obj.kind(), k);
                !v.is_empty() && default.as_ref() != Some(*v)
            })
            .map(|(k, v)| (k.to_string(), value_text(v)))
            .collect()
    }

    fn write_node(&self, out: &mut String, n: NodeId, depth: usize) {
        let g = self.graph;
        let tabs = "\t".repeat(depth);
        let mut attrs = self.explicit_attrs(ObjRef::Node(n));
        if let Some(geom) = self.layout.and_then(|l| l.node(n)) {
            attrs.retain(|(k, _)| !matches!(k.as_str(), "pos" | "width" | "height"));
            attrs.push(("height".into(), inches(geom.height)));
            attrs.push(("pos".into(), quote_id(&self.y.point(geom.center))));
            attrs.push(("width".into(), inches(geom.width)));
            attrs.sort();
        }
        let name = quote_id(g.node_name(n).unwrap_or_default());
        if attrs.is_empty() {
            let _ = writeln!(out, "{tabs}{name};");
        } else {
            let _ = writeln!(out, "{tabs}{name}\t[{}];", attr_list(&attrs));
        }
    }

    fn write_edges(&self, out: &mut String, sub: SubgraphId, depth: usize) {
        let g = self.graph;
        let tabs = "\t".repeat(depth);
        let op = if g.is_directed() { "->" } else { "--" };
        for &e in g.subgraph_edges(sub) {
            let Some((t, h)) = g.endpoints(e) else { continue };
            if !self.members.contains(&t) || !self.members.contains(&h) {
                continue;
            }
            let mut attrs = self.explicit_attrs(ObjRef::Edge(e));
            if let Some(geom) = self.layout.and_then(|l| l.edge(e)) {
                attrs.retain(|(k, _)| !matches!(k.as_str(), "pos" | "lp"));
                let pts: Vec<String> = bezier(&geom.points).into_iter().map(|p| self.y.point(p)).collect();
                attrs.push(("pos".into(), quote_id(&pts.join(" "))));
                if let Some(lp) = geom.label_pos {
                    attrs.push(("lp".into(), quote_id(&self.y.point(lp))));
                }
                attrs.sort();
            }
            let (tn, hn) = (
                quote_id(g.node_name(t).unwrap_or_default()),
                quote_id(g.node_name(h).unwrap_or_default()),
            );
            if attrs.is_empty() {
                let _ = writeln!(out, "{tabs}{tn} {op} {hn};");
            } else {
                let _ = writeln!(out, "{tabs}{tn} {op} {hn}\t[{}];", attr_list(&attrs));
            }
        }
    }
}

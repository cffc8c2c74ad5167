//! Plain text output: one line per graph, node and edge, sizes in inches.

use std::fmt::Write as _;

use super::{Renderer, YAxis, bezier, inches, quote_id};
use crate::config::EngineFlags;
use crate::engine::graph::{Graph, ObjRef, SubgraphId};
use crate::engine::layout::{Layout, Point};

pub struct PlainRenderer;

impl Renderer for PlainRenderer {
    fn render(&self, graph: &Graph, _sub: SubgraphId, layout: &Layout, flags: &EngineFlags) -> Vec<u8> {
        render(graph, layout, flags).into_bytes()
    }
}

fn style(graph: &Graph, obj: ObjRef) -> String {
    quote_id(graph.get_str(obj, "style").unwrap_or("solid"))
}

fn color(graph: &Graph, obj: ObjRef, name: &str, default: &str) -> String {
    quote_id(graph.get_str(obj, name).unwrap_or(default))
}

pub fn render(graph: &Graph, layout: &Layout, flags: &EngineFlags) -> String {
    let axis = YAxis::new(layout, flags);
    let at = |p: Point| format!("{} {}", inches(p.x), inches(axis.y(p.y)));

    let mut out = String::new();
    let _ = writeln!(
        out,
        "graph 1 {} {}",
        inches(layout.bb.width()),
        inches(layout.bb.height())
    );

    for geom in &layout.nodes {
        let obj = ObjRef::Node(geom.node);
        let _ = writeln!(
            out,
            "node {} {} {} {} {} {} {} {} {}",
            quote_id(graph.node_name(geom.node).unwrap_or_default()),
            at(geom.center),
            inches(geom.width),
            inches(geom.height),
            quote_id(&graph.node_label(geom.node)),
            style(graph, obj),
            geom.shape.name(),
            color(graph, obj, "color", "black"),
            color(graph, obj, "fillcolor", "lightgrey"),
        );
    }

    for geom in &layout.edges {
        let Some((t, h)) = graph.endpoints(geom.edge) else {
            continue;
        };
        let obj = ObjRef::Edge(geom.edge);
        let ctrl = bezier(&geom.points);
        let mut line = format!(
            "edge {} {} {}",
            quote_id(graph.node_name(t).unwrap_or_default()),
            quote_id(graph.node_name(h).unwrap_or_default()),
            ctrl.len()
        );
        for p in ctrl {
            line.push(' ');
            line.push_str(&at(p));
        }
        if let Some(lp) = geom.label_pos {
            let _ = write!(line, " {} {}", quote_id(&graph.edge_label(geom.edge)), at(lp));
        }
        let _ = writeln!(
            out,
            "{line} {} {}",
            style(graph, obj),
            color(graph, obj, "color", "black")
        );
    }

    out.push_str("stop\n");
    out
}

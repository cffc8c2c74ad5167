//! SVG renderer.
//!
//! Points map one to one onto SVG user units. The drawing sits in a
//! `<g class="graph">` translated by the page margin, with y negated so the
//! layout's y-up coordinates come out the right way round.

use std::fmt::Write as _;

use super::{Renderer, bezier, num, view_name};
use crate::config::EngineFlags;
use crate::engine::graph::{EdgeId, Graph, ObjRef, SubgraphId};
use crate::engine::layout::{self, EdgeGeom, Layout, NodeGeom, Point, Shape};

// ── Constants ────────────────────────────────────────────────────────────────

const MARGIN: f64 = 4.0;
const FONT_FAMILY: &str = "Times,serif";
const ARROW_LEN: f64 = 10.0;
const ARROW_HALF_WIDTH: f64 = 3.5;

pub struct SvgRenderer;

impl Renderer for SvgRenderer {
    fn render(&self, graph: &Graph, sub: SubgraphId, layout: &Layout, _flags: &EngineFlags) -> Vec<u8> {
        render(graph, sub, layout).into_bytes()
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn pt(p: Point) -> String {
    format!("{},{}", num(p.x), num(-p.y))
}

fn attr_or<'a>(graph: &'a Graph, obj: ObjRef, name: &str, default: &'a str) -> &'a str {
    graph.get_str(obj, name).unwrap_or(default)
}

fn is_filled(graph: &Graph, obj: ObjRef) -> bool {
    graph
        .get_str(obj, "style")
        .is_some_and(|s| s.split(',').any(|part| part.trim() == "filled"))
}

/// One `<text>` per label line, centred on `center`.
fn text_block(out: &mut String, label: &str, center: Point, font_size: f64, color: &str) {
    if label.is_empty() {
        return;
    }
    let lines: Vec<&str> = label.split('\n').collect();
    let line_h = font_size * 1.2;
    let top = center.y + line_h * (lines.len() as f64 - 1.0) / 2.0;
    for (i, line) in lines.iter().enumerate() {
        let y = top - line_h * i as f64 - font_size * 0.3;
        let _ = writeln!(
            out,
            r#"<text text-anchor="middle" x="{}" y="{}" font-family="{FONT_FAMILY}" font-size="{:.2}" fill="{}">{}</text>"#,
            num(center.x),
            num(-y),
            font_size,
            escape(color),
            escape(line)
        );
    }
}

// ── Nodes ────────────────────────────────────────────────────────────────────

fn render_node(out: &mut String, graph: &Graph, geom: &NodeGeom, index: usize) {
    let obj = ObjRef::Node(geom.node);
    let name = graph.node_name(geom.node).unwrap_or_default();
    let stroke = attr_or(graph, obj, "color", "black");
    let fill = if is_filled(graph, obj) || geom.shape == Shape::Point {
        graph
            .get_str(obj, "fillcolor")
            .or_else(|| graph.get_str(obj, "color"))
            .unwrap_or(if geom.shape == Shape::Point { "black" } else { "lightgrey" })
    } else {
        "none"
    };
    let paint = format!(r#"fill="{}" stroke="{}""#, escape(fill), escape(stroke));

    let _ = writeln!(out, r#"<g id="node{index}" class="node">"#);
    let _ = writeln!(out, "<title>{}</title>", escape(name));

    let c = geom.center;
    let (rx, ry) = (geom.width / 2.0, geom.height / 2.0);
    let ellipse = |out: &mut String, rx: f64, ry: f64| {
        let _ = writeln!(
            out,
            r#"<ellipse {paint} cx="{}" cy="{}" rx="{}" ry="{}"/>"#,
            num(c.x),
            num(-c.y),
            num(rx),
            num(ry)
        );
    };
    match geom.shape {
        Shape::Ellipse | Shape::Point => ellipse(out, rx, ry),
        Shape::Circle => ellipse(out, rx, rx),
        Shape::DoubleCircle => {
            ellipse(out, rx - 4.0, rx - 4.0);
            ellipse(out, rx, rx);
        }
        Shape::Box => {
            let corners = [
                Point::new(c.x + rx, c.y + ry),
                Point::new(c.x - rx, c.y + ry),
                Point::new(c.x - rx, c.y - ry),
                Point::new(c.x + rx, c.y - ry),
                Point::new(c.x + rx, c.y + ry),
            ];
            polygon(out, &paint, &corners);
        }
        Shape::Diamond => {
            let corners = [
                Point::new(c.x, c.y + ry),
                Point::new(c.x - rx, c.y),
                Point::new(c.x, c.y - ry),
                Point::new(c.x + rx, c.y),
                Point::new(c.x, c.y + ry),
            ];
            polygon(out, &paint, &corners);
        }
        Shape::Plaintext => {}
    }

    if geom.shape != Shape::Point {
        let font_size = layout::font_size(graph, obj);
        let color = attr_or(graph, obj, "fontcolor", "black");
        text_block(out, &graph.node_label(geom.node), c, font_size, color);
    }
    out.push_str("</g>\n");
}

fn polygon(out: &mut String, paint: &str, points: &[Point]) {
    let pts: Vec<String> = points.iter().map(|&p| pt(p)).collect();
    let _ = writeln!(out, r#"<polygon {paint} points="{}"/>"#, pts.join(" "));
}

// ── Edges ────────────────────────────────────────────────────────────────────

fn edge_title(graph: &Graph, e: EdgeId) -> String {
    let op = if graph.is_directed() { "->" } else { "--" };
    match graph.endpoints(e) {
        Some((t, h)) => format!(
            "{}{op}{}",
            graph.node_name(t).unwrap_or_default(),
            graph.node_name(h).unwrap_or_default()
        ),
        None => String::new(),
    }
}

fn render_edge(out: &mut String, graph: &Graph, geom: &EdgeGeom, index: usize) {
    let obj = ObjRef::Edge(geom.edge);
    let color = escape(attr_or(graph, obj, "color", "black"));

    let _ = writeln!(out, r#"<g id="edge{index}" class="edge">"#);
    let _ = writeln!(out, "<title>{}</title>", escape(&edge_title(graph, geom.edge)));

    let ctrl = bezier(&geom.points);
    if let Some((first, rest)) = ctrl.split_first() {
        let mut d = format!("M{}", pt(*first));
        for (i, p) in rest.iter().enumerate() {
            d.push_str(if i % 3 == 0 { "C" } else { " " });
            d.push_str(&pt(*p));
        }
        let dashed = match graph.get_str(obj, "style") {
            Some("dashed") => r#" stroke-dasharray="5,2""#,
            Some("dotted") => r#" stroke-dasharray="1,5""#,
            _ => "",
        };
        let _ = writeln!(out, r#"<path fill="none" stroke="{color}"{dashed} d="{d}"/>"#);
    }

    if graph.is_directed() && geom.points.len() >= 2 {
        let tip = geom.points[geom.points.len() - 1];
        let from = geom.points[geom.points.len() - 2];
        let len = tip.distance(from);
        if len > 0.0 {
            let (ux, uy) = ((tip.x - from.x) / len, (tip.y - from.y) / len);
            let base = Point::new(tip.x - ux * ARROW_LEN, tip.y - uy * ARROW_LEN);
            let head = [
                Point::new(base.x - uy * ARROW_HALF_WIDTH, base.y + ux * ARROW_HALF_WIDTH),
                tip,
                Point::new(base.x + uy * ARROW_HALF_WIDTH, base.y - ux * ARROW_HALF_WIDTH),
                Point::new(base.x - uy * ARROW_HALF_WIDTH, base.y + ux * ARROW_HALF_WIDTH),
            ];
            polygon(out, &format!(r#"fill="{color}" stroke="{color}""#), &head);
        }
    }

    if let Some(pos) = geom.label_pos {
        let font_size = layout::font_size(graph, obj);
        let fontcolor = attr_or(graph, obj, "fontcolor", "black");
        text_block(out, &graph.edge_label(geom.edge), pos, font_size, fontcolor);
    }
    out.push_str("</g>\n");
}

// ── Public API ────────────────────────────────────────────────────────────────

pub fn render(graph: &Graph, sub: SubgraphId, layout: &Layout) -> String {
    let w = layout.bb.width() + 2.0 * MARGIN;
    let h = layout.bb.height() + 2.0 * MARGIN;
    let name = view_name(graph, sub);

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n");
    out.push_str("<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\"\n");
    out.push_str(" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n");
    let _ = writeln!(
        out,
        "<!-- Generated by viz-component version {} -->",
        env!("VIZ_ENGINE_VERSION")
    );
    let _ = writeln!(out, "<!-- Title: {} Pages: 1 -->", escape(name));
    let _ = writeln!(
        out,
        r#"<svg width="{}pt" height="{}pt""#,
        w.round() as i64,
        h.round() as i64
    );
    let _ = writeln!(
        out,
        r#" viewBox="0.00 0.00 {w:.2} {h:.2}" xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">"#
    );
    let _ = writeln!(
        out,
        r#"<g id="graph0" class="graph" transform="translate({} {})">"#,
        num(MARGIN),
        num(h - MARGIN)
    );
    let _ = writeln!(out, "<title>{}</title>", escape(name));
    let background = escape(attr_or(graph, ObjRef::Graph(sub), "bgcolor", "white"));
    let _ = writeln!(
        out,
        r#"<polygon fill="{background}" stroke="none" points="{} {} {} {} {}"/>"#,
        pt(Point::new(-MARGIN, -MARGIN)),
        pt(Point::new(-MARGIN, h - MARGIN)),
        pt(Point::new(w - MARGIN, h - MARGIN)),
        pt(Point::new(w - MARGIN, -MARGIN)),
        pt(Point::new(-MARGIN, -MARGIN)),
    );

    for (i, cluster) in layout.clusters.iter().enumerate() {
        let obj = ObjRef::Graph(cluster.sub);
        let _ = writeln!(out, r#"<g id="clust{}" class="cluster">"#, i + 1);
        let _ = writeln!(
            out,
            "<title>{}</title>",
            escape(graph.subgraph_name(cluster.sub).unwrap_or_default())
        );
        let (ll, ur) = (cluster.bb.ll, cluster.bb.ur);
        let corners = [
            Point::new(ll.x, ll.y),
            Point::new(ll.x, ur.y),
            Point::new(ur.x, ur.y),
            Point::new(ur.x, ll.y),
            Point::new(ll.x, ll.y),
        ];
        let paint = format!(
            r#"fill="none" stroke="{}""#,
            escape(attr_or(graph, obj, "color", "black"))
        );
        polygon(&mut out, &paint, &corners);
        let label = graph.graph_label(cluster.sub);
        let font_size = layout::font_size(graph, obj);
        let anchor = Point::new((ll.x + ur.x) / 2.0, ur.y - font_size * 0.6);
        text_block(&mut out, &label, anchor, font_size, "black");
        out.push_str("</g>\n");
    }

    for (i, geom) in layout.nodes.iter().enumerate() {
        render_node(&mut out, graph, geom, i + 1);
    }
    for (i, geom) in layout.edges.iter().enumerate() {
        render_edge(&mut out, graph, geom, i + 1);
    }

    out.push_str("</g>\n</svg>\n");
    out
}

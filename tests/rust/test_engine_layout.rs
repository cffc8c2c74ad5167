use super::*;

use crate::diagnostics::Session;
use crate::engine::read::read_all;

fn parse(text: &str) -> Graph {
    read_all(text).unwrap().remove(0)
}

fn run(engine: &dyn LayoutEngine, graph: &Graph, flags: EngineFlags) -> Layout {
    compute("test", engine, graph, SubgraphId::ROOT, 1, &flags)
}

fn center(graph: &Graph, layout: &Layout, name: &str) -> Point {
    layout.node(graph.find_node(name).unwrap()).unwrap().center
}

fn geom(shape: Shape) -> NodeGeom {
    NodeGeom {
        node: NodeId::new(0),
        center: Point::new(0.0, 0.0),
        width: 20.0,
        height: 10.0,
        shape,
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

#[test]
fn test_shape_names() {
    assert_eq!(Shape::from_name("rect"), Some(Shape::Box));
    assert_eq!(Shape::from_name("Oval"), Some(Shape::Ellipse));
    assert_eq!(Shape::from_name("hexagonx"), None);
    assert_eq!(Shape::DoubleCircle.name(), "doublecircle");
    assert_eq!(RankDir::from_name("lr"), Some(RankDir::LR));
}

#[test]
fn test_text_size() {
    assert_eq!(text_size("", 14.0), (0.0, 0.0));
    let (w, h) = text_size("ab\ncde", 10.0);
    assert!((w - 18.0).abs() < 1e-9);
    assert!((h - 24.0).abs() < 1e-9);
}

#[test]
fn test_clip_box_and_ellipse() {
    assert_eq!(clip(&geom(Shape::Box), Point::new(100.0, 0.0)), Point::new(10.0, 0.0));
    let p = clip(&geom(Shape::Ellipse), Point::new(0.0, 100.0));
    assert!((p.x).abs() < 1e-9 && (p.y - 5.0).abs() < 1e-9);
    // A target inside the node leaves the center unchanged.
    assert_eq!(clip(&geom(Shape::Box), Point::new(1.0, 1.0)), Point::new(0.0, 0.0));
}

#[test]
fn test_midpoint() {
    let straight = [Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
    assert_eq!(midpoint(&straight), Point::new(5.0, 0.0));
    let bent = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
    assert_eq!(midpoint(&bent), Point::new(10.0, 0.0));
}

#[test]
fn test_finish_moves_to_origin() {
    let mut graph = Graph::open("g", Default::default());
    let a = graph.node(SubgraphId::ROOT, "a", true).unwrap();
    let b = graph.node(SubgraphId::ROOT, "b", true).unwrap();
    let input = LayoutInput {
        nodes: vec![
            InputNode { id: a, width: 10.0, height: 10.0, shape: Shape::Box },
            InputNode { id: b, width: 10.0, height: 10.0, shape: Shape::Box },
        ],
        ..Default::default()
    };
    let placement = Placement::straight(vec![Point::new(-50.0, -50.0), Point::new(50.0, 50.0)]);
    let layout = finish(&input, placement, "test", 7);
    assert_eq!(layout.bb.ll, Point::new(0.0, 0.0));
    assert_eq!(layout.bb.ur, Point::new(110.0, 110.0));
    assert_eq!(layout.node(a).unwrap().center, Point::new(5.0, 5.0));
    assert_eq!(layout.node(b).unwrap().center, Point::new(105.0, 105.0));
    assert_eq!(layout.context, 7);
    assert_eq!(layout.engine, "test");
}

#[test]
fn test_finish_empty_graph() {
    let layout = finish(&LayoutInput::default(), Placement::default(), "dot", 1);
    assert_eq!(layout.bb, BBox::default());
    assert!(layout.nodes.is_empty());
}

// ─── Preparation ─────────────────────────────────────────────────────────────

#[test]
fn test_prepare_defaults() {
    let g = parse("digraph { a -> b }");
    let input = prepare(&g, SubgraphId::ROOT, false);
    assert_eq!(input.nodes.len(), 2);
    assert_eq!(input.edges.len(), 1);
    assert_eq!(input.edges[0].len, 72.0);
    assert_eq!(input.nodesep, 18.0);
    assert_eq!(input.ranksep, 36.0);
    assert_eq!(input.rankdir, RankDir::TB);
}

#[test]
fn test_prepare_graph_settings() {
    let g = parse("digraph { rankdir=LR nodesep=1 a [shape=box width=2] }");
    let input = prepare(&g, SubgraphId::ROOT, false);
    assert_eq!(input.rankdir, RankDir::LR);
    assert_eq!(input.nodesep, 72.0);
    assert_eq!(input.nodes[0].shape, Shape::Box);
    assert!(input.nodes[0].width >= 144.0);
}

#[test]
fn test_prepare_drops_isolated() {
    let g = parse("graph { a -- b; c }");
    assert_eq!(prepare(&g, SubgraphId::ROOT, true).nodes.len(), 2);
    assert_eq!(prepare(&g, SubgraphId::ROOT, false).nodes.len(), 3);
}

#[test]
fn test_prepare_unknown_shape_warns() {
    let session = Session::begin();
    let g = parse("digraph { a [shape=hexagonx] }");
    let input = prepare(&g, SubgraphId::ROOT, false);
    assert_eq!(input.nodes[0].shape, Shape::Box);
    assert_eq!(
        session.diagnostics().as_deref(),
        Some("Warning: node a, unknown shape hexagonx, using box")
    );
}

#[test]
fn test_prepare_bad_html_label_errors() {
    let session = Session::begin();
    let g = parse("digraph { a [label=<<blink>x</blink>>] }");
    prepare(&g, SubgraphId::ROOT, false);
    let message = session.diagnostics().unwrap();
    assert!(message.starts_with("Error: syntax error in line 1"), "{message}");
    assert!(message.ends_with("in label of node a"), "{message}");
}

#[test]
fn test_prepare_finds_nested_clusters() {
    let g = parse("digraph { subgraph x { subgraph cluster_in { a b } } c }");
    let input = prepare(&g, SubgraphId::ROOT, false);
    assert_eq!(input.clusters.len(), 1);
    assert_eq!(input.clusters[0].1, vec![0, 1]);
}

// ─── Engines ─────────────────────────────────────────────────────────────────

#[test]
fn test_dot_ranks_top_to_bottom() {
    let g = parse("digraph { a -> b -> c }");
    let layout = run(&layered::DotLayout, &g, EngineFlags::default());
    let (a, b, c) = (center(&g, &layout, "a"), center(&g, &layout, "b"), center(&g, &layout, "c"));
    assert!(a.y > b.y && b.y > c.y);
    assert_eq!(layout.bb.ll, Point::new(0.0, 0.0));
    assert!(layout.bb.height() > 0.0);
}

#[test]
fn test_dot_rankdir_lr() {
    let g = parse("digraph { rankdir=LR a -> b }");
    let layout = run(&layered::DotLayout, &g, EngineFlags::default());
    assert!(center(&g, &layout, "a").x < center(&g, &layout, "b").x);
}

#[test]
fn test_dot_handles_cycles() {
    let g = parse("digraph { a -> b -> c -> a }");
    let layout = run(&layered::DotLayout, &g, EngineFlags::default());
    assert_eq!(layout.nodes.len(), 3);
    assert_eq!(layout.edges.len(), 3);
    for e in &layout.edges {
        assert!(e.points.len() >= 2);
    }
}

#[test]
fn test_dot_long_edge_routes_through_ranks() {
    let g = parse("digraph { a -> b -> c; a -> c }");
    let layout = run(&layered::DotLayout, &g, EngineFlags::default());
    let longest = layout.edges.iter().map(|e| e.points.len()).max().unwrap();
    assert!(longest >= 3);
}

#[test]
fn test_dot_sibling_nodes_do_not_overlap() {
    let g = parse("digraph { a -> b; a -> c }");
    let layout = run(&layered::DotLayout, &g, EngineFlags::default());
    let b = layout.node(g.find_node("b").unwrap()).unwrap();
    let c = layout.node(g.find_node("c").unwrap()).unwrap();
    assert!((b.center.x - c.center.x).abs() >= (b.width + c.width) / 2.0);
}

#[test]
fn test_self_loop_and_label_position() {
    let g = parse("digraph { a -> a; a -> b [label=x] }");
    let layout = run(&layered::DotLayout, &g, EngineFlags::default());
    let edges: Vec<_> = g.edges().collect();
    assert_eq!(layout.edge(edges[0]).unwrap().points.len(), 4);
    assert!(layout.edge(edges[0]).unwrap().label_pos.is_none());
    assert!(layout.edge(edges[1]).unwrap().label_pos.is_some());
}

#[test]
fn test_cluster_bounds_enclose_members() {
    let g = parse("digraph { subgraph cluster_0 { a -> b } c }");
    let layout = run(&layered::DotLayout, &g, EngineFlags::default());
    assert_eq!(layout.clusters.len(), 1);
    let bb = layout.clusters[0].bb;
    for name in ["a", "b"] {
        let p = center(&g, &layout, name);
        assert!(bb.ll.x < p.x && p.x < bb.ur.x);
        assert!(bb.ll.y < p.y && p.y < bb.ur.y);
    }
}

#[test]
fn test_neato_places_connected_nodes_apart() {
    let g = parse("graph { a -- b -- c }");
    let layout = run(&force::NeatoLayout, &g, EngineFlags::default());
    let (a, b) = (center(&g, &layout, "a"), center(&g, &layout, "b"));
    assert!(a.x.is_finite() && a.y.is_finite());
    assert!(a.distance(b) > 1.0);
}

#[test]
fn test_reduce_applies_to_force_engines_only() {
    let g = parse("graph { a -- b; lonely }");
    let reduce = EngineFlags { y_invert: false, reduce: true };
    assert_eq!(run(&force::NeatoLayout, &g, reduce).nodes.len(), 2);
    assert_eq!(run(&force::FdpLayout, &g, reduce).nodes.len(), 2);
    assert_eq!(run(&layered::DotLayout, &g, reduce).nodes.len(), 3);
    assert_eq!(run(&force::NeatoLayout, &g, EngineFlags::default()).nodes.len(), 3);
}

#[test]
fn test_fdp_is_deterministic() {
    let g = parse("graph { a -- b -- c -- a }");
    let first = run(&force::FdpLayout, &g, EngineFlags::default());
    let second = run(&force::FdpLayout, &g, EngineFlags::default());
    assert_eq!(first.nodes, second.nodes);
}

#[test]
fn test_circo_components_side_by_side() {
    let g = parse("graph { a -- b -- c -- a; d -- e }");
    let layout = run(&circular::CircoLayout, &g, EngineFlags::default());
    let first_right = ["a", "b", "c"]
        .iter()
        .map(|n| center(&g, &layout, n).x)
        .fold(f64::MIN, f64::max);
    let second_left = ["d", "e"]
        .iter()
        .map(|n| center(&g, &layout, n).x)
        .fold(f64::MAX, f64::min);
    assert!(first_right < second_left);
}

#[test]
fn test_single_node_fits_bounding_box() {
    let g = parse("digraph { a }");
    for engine in [
        &layered::DotLayout as &dyn LayoutEngine,
        &force::NeatoLayout,
        &circular::CircoLayout,
    ] {
        let layout = run(engine, &g, EngineFlags::default());
        let n = &layout.nodes[0];
        assert!((layout.bb.width() - n.width).abs() < 1e-9);
        assert!((layout.bb.height() - n.height).abs() < 1e-9);
    }
}

use super::*;

#[test]
fn test_add_node_returns_handle() {
    let g = VizGraph::new("g", true, false);
    let a = g.add_node("a");
    assert_eq!(a.name().as_deref(), Some("a"));
    a.set_attribute("color", "red", false);
    assert_eq!(a.attribute("color").as_deref(), Some("red"));
    assert_eq!(g.node_count(), 1);
}

#[test]
fn test_add_edge_returns_handle() {
    let g = VizGraph::new("g", true, false);
    let e = g.add_edge("a", "b");
    assert_eq!(e.tail().and_then(|n| n.name()).as_deref(), Some("a"));
    assert_eq!(e.head().and_then(|n| n.name()).as_deref(), Some("b"));
    e.set_attribute("label", "<b>x</b>", true);
    assert_eq!(e.attribute("label").as_deref(), Some("<b>x</b>"));
    assert_eq!(g.edge_count(), 1);
}

#[test]
fn test_handles_inert_after_graph_freed() {
    let g = VizGraph::new("g", true, false);
    let n = g.add_node("a");
    let e = g.add_edge("a", "b");
    drop(g);
    assert_eq!(n.name(), None);
    n.set_attribute("color", "red", false);
    assert_eq!(n.attribute("color"), None);
    assert!(e.tail().is_none());
}

#[test]
fn test_context_renders_built_graph() {
    let g = VizGraph::new("g", true, false);
    g.add_edge("a", "b").set_attribute("color", "blue", false);
    let ctx = VizContext::new();
    assert!(ctx.layout(&g, "dot").is_ok());
    let svg = ctx.render(&g, "svg").ok().unwrap_or_default();
    assert!(svg.contains("stroke=\"blue\""), "{svg}");
}

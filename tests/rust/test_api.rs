use super::*;

use crate::config::EngineFlags;
use crate::engine::graph::open_count;
use crate::engine::read::MAX_SUBGRAPH_DEPTH;

fn plain(text: &str) -> AttributeValue {
    AttributeValue::Plain(text.to_string())
}

// ─── Reading ─────────────────────────────────────────────────────────────────

#[test]
fn test_read_one_graph_sets_node_label_default() {
    let g = read_one_graph("digraph { a -> b }").unwrap();
    assert_eq!(g.node_count(), 2);
    let a = g.find_node("a").unwrap();
    assert_eq!(a.attribute("label"), Some(plain("\\N")));
}

#[test]
fn test_read_one_graph_drains_trailing_graphs() {
    let session = Session::begin();
    let before = open_count::get();
    let g = read_one_graph_in(&session, "digraph first { a } digraph second { b } graph third { c }")
        .unwrap();
    assert_eq!(g.name().as_deref(), Some("first"));
    assert!(!read::stream_pending());
    assert_eq!(open_count::get(), before + 1);
    drop(g);
    assert_eq!(open_count::get(), before);
}

#[test]
fn test_read_one_graph_error_closes_graphs() {
    let before = open_count::get();
    read_one_graph("digraph ok { a } digraph { b -> }").unwrap_err();
    assert_eq!(open_count::get(), before);
}

#[test]
fn test_read_one_graph_deep_nesting() {
    let depth = MAX_SUBGRAPH_DEPTH + 1;
    let text = format!("digraph {{ {}a{} }}", "{".repeat(depth), "}".repeat(depth));
    let err = read_one_graph(&text).unwrap_err();
    assert_eq!(
        err,
        VizError::Parse("Error: syntax error in line 1 near '{'".to_string())
    );
}

#[test]
fn test_read_one_graph_syntax_error() {
    let err = read_one_graph("digraph { a -> }").unwrap_err();
    assert!(matches!(err, VizError::Parse(_)));
    assert!(err.message().starts_with("Error: syntax error in line 1"), "{err}");
}

#[test]
fn test_read_one_graph_error_in_trailing_graph() {
    let err = read_one_graph("digraph ok { a } digraph { b -> }").unwrap_err();
    assert!(err.message().contains("syntax error"), "{err}");
}

#[test]
fn test_read_one_graph_empty_input() {
    let err = read_one_graph("   ").unwrap_err();
    assert_eq!(err, VizError::Parse(READ_FAILED.to_string()));
}

#[test]
fn test_read_one_graph_truncates_at_nul() {
    let g = read_one_graph("digraph { a }\0 garbage that is not dot").unwrap();
    assert_eq!(g.node_names(), vec!["a"]);
}

// ─── Construction ────────────────────────────────────────────────────────────

#[test]
fn test_add_node_idempotent() {
    let g = create_graph("g", true, false);
    let first = add_node(&g, "x");
    let second = add_node(&g, "x");
    assert!(first.same_as(&second));
    assert_eq!(g.node_count(), 1);
}

#[test]
fn test_add_edge_creates_endpoints() {
    let g = create_graph("g", false, false);
    let e1 = add_edge(&g, "a", "b");
    let e2 = add_edge(&g, "a", "b");
    assert!(!e1.same_as(&e2));
    assert_eq!(g.node_count(), 2);
    assert_eq!(g.edge_count(), 2);
    assert_eq!(e1.tail().and_then(|n| n.name()).as_deref(), Some("a"));
}

#[test]
fn test_strict_graph_merges_edges() {
    let g = create_graph("g", true, true);
    let e1 = add_edge(&g, "a", "b");
    let e2 = add_edge(&g, "a", "b");
    assert!(e1.same_as(&e2));
    assert_eq!(g.edge_count(), 1);
}

#[test]
fn test_add_subgraph_get_or_create() {
    let g = create_graph("g", true, false);
    let s1 = add_subgraph(&g, "cluster_a");
    let s2 = add_subgraph(&g, "cluster_a");
    assert!(s1.same_as(&s2));
    assert_eq!(s1.ownership(), crate::resource::Ownership::Borrowed);
    add_node(&s1, "inner");
    assert_eq!(g.node_names(), vec!["inner"]);
}

#[test]
fn test_default_attributes() {
    let g = create_graph("g", true, false);
    let before = add_node(&g, "before");
    set_default_node_attribute(&g, "shape", &plain("box"));
    set_default_edge_attribute(&g, "color", &plain("red"));
    set_default_graph_attribute(&g, "rankdir", &plain("LR"));
    let after = add_node(&g, "after");
    let e = add_edge(&g, "before", "after");

    assert_eq!(after.attribute("shape"), Some(plain("box")));
    // The first declaration stamps existing nodes too.
    assert_eq!(before.attribute("shape"), Some(plain("box")));
    assert_eq!(e.attribute("color"), Some(plain("red")));
    assert_eq!(g.attribute("rankdir"), Some(plain("LR")));
}

#[test]
fn test_subgraph_default_stays_local() {
    let g = create_graph("g", true, false);
    let s = add_subgraph(&g, "s");
    set_default_node_attribute(&s, "color", &plain("blue"));
    let inside = add_node(&s, "in");
    let outside = add_node(&g, "out");
    assert_eq!(inside.attribute("color"), Some(plain("blue")));
    assert_eq!(outside.attribute("color"), Some(plain("")));
}

#[test]
fn test_set_attribute_each_kind() {
    let g = create_graph("g", true, false);
    let n = add_node(&g, "a");
    let other = add_node(&g, "b");
    let e = add_edge(&g, "a", "b");

    set_attribute(&g, "label", &plain("title"));
    set_attribute(&n, "xlabel", &plain("note"));
    set_attribute(&e, "style", &plain("dashed"));

    assert_eq!(g.attribute("label"), Some(plain("title")));
    assert_eq!(n.attribute("xlabel"), Some(plain("note")));
    assert_eq!(other.attribute("xlabel"), Some(plain("")));
    assert_eq!(e.attribute("style"), Some(plain("dashed")));
}

#[test]
fn test_set_node_attribute_creates_node() {
    let g = create_graph("g", true, false);
    set_node_attribute(&g, "fresh", "color", &plain("green"));
    let n = g.find_node("fresh").unwrap();
    assert_eq!(n.attribute("color"), Some(plain("green")));
}

#[test]
fn test_html_attribute_kept() {
    let g = create_graph("g", true, false);
    let n = add_node(&g, "a");
    let value = AttributeValue::Html("<b>x</b>".to_string());
    set_attribute(&n, "label", &value);
    assert_eq!(n.attribute("label"), Some(value));
}

#[test]
fn test_closed_graph_handles_are_inert() {
    let g = create_graph("g", true, false);
    let s = add_subgraph(&g, "s");
    let n = add_node(&g, "a");
    drop(g);

    let late = add_node(&s, "late");
    assert_eq!(late.name(), None);
    let edge = add_edge(&s, "x", "y");
    assert!(edge.tail().is_none());
    set_attribute(&n, "color", &plain("red"));
    assert_eq!(n.attribute("color"), None);
    assert!(!add_subgraph(&s, "t").is_open());
}

// ─── Layout and render ───────────────────────────────────────────────────────

#[test]
fn test_layout_and_render_svg() {
    let g = create_graph("g", true, false);
    add_edge(&g, "A", "B");
    let ctx = create_context();
    layout(&ctx, &g, "dot").unwrap();
    assert!(g.has_layout());
    let svg = render(&ctx, &g, "svg").unwrap();
    assert!(svg.contains("<title>A</title>"));
    assert!(svg.contains("<title>B</title>"));
}

#[test]
fn test_render_bytes_matches_render() {
    let g = read_one_graph("digraph { a -> b }").unwrap();
    let ctx = create_context();
    layout(&ctx, &g, "dot").unwrap();
    let bytes = render_bytes(&ctx, &g, "plain").unwrap();
    let text = render(&ctx, &g, "plain").unwrap();
    assert_eq!(bytes, text.as_bytes());
    assert!(text.ends_with("stop\n"));
}

#[test]
fn test_context_reuse() {
    let ctx = create_context();
    let g = read_one_graph("digraph { a -> b -> c }").unwrap();
    layout(&ctx, &g, "dot").unwrap();
    render(&ctx, &g, "svg").unwrap();
    free_layout(&ctx, &g);
    assert!(!g.has_layout());
    layout(&ctx, &g, "neato").unwrap();
    render(&ctx, &g, "json").unwrap();

    let other = read_one_graph("graph { x -- y }").unwrap();
    layout(&ctx, &other, "circo").unwrap();
    render(&ctx, &other, "dot").unwrap();
}

#[test]
fn test_render_rejects_layout_of_dropped_context() {
    let g = read_one_graph("digraph { a -> b }").unwrap();
    let first = create_context();
    layout(&first, &g, "dot").unwrap();
    drop(first);

    let second = create_context();
    let err = render(&second, &g, "svg").unwrap_err();
    assert_eq!(err, VizError::Render("Error: Layout was not done".to_string()));

    layout(&second, &g, "dot").unwrap();
    render(&second, &g, "svg").unwrap();
}

#[test]
fn test_render_rejects_layout_of_other_live_context() {
    let g = read_one_graph("digraph { a }").unwrap();
    let first = create_context();
    let second = create_context();
    layout(&first, &g, "dot").unwrap();
    assert!(render(&second, &g, "plain").is_err());
    assert!(render(&first, &g, "plain").is_ok());
}

#[test]
fn test_free_layout_without_layout() {
    let ctx = create_context();
    let g = create_graph("g", true, false);
    free_layout(&ctx, &g);
    assert!(!g.has_layout());
}

#[test]
fn test_layout_unknown_engine() {
    let ctx = create_context();
    let g = read_one_graph("digraph { a }").unwrap();
    let err = layout(&ctx, &g, "nope").unwrap_err();
    assert_eq!(
        err,
        VizError::Layout(
            "Error: Layout type: \"nope\" not recognized. Use one of: circo dot fdp neato".to_string()
        )
    );
}

#[test]
fn test_layout_reports_warnings() {
    let ctx = create_context();
    let g = read_one_graph("digraph { a [shape=hexagonx] }").unwrap();
    let err = layout(&ctx, &g, "dot").unwrap_err();
    assert_eq!(err.message(), "Warning: node a, unknown shape hexagonx, using box");
}

#[test]
fn test_layout_rejects_bad_html_label() {
    let ctx = create_context();
    let g = create_graph("g", true, false);
    let n = add_node(&g, "a");
    set_attribute(&n, "label", &AttributeValue::Html("<b>unclosed".to_string()));
    let err = layout(&ctx, &g, "dot").unwrap_err();
    assert!(matches!(err, VizError::Layout(_)));
    assert!(err.message().contains("in label of node a"), "{err}");
}

#[test]
fn test_render_before_layout() {
    let ctx = create_context();
    let g = read_one_graph("digraph { a }").unwrap();
    let err = render(&ctx, &g, "svg").unwrap_err();
    assert_eq!(err, VizError::Render("Error: Layout was not done".to_string()));
}

#[test]
fn test_render_unknown_format() {
    let ctx = create_context();
    let g = read_one_graph("digraph { a }").unwrap();
    layout(&ctx, &g, "dot").unwrap();
    let err = render(&ctx, &g, "png").unwrap_err();
    assert_eq!(
        err.message(),
        "Error: Format: \"png\" not recognized. Use one of: canon dot gv json plain svg"
    );
}

#[test]
fn test_render_closed_graph() {
    let ctx = create_context();
    let g = create_graph("g", true, false);
    let view = add_subgraph(&g, "s");
    drop(g);
    assert_eq!(
        layout(&ctx, &view, "dot").unwrap_err(),
        VizError::Layout(LAYOUT_FAILED.to_string())
    );
    assert_eq!(
        render(&ctx, &view, "svg").unwrap_err(),
        VizError::Render(RENDER_FAILED.to_string())
    );
}

// ─── One-shot pipeline ───────────────────────────────────────────────────────

#[test]
fn test_render_dot_svg() {
    let ctx = create_context();
    let svg = render_dot(&ctx, "digraph { A -> B }", "dot", "svg").unwrap();
    assert!(svg.starts_with("<?xml"));
}

#[test]
fn test_render_dot_failures() {
    let ctx = create_context();
    let parse = render_dot(&ctx, "digraph {", "dot", "svg").unwrap_err();
    assert!(matches!(parse, VizError::Parse(_)));
    assert!(parse.message().contains("syntax error"), "{parse}");

    let empty = render_dot(&ctx, "", "dot", "svg").unwrap_err();
    assert_eq!(empty, VizError::Parse(PIPELINE_READ_FAILED.to_string()));

    let engine = render_dot(&ctx, "digraph { a }", "", "svg").unwrap_err();
    assert!(matches!(engine, VizError::Layout(_)));
    assert!(engine.message().contains("not recognized"), "{engine}");

    let format = render_dot(&ctx, "digraph { a }", "dot", "bmp").unwrap_err();
    assert!(matches!(format, VizError::Render(_)));
}

#[test]
fn test_render_dot_closes_graph_on_every_path() {
    let ctx = create_context();
    let before = open_count::get();

    render_dot(&ctx, "digraph { a -> b }", "dot", "svg").unwrap();
    assert_eq!(open_count::get(), before);

    render_dot(&ctx, "digraph { a -> b }", "nope", "svg").unwrap_err();
    assert_eq!(open_count::get(), before);

    // Layout succeeds, render fails.
    let err = render_dot(&ctx, "digraph { a -> b }", "dot", "bmp").unwrap_err();
    assert!(err.message().contains("Format: \"bmp\" not recognized"), "{err}");
    assert_eq!(open_count::get(), before);

    render_dot(&ctx, "digraph { a -> }", "dot", "svg").unwrap_err();
    assert_eq!(open_count::get(), before);
}

#[test]
fn test_render_dot_tolerates_warnings() {
    let ctx = create_context();
    let svg = render_dot(&ctx, "digraph { a [shape=hexagonx] }", "dot", "svg").unwrap();
    assert!(svg.contains("<title>a</title>"));
}

// ─── Queries and switches ────────────────────────────────────────────────────

#[test]
fn test_version() {
    assert_eq!(get_graphviz_version(), env!("VIZ_ENGINE_VERSION"));
}

#[test]
fn test_plugin_lists() {
    let layouts = get_plugin_list("layout");
    assert_eq!(layouts, ["circo", "dot", "fdp", "neato"]);
    let renderers = get_plugin_list("render");
    assert!(renderers.iter().any(|r| r == "svg"));
    assert!(get_plugin_list("bogus").is_empty());
    assert_eq!(get_plugin_list("device"), renderers);
}

#[test]
fn test_switches() {
    let _session = Session::begin();
    set_reduce(1);
    set_y_invert(7);
    assert_eq!(EngineFlags::current(), EngineFlags { y_invert: true, reduce: true });
    set_reduce(0);
    set_y_invert(0);
    assert_eq!(EngineFlags::current(), EngineFlags::default());
}

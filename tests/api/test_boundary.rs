//! Integration tests for the host-facing boundary.
//!
//! Everything here goes through the public API only: graphs are built or
//! parsed, laid out with a context and rendered, and failures are checked
//! through their merged error text.

use viz_component::{
    AttributeValue, Graph, RenderConfig, VizError, add_edge, add_node, add_subgraph,
    create_context, create_graph, free_layout, get_graphviz_version, get_plugin_list, layout,
    read_one_graph, render, render_bytes, render_dot, render_dot_bytes, render_with_config,
    set_attribute, set_default_node_attribute, set_node_attribute,
};

fn plain(text: &str) -> AttributeValue {
    AttributeValue::Plain(text.to_string())
}

/// Node names, edges as name pairs and the node/edge attributes a test cares about.
fn shape_of(g: &Graph, attrs: &[&str]) -> (Vec<String>, Vec<(String, String)>, Vec<Option<AttributeValue>>) {
    let mut values = Vec::new();
    for name in g.node_names() {
        let node = g.find_node(&name).unwrap();
        for attr in attrs {
            values.push(node.attribute(attr));
        }
    }
    (g.node_names(), g.edge_names(), values)
}

// ─── Construction and parsing ────────────────────────────────────────────────

#[test]
fn test_read_matches_construction() {
    let parsed = read_one_graph(r#"digraph g { a [color=red]; a -> b; b -> c }"#).unwrap();

    let built = create_graph("g", true, false);
    let a = add_node(&built, "a");
    set_attribute(&a, "color", &plain("red"));
    add_edge(&built, "a", "b");
    add_edge(&built, "b", "c");

    assert_eq!(parsed.name(), built.name());
    assert_eq!(parsed.is_directed(), built.is_directed());
    assert_eq!(shape_of(&parsed, &["color"]), shape_of(&built, &["color"]));
}

#[test]
fn test_malformed_input_fails_with_text() {
    for text in ["digraph {", "digraph { a -> }", "graph { a -> b }", "not a graph"] {
        let err = read_one_graph(text).unwrap_err();
        assert!(matches!(err, VizError::Parse(_)), "{text}: {err:?}");
        assert!(!err.message().is_empty(), "{text}");
    }
}

#[test]
fn test_add_node_twice_same_node() {
    let g = create_graph("g", false, false);
    let first = add_node(&g, "x");
    let second = add_node(&g, "x");
    assert!(first.same_as(&second));
    assert_eq!(g.node_count(), 1);
}

#[test]
fn test_default_node_attribute_applies() {
    let g = create_graph("g", true, false);
    set_default_node_attribute(&g, "fillcolor", &plain("yellow"));
    let n = add_node(&g, "n");
    assert_eq!(n.attribute("fillcolor"), Some(plain("yellow")));
}

#[test]
fn test_subgraph_handles() {
    let g = create_graph("g", true, false);
    let cluster = add_subgraph(&g, "cluster_0");
    add_edge(&cluster, "a", "b");
    add_node(&g, "c");
    assert_eq!(cluster.node_count(), 2);
    assert_eq!(g.node_count(), 3);
    assert_eq!(g.edge_count(), 1);
}

#[test]
fn test_handles_after_close() {
    let g = create_graph("g", true, false);
    let sub = add_subgraph(&g, "s");
    let node = add_node(&g, "a");
    drop(g);
    assert!(!sub.is_open());
    assert_eq!(node.name(), None);
    set_node_attribute(&sub, "b", "color", &plain("red"));
    assert_eq!(sub.node_count(), 0);
}

// ─── Layout and render ───────────────────────────────────────────────────────

#[test]
fn test_concrete_scenario() {
    let g = create_graph("g", true, false);
    add_edge(&g, "A", "B");
    let ctx = create_context();
    layout(&ctx, &g, "dot").unwrap();
    let svg = render(&ctx, &g, "svg").unwrap();
    assert!(svg.contains("<title>A</title>"));
    assert!(svg.contains("<title>B</title>"));
}

#[test]
fn test_context_reusable() {
    let g = read_one_graph("digraph { a -> b; b -> c; c -> a }").unwrap();
    let ctx = create_context();
    layout(&ctx, &g, "dot").unwrap();
    render(&ctx, &g, "svg").unwrap();
    free_layout(&ctx, &g);
    layout(&ctx, &g, "dot").unwrap();
    render(&ctx, &g, "svg").unwrap();
    layout(&ctx, &g, "fdp").unwrap();
    render(&ctx, &g, "plain").unwrap();
}

#[test]
fn test_render_requires_layout() {
    let g = read_one_graph("digraph { a }").unwrap();
    let ctx = create_context();
    let err = render(&ctx, &g, "svg").unwrap_err();
    assert!(matches!(err, VizError::Render(_)));
    assert!(err.message().contains("Layout was not done"));
}

#[test]
fn test_html_label_validation() {
    let g = create_graph("g", true, false);
    set_node_attribute(&g, "a", "label", &AttributeValue::Html("<table><tr></table>".to_string()));
    let ctx = create_context();
    let err = layout(&ctx, &g, "dot").unwrap_err();
    assert!(matches!(err, VizError::Layout(_)));
    assert!(err.message().contains("label of node a"), "{err}");

    let ok = create_graph("g", true, false);
    set_node_attribute(&ok, "a", "label", &AttributeValue::Html("<b>fine</b>".to_string()));
    layout(&ctx, &ok, "dot").unwrap();
    assert!(render(&ctx, &ok, "svg").unwrap().contains(">fine</text>"));
}

#[test]
fn test_render_bytes_exact_length() {
    let g = read_one_graph("digraph { a -> b }").unwrap();
    let ctx = create_context();
    layout(&ctx, &g, "dot").unwrap();
    let bytes = render_bytes(&ctx, &g, "json").unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(doc["objects"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_every_engine_and_format() {
    let ctx = create_context();
    let g = read_one_graph("digraph { rankdir=LR a -> b -> c; a -> c; subgraph cluster_x { d } }").unwrap();
    for engine in get_plugin_list("layout") {
        layout(&ctx, &g, &engine).unwrap();
        for format in get_plugin_list("render") {
            let out = render_bytes(&ctx, &g, &format).unwrap();
            assert!(!out.is_empty(), "{engine}/{format}");
        }
    }
}

// ─── One-shot pipeline ───────────────────────────────────────────────────────

#[test]
fn test_render_dot_minimal() {
    let ctx = create_context();
    let svg = render_dot(&ctx, "digraph { A -> B }", "dot", "svg").unwrap();
    assert!(svg.starts_with("<?xml"));
    assert!(svg.contains("<svg"));
}

#[test]
fn test_render_dot_bad_engine() {
    let ctx = create_context();
    for engine in ["", "nonexistent"] {
        let err = render_dot(&ctx, "digraph { A -> B }", engine, "svg").unwrap_err();
        assert!(matches!(err, VizError::Layout(_)));
        assert!(!err.message().is_empty());
    }
    // The context is still usable afterwards.
    render_dot(&ctx, "digraph { A -> B }", "dot", "svg").unwrap();
}

#[test]
fn test_render_dot_reads_first_graph_only() {
    let ctx = create_context();
    let out = render_dot(&ctx, "digraph one { a } digraph two { b }", "dot", "canon").unwrap();
    assert!(out.starts_with("digraph one {"));
    assert!(!out.contains("two"));
}

#[test]
fn test_render_dot_bytes_matches_text() {
    let ctx = create_context();
    let text = render_dot(&ctx, "graph { x -- y }", "neato", "plain").unwrap();
    let bytes = render_dot_bytes(&ctx, "graph { x -- y }", "neato", "plain").unwrap();
    assert_eq!(text.as_bytes(), bytes.as_slice());
}

#[test]
fn test_render_with_config() {
    let config = RenderConfig {
        format: "canon".to_string(),
        ..RenderConfig::new()
    };
    let out = render_with_config("digraph G { a -> b }", &config).unwrap();
    assert!(String::from_utf8(out).unwrap().contains("a -> b"));
}

// ─── Queries ─────────────────────────────────────────────────────────────────

#[test]
fn test_plugin_list_has_builtin_engines() {
    let layouts = get_plugin_list("layout");
    assert!(layouts.iter().any(|l| l == "dot"));
    assert!(layouts.iter().any(|l| l == "neato"));
    assert!(get_plugin_list("render").iter().any(|r| r == "svg"));
    assert!(get_plugin_list("nothing").is_empty());
}

#[test]
fn test_version_not_empty() {
    let version = get_graphviz_version();
    assert!(!version.is_empty());
    assert!(!version.starts_with("Error"));
}

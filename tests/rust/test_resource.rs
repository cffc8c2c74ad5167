use super::*;

use crate::engine::Desc;

fn root(name: &str) -> Graph {
    Graph::owned(engine::Graph::open(name, Desc { directed: true, strict: false }))
}

fn add(graph: &Graph, name: &str) -> Node {
    let id = graph
        .native()
        .with_mut(|g| g.node(graph.sub(), name, true))
        .flatten()
        .unwrap();
    Node::new(graph.native().clone(), id)
}

#[test]
fn test_owned_graph_queries() {
    let g = root("g");
    assert_eq!(g.ownership(), Ownership::Owned);
    assert!(g.is_open());
    assert_eq!(g.name().as_deref(), Some("g"));
    assert_eq!(g.is_directed(), Some(true));
    assert_eq!(g.is_strict(), Some(false));
    add(&g, "a");
    add(&g, "b");
    assert_eq!(g.node_names(), vec!["a", "b"]);
    assert_eq!(g.node_count(), 2);
    assert!(!g.has_layout());
}

#[test]
fn test_subgraph_view_is_borrowed() {
    let g = root("g");
    let sub = g
        .native()
        .with_mut(|eg| eg.subgraph(SubgraphId::ROOT, "s", true))
        .flatten()
        .unwrap();
    let view = Graph::borrowed(g.native().clone(), sub);
    assert_eq!(view.ownership(), Ownership::Borrowed);
    assert_eq!(view.name().as_deref(), Some("s"));
    add(&view, "inside");
    add(&g, "outside");
    assert_eq!(view.node_names(), vec!["inside"]);
    assert_eq!(g.node_count(), 2);

    // Dropping the view leaves the root open.
    drop(view);
    assert!(g.is_open());
}

#[test]
fn test_dropping_root_closes_views() {
    let g = root("g");
    let view = Graph::borrowed(g.native().clone(), SubgraphId::ROOT);
    let node = add(&g, "a");
    drop(g);
    assert!(!view.is_open());
    assert_eq!(view.name(), None);
    assert_eq!(view.node_count(), 0);
    assert_eq!(node.name(), None);
    assert_eq!(node.attribute("label"), None);
    assert!(Object::from(&node).resolve().is_none());
    assert!(Object::from(&view).resolve().is_none());
}

#[test]
fn test_node_identity() {
    let g = root("g");
    let first = add(&g, "x");
    let second = add(&g, "x");
    let other = add(&g, "y");
    assert!(first.same_as(&second));
    assert!(!first.same_as(&other));
    assert!(g.find_node("x").unwrap().same_as(&first));
    assert!(g.find_node("missing").is_none());

    let elsewhere = root("h");
    assert!(!add(&elsewhere, "x").same_as(&first));
}

#[test]
fn test_edge_endpoints() {
    let g = root("g");
    let a = add(&g, "a");
    let b = add(&g, "b");
    let id = g
        .native()
        .with_mut(|eg| eg.edge(SubgraphId::ROOT, a.id(), b.id(), None, true))
        .flatten()
        .unwrap();
    let edge = Edge::new(g.native().clone(), id);
    assert!(edge.tail().unwrap().same_as(&a));
    assert!(edge.head().unwrap().same_as(&b));
    assert_eq!(g.edge_names(), vec![("a".to_string(), "b".to_string())]);
}

#[test]
fn test_attribute_values() {
    let plain = AttributeValue::from("red");
    assert_eq!(plain, AttributeValue::Plain("red".to_string()));
    assert!(!plain.to_engine().html);

    let html = AttributeValue::Html("<b>x</b>".to_string());
    let engine_value = html.to_engine();
    assert!(engine_value.html);
    assert_eq!(AttributeValue::from_engine(&engine_value), html);
    assert_eq!(html.text(), "<b>x</b>");
}

#[test]
fn test_object_resolves_while_open() {
    let g = root("g");
    let node = add(&g, "a");
    let (native, obj) = Object::from(&node).resolve().unwrap();
    assert!(native.same(g.native()));
    assert_eq!(obj, ObjRef::Node(node.id()));
    let (_, obj) = Object::from(&g).resolve().unwrap();
    assert_eq!(obj, ObjRef::Graph(SubgraphId::ROOT));
}

#[test]
fn test_graph_debug_reports_state() {
    let g = root("dbg");
    let text = format!("{g:?}");
    assert!(text.contains("dbg"));
    assert!(text.contains("Owned"));
}

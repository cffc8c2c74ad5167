//! Circular ("circo") layout: each connected component on its own circle,
//! components side by side.

use std::f64::consts::TAU;

use super::{LayoutEngine, LayoutInput, Placement, Point};

pub struct CircoLayout;

impl LayoutEngine for CircoLayout {
    fn place(&self, input: &LayoutInput) -> Placement {
        Placement::straight(circular(input))
    }
}

/// Components in discovery order, each listed in depth-first order so
/// neighbours tend to sit next to each other on the circle.
fn components(input: &LayoutInput) -> Vec<Vec<usize>> {
    let n = input.nodes.len();
    let mut adj = vec![Vec::new(); n];
    for e in &input.edges {
        if e.tail != e.head {
            adj[e.tail].push(e.head);
            adj[e.head].push(e.tail);
        }
    }

    let mut seen = vec![false; n];
    let mut out = Vec::new();
    for start in 0..n {
        if seen[start] {
            continue;
        }
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(v) = stack.pop() {
            if seen[v] {
                continue;
            }
            seen[v] = true;
            order.push(v);
            stack.extend(adj[v].iter().rev().copied().filter(|&w| !seen[w]));
        }
        out.push(order);
    }
    out
}

pub fn circular(input: &LayoutInput) -> Vec<Point> {
    let mut pos = vec![Point::default(); input.nodes.len()];
    let mut left = 0.0;

    for comp in components(input) {
        let size = |v: usize| input.nodes[v].width.max(input.nodes[v].height);
        let circumference: f64 = comp.iter().map(|&v| size(v) + input.nodesep).sum();
        let widest = comp.iter().map(|&v| size(v)).fold(0.0, f64::max);
        let radius = if comp.len() == 1 {
            0.0
        } else {
            (circumference / TAU).max(widest)
        };

        let cx = left + radius + widest / 2.0;
        for (i, &v) in comp.iter().enumerate() {
            let a = TAU * i as f64 / comp.len() as f64;
            pos[v] = Point::new(cx + radius * a.cos(), radius * a.sin());
        }
        left = cx + radius + widest / 2.0 + input.nodesep;
    }
    pos
}

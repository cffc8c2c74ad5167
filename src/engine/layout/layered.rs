//! Layered ("dot") layout.
//!
//! Classic Sugiyama pipeline over node indices: greedy-FAS cycle removal,
//! longest-path layering, virtual nodes on long edges, barycenter crossing
//! reduction and a packing pass that pulls nodes toward their neighbours.

use std::collections::BTreeSet;

use super::{LayoutEngine, LayoutInput, Placement, Point, RankDir};

/// Breadth reserved for a virtual node.
const VIRTUAL_BREADTH: f64 = 10.0;
const MAX_ORDER_PASSES: usize = 24;
const PACKING_PASSES: usize = 8;

pub struct DotLayout;

impl LayoutEngine for DotLayout {
    fn place(&self, input: &LayoutInput) -> Placement {
        layered(input)
    }
}

// ─── Adjacency ───────────────────────────────────────────────────────────────

struct Adjacency {
    succ: Vec<Vec<usize>>,
    pred: Vec<Vec<usize>>,
}

impl Adjacency {
    fn new(n: usize, edges: &[(usize, usize)]) -> Self {
        let mut succ = vec![Vec::new(); n];
        let mut pred = vec![Vec::new(); n];
        for &(t, h) in edges {
            succ[t].push(h);
            pred[h].push(t);
        }
        Self { succ, pred }
    }
}

// ─── Cycle Removal (Greedy-FAS) ─────────────────────────────────────────────

/// Node ordering from the greedy-FAS heuristic; edges pointing backwards in
/// this order get reversed.
fn greedy_fas_ordering(n: usize, adj: &Adjacency) -> Vec<usize> {
    let mut active: BTreeSet<usize> = (0..n).collect();
    let mut out_deg: Vec<i64> = adj.succ.iter().map(|s| s.len() as i64).collect();
    let mut in_deg: Vec<i64> = adj.pred.iter().map(|p| p.len() as i64).collect();

    let mut s1: Vec<usize> = Vec::new();
    let mut s2: Vec<usize> = Vec::new();

    while !active.is_empty() {
        loop {
            let sinks: Vec<usize> = active.iter().copied().filter(|&v| out_deg[v] == 0).collect();
            if sinks.is_empty() {
                break;
            }
            for sink in sinks {
                active.remove(&sink);
                s2.push(sink);
                for &p in &adj.pred[sink] {
                    if active.contains(&p) {
                        out_deg[p] -= 1;
                    }
                }
            }
        }

        loop {
            let sources: Vec<usize> = active.iter().copied().filter(|&v| in_deg[v] == 0).collect();
            if sources.is_empty() {
                break;
            }
            for source in sources {
                active.remove(&source);
                s1.push(source);
                for &s in &adj.succ[source] {
                    if active.contains(&s) {
                        in_deg[s] -= 1;
                    }
                }
            }
        }

        // First node with the largest out-in difference.
        let best = active
            .iter()
            .copied()
            .fold(None, |best: Option<usize>, v| match best {
                Some(b) if out_deg[b] - in_deg[b] >= out_deg[v] - in_deg[v] => Some(b),
                _ => Some(v),
            });
        if let Some(best) = best {
            active.remove(&best);
            s1.push(best);
            for &s in &adj.succ[best] {
                if active.contains(&s) {
                    in_deg[s] -= 1;
                }
            }
            for &p in &adj.pred[best] {
                if active.contains(&p) {
                    out_deg[p] -= 1;
                }
            }
        }
    }

    s2.reverse();
    s1.extend(s2);
    s1
}

/// Acyclic orientation of the non-loop edges: `(edge index, from, to, reversed)`.
fn remove_cycles(n: usize, edges: &[(usize, usize)]) -> Vec<(usize, usize, usize, bool)> {
    let proper: Vec<(usize, usize)> = edges.iter().copied().filter(|(t, h)| t != h).collect();
    let ordering = greedy_fas_ordering(n, &Adjacency::new(n, &proper));
    let mut position = vec![0usize; n];
    for (i, &v) in ordering.iter().enumerate() {
        position[v] = i;
    }

    edges
        .iter()
        .enumerate()
        .filter(|(_, (t, h))| t != h)
        .map(|(i, &(t, h))| {
            if position[t] > position[h] {
                (i, h, t, true)
            } else {
                (i, t, h, false)
            }
        })
        .collect()
}

// ─── Layer Assignment ────────────────────────────────────────────────────────

fn assign_layers(n: usize, dag: &[(usize, usize, usize, bool)]) -> Vec<usize> {
    let mut layers = vec![0usize; n];
    // A DAG settles within n rounds.
    for _ in 0..=n {
        let mut changed = false;
        for &(_, from, to, _) in dag {
            if layers[to] < layers[from] + 1 {
                layers[to] = layers[from] + 1;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    layers
}

// ─── Virtual Node Insertion ──────────────────────────────────────────────────

/// One input edge expanded into a chain of consecutive-layer nodes.
struct Chain {
    edge: usize,
    nodes: Vec<usize>,
    reversed: bool,
}

struct Augmented {
    layers: Vec<usize>,
    breadth: Vec<f64>,
    depth: Vec<f64>,
    segments: Vec<(usize, usize)>,
    chains: Vec<Chain>,
}

fn insert_virtual_nodes(
    input: &LayoutInput,
    dag: &[(usize, usize, usize, bool)],
    mut layers: Vec<usize>,
) -> Augmented {
    let horizontal = matches!(input.rankdir, RankDir::LR | RankDir::RL);
    let (mut breadth, mut depth): (Vec<f64>, Vec<f64>) = input
        .nodes
        .iter()
        .map(|n| if horizontal { (n.height, n.width) } else { (n.width, n.height) })
        .unzip();

    let mut segments = Vec::new();
    let mut chains = Vec::new();

    for &(edge, from, to, reversed) in dag {
        let mut chain = vec![from];
        for layer in layers[from] + 1..layers[to] {
            let v = layers.len();
            layers.push(layer);
            breadth.push(VIRTUAL_BREADTH);
            depth.push(0.0);
            chain.push(v);
        }
        chain.push(to);
        for w in chain.windows(2) {
            segments.push((w[0], w[1]));
        }
        chains.push(Chain {
            edge,
            nodes: chain,
            reversed,
        });
    }

    Augmented {
        layers,
        breadth,
        depth,
        segments,
        chains,
    }
}

// ─── Crossing Minimization ───────────────────────────────────────────────────

fn barycenter(neighbors: &[usize], position: &[f64]) -> f64 {
    if neighbors.is_empty() {
        return f64::INFINITY;
    }
    neighbors.iter().map(|&v| position[v]).sum::<f64>() / neighbors.len() as f64
}

fn count_crossings(ordering: &[Vec<usize>], adj: &Adjacency, total_nodes: usize) -> usize {
    let mut position = vec![0usize; total_nodes];
    for layer in ordering {
        for (i, &v) in layer.iter().enumerate() {
            position[v] = i;
        }
    }

    let mut total = 0;
    for layer in ordering {
        let mut edges: Vec<(usize, usize)> = Vec::new();
        for (sp, &v) in layer.iter().enumerate() {
            for &s in &adj.succ[v] {
                edges.push((sp, position[s]));
            }
        }
        for i in 0..edges.len() {
            for j in i + 1..edges.len() {
                let (a0, a1) = edges[i];
                let (b0, b1) = edges[j];
                if (a0 < b0 && a1 > b1) || (a0 > b0 && a1 < b1) {
                    total += 1;
                }
            }
        }
    }
    total
}

fn minimise_crossings(aug: &Augmented, adj: &Adjacency) -> Vec<Vec<usize>> {
    let total = aug.layers.len();
    let layer_count = aug.layers.iter().copied().max().map_or(0, |m| m + 1);
    let mut ordering: Vec<Vec<usize>> = vec![Vec::new(); layer_count];
    for v in 0..total {
        ordering[aug.layers[v]].push(v);
    }

    let mut best_crossings = count_crossings(&ordering, adj, total);
    let mut best = ordering.clone();
    let mut position = vec![0.0f64; total];

    let sort_layer = |layer: &mut Vec<usize>, neighbors: &Vec<Vec<usize>>, position: &[f64]| {
        let current: Vec<(usize, f64)> = layer
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let bc = barycenter(&neighbors[v], position);
                (v, if bc.is_finite() { bc } else { i as f64 })
            })
            .collect();
        let mut sorted = current;
        sorted.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        *layer = sorted.into_iter().map(|(v, _)| v).collect();
    };

    for _ in 0..MAX_ORDER_PASSES {
        if best_crossings == 0 {
            break;
        }
        for l in 1..layer_count {
            for (i, &v) in ordering[l - 1].iter().enumerate() {
                position[v] = i as f64;
            }
            sort_layer(&mut ordering[l], &adj.pred, &position);
        }
        for l in (0..layer_count.saturating_sub(1)).rev() {
            for (i, &v) in ordering[l + 1].iter().enumerate() {
                position[v] = i as f64;
            }
            sort_layer(&mut ordering[l], &adj.succ, &position);
        }

        let crossings = count_crossings(&ordering, adj, total);
        if crossings >= best_crossings {
            break;
        }
        best_crossings = crossings;
        best = ordering.clone();
    }

    best
}

// ─── Coordinate Assignment ───────────────────────────────────────────────────

/// Place each layer left to right, no closer than `nodesep`, as near to the
/// desired offsets as the order allows.
fn pack_layer(layer: &[usize], desired: &[f64], breadth: &[f64], sep: f64, x: &mut [f64]) {
    let mut prev: Option<usize> = None;
    for (i, &v) in layer.iter().enumerate() {
        x[v] = match prev {
            Some(p) => desired[i].max(x[p] + (breadth[p] + breadth[v]) / 2.0 + sep),
            None => desired[i],
        };
        prev = Some(v);
    }
    // Packing only pushes right; recentre on the requested positions.
    let shift = layer
        .iter()
        .enumerate()
        .map(|(i, &v)| desired[i] - x[v])
        .sum::<f64>()
        / layer.len().max(1) as f64;
    for &v in layer {
        x[v] += shift;
    }
}

fn assign_offsets(aug: &Augmented, adj: &Adjacency, ordering: &[Vec<usize>], sep: f64) -> Vec<f64> {
    let mut x = vec![0.0f64; aug.layers.len()];

    for layer in ordering {
        let span: f64 = layer.iter().map(|&v| aug.breadth[v]).sum::<f64>()
            + sep * layer.len().saturating_sub(1) as f64;
        let mut cursor = -span / 2.0;
        for &v in layer {
            x[v] = cursor + aug.breadth[v] / 2.0;
            cursor += aug.breadth[v] + sep;
        }
    }

    let desired_for = |layer: &[usize], neighbors: &Vec<Vec<usize>>, x: &[f64]| -> Vec<f64> {
        layer
            .iter()
            .map(|&v| {
                let bc = barycenter(&neighbors[v], x);
                if bc.is_finite() { bc } else { x[v] }
            })
            .collect()
    };

    for _ in 0..PACKING_PASSES {
        for l in 1..ordering.len() {
            let desired = desired_for(&ordering[l], &adj.pred, &x);
            pack_layer(&ordering[l], &desired, &aug.breadth, sep, &mut x);
        }
        for l in (0..ordering.len().saturating_sub(1)).rev() {
            let desired = desired_for(&ordering[l], &adj.succ, &x);
            pack_layer(&ordering[l], &desired, &aug.breadth, sep, &mut x);
        }
    }
    x
}

fn assign_ranks(aug: &Augmented, ordering: &[Vec<usize>], ranksep: f64) -> Vec<f64> {
    let mut r = vec![0.0f64; aug.layers.len()];
    let mut cursor = 0.0;
    for layer in ordering {
        let depth = layer.iter().map(|&v| aug.depth[v]).fold(0.0, f64::max);
        for &v in layer {
            r[v] = cursor + depth / 2.0;
        }
        cursor += depth + ranksep;
    }
    r
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

pub fn layered(input: &LayoutInput) -> Placement {
    let n = input.nodes.len();
    if n == 0 {
        return Placement::default();
    }

    let edges: Vec<(usize, usize)> = input.edges.iter().map(|e| (e.tail, e.head)).collect();
    let dag = remove_cycles(n, &edges);
    let layers = assign_layers(n, &dag);
    let aug = insert_virtual_nodes(input, &dag, layers);
    let adj = Adjacency::new(aug.layers.len(), &aug.segments);

    let ordering = minimise_crossings(&aug, &adj);
    let offsets = assign_offsets(&aug, &adj, &ordering, input.nodesep);
    let ranks = assign_ranks(&aug, &ordering, input.ranksep);

    let point = |v: usize| -> Point {
        let (o, r) = (offsets[v], ranks[v]);
        match input.rankdir {
            RankDir::TB => Point::new(o, -r),
            RankDir::BT => Point::new(o, r),
            RankDir::LR => Point::new(r, -o),
            RankDir::RL => Point::new(-r, -o),
        }
    };

    let mut routes: Vec<Option<Vec<Point>>> = vec![None; input.edges.len()];
    for chain in &aug.chains {
        let mut pts: Vec<Point> = chain.nodes.iter().map(|&v| point(v)).collect();
        if chain.reversed {
            pts.reverse();
        }
        routes[chain.edge] = Some(pts);
    }

    Placement {
        centers: (0..n).map(point).collect(),
        routes,
    }
}

//! Force-directed layouts.
//!
//! `neato` minimises layout stress against graph-theoretic distances; `fdp`
//! runs a Fruchterman-Reingold spring simulation. Both start from the same
//! deterministic circular placement so repeated runs agree.

use std::f64::consts::TAU;

use super::{LayoutEngine, LayoutInput, Placement, Point};

const STRESS_ITERATIONS: usize = 200;
const STRESS_EPSILON: f64 = 1e-4;
const SPRING_ITERATIONS: usize = 300;

pub struct NeatoLayout;

impl LayoutEngine for NeatoLayout {
    fn place(&self, input: &LayoutInput) -> Placement {
        Placement::straight(stress_majorization(input))
    }

    fn drops_isolated(&self) -> bool {
        true
    }
}

pub struct FdpLayout;

impl LayoutEngine for FdpLayout {
    fn place(&self, input: &LayoutInput) -> Placement {
        Placement::straight(spring_embedding(input))
    }

    fn drops_isolated(&self) -> bool {
        true
    }
}

fn initial_circle(n: usize, radius: f64) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let a = TAU * i as f64 / n as f64;
            Point::new(radius * a.cos(), radius * a.sin())
        })
        .collect()
}

/// All-pairs shortest path lengths over the undirected edge set.
fn shortest_paths(input: &LayoutInput) -> Vec<Vec<f64>> {
    let n = input.nodes.len();
    let mut d = vec![vec![f64::INFINITY; n]; n];
    for (i, row) in d.iter_mut().enumerate() {
        row[i] = 0.0;
    }
    for e in &input.edges {
        if e.tail != e.head {
            let len = d[e.tail][e.head].min(e.len);
            d[e.tail][e.head] = len;
            d[e.head][e.tail] = len;
        }
    }
    for k in 0..n {
        for i in 0..n {
            if d[i][k].is_infinite() {
                continue;
            }
            for j in 0..n {
                let via = d[i][k] + d[k][j];
                if via < d[i][j] {
                    d[i][j] = via;
                }
            }
        }
    }

    // Keep separate components apart by a little more than the longest path.
    let longest = d
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max);
    let mean_len = if input.edges.is_empty() {
        72.0
    } else {
        input.edges.iter().map(|e| e.len).sum::<f64>() / input.edges.len() as f64
    };
    for v in d.iter_mut().flatten() {
        if v.is_infinite() {
            *v = longest + mean_len;
        }
    }
    d
}

fn stress_majorization(input: &LayoutInput) -> Vec<Point> {
    let n = input.nodes.len();
    if n <= 1 {
        return vec![Point::default(); n];
    }

    let d = shortest_paths(input);
    let diameter = d.iter().flatten().copied().fold(0.0, f64::max);
    let mut pos = initial_circle(n, diameter.max(72.0) / 2.0);

    for _ in 0..STRESS_ITERATIONS {
        let mut moved = 0.0f64;
        for i in 0..n {
            let (mut sx, mut sy, mut sw) = (0.0, 0.0, 0.0);
            for j in 0..n {
                if i == j || d[i][j] <= 0.0 {
                    continue;
                }
                let w = 1.0 / (d[i][j] * d[i][j]);
                let dist = pos[i].distance(pos[j]).max(1e-6);
                sx += w * (pos[j].x + d[i][j] * (pos[i].x - pos[j].x) / dist);
                sy += w * (pos[j].y + d[i][j] * (pos[i].y - pos[j].y) / dist);
                sw += w;
            }
            if sw > 0.0 {
                let next = Point::new(sx / sw, sy / sw);
                moved = moved.max(next.distance(pos[i]));
                pos[i] = next;
            }
        }
        if moved < STRESS_EPSILON * diameter.max(1.0) {
            break;
        }
    }
    pos
}

fn spring_embedding(input: &LayoutInput) -> Vec<Point> {
    let n = input.nodes.len();
    if n <= 1 {
        return vec![Point::default(); n];
    }

    let mean_size = input
        .nodes
        .iter()
        .map(|v| v.width.max(v.height))
        .sum::<f64>()
        / n as f64;
    let k = mean_size + 18.0;
    let mut pos = initial_circle(n, k * (n as f64).sqrt() / 2.0);
    let mut temperature = k * 2.0;
    let cooling = temperature / SPRING_ITERATIONS as f64;

    for _ in 0..SPRING_ITERATIONS {
        let mut disp = vec![Point::default(); n];

        for i in 0..n {
            for j in i + 1..n {
                let (mut dx, mut dy) = (pos[i].x - pos[j].x, pos[i].y - pos[j].y);
                if dx.abs() < 1e-6 && dy.abs() < 1e-6 {
                    // Coincident nodes: push apart along a fixed direction.
                    dx = 0.01 * (i + 1) as f64;
                    dy = 0.01 * (j + 1) as f64;
                }
                let dist = dx.hypot(dy);
                let force = k * k / dist;
                disp[i].x += dx / dist * force;
                disp[i].y += dy / dist * force;
                disp[j].x -= dx / dist * force;
                disp[j].y -= dy / dist * force;
            }
        }

        for e in &input.edges {
            if e.tail == e.head {
                continue;
            }
            let (t, h) = (e.tail, e.head);
            let (dx, dy) = (pos[t].x - pos[h].x, pos[t].y - pos[h].y);
            let dist = dx.hypot(dy).max(1e-6);
            let force = dist * dist / k;
            disp[t].x -= dx / dist * force;
            disp[t].y -= dy / dist * force;
            disp[h].x += dx / dist * force;
            disp[h].y += dy / dist * force;
        }

        for (p, d) in pos.iter_mut().zip(&disp) {
            let len = d.x.hypot(d.y);
            if len > 0.0 {
                let step = len.min(temperature);
                p.x += d.x / len * step;
                p.y += d.y / len * step;
            }
        }
        temperature = (temperature - cooling).max(0.5);
    }
    pos
}

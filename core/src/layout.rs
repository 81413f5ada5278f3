//! Force-directed layout.
//!
//! The force model itself (charge repulsion between every pair, springs
//! along edges, damping) comes from the `force_graph` crate. This module
//! seeds the starting positions, runs the simulation for a fixed budget
//! or until it settles, and rescales the result into [-scale, scale].

use crate::{graph::DealGraph, rng::LayoutRng, types::EntityId};
use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// (x, y) in layout space.
pub type Position = (f64, f64);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    /// Upper bound on simulation steps.
    pub iterations: usize,
    pub time_step: f32,
    /// Stop early once no node moves further than this in one step.
    pub tolerance: f64,
    /// Half-width of the square starting positions are drawn from.
    pub initial_spread: f32,
    /// Output coordinates fall in [-scale, scale].
    pub scale: f64,
    pub node_mass: f32,
    pub force_charge: f32,
    pub force_spring: f32,
    pub force_max: f32,
    pub node_speed: f32,
    pub damping_factor: f32,
    pub seed: Option<u64>,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            iterations:     500,
            time_step:      0.016,
            tolerance:      0.01,
            initial_spread: 100.0,
            scale:          1.0,
            node_mass:      10.0,
            force_charge:   150.0,
            force_spring:   0.05,
            force_max:      100.0,
            node_speed:     3000.0,
            damping_factor: 0.9,
            seed:           None,
        }
    }
}

/// Node id → position, plus the seed that produced it.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    positions: HashMap<EntityId, Position>,
    seed: u64,
    steps: usize,
}

impl Layout {
    pub fn position(&self, id: &str) -> Option<Position> {
        self.positions.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Simulation steps actually run.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Position)> + '_ {
        self.positions.iter().map(|(id, p)| (id.as_str(), *p))
    }
}

pub fn spring_layout(graph: &DealGraph, params: &LayoutParams) -> Layout {
    let mut rng = LayoutRng::from_seed(params.seed);
    let seed = rng.seed();
    let ids: Vec<&str> = graph.nodes().map(|n| n.id.as_str()).collect();
    if ids.is_empty() {
        return Layout { positions: HashMap::new(), seed, steps: 0 };
    }

    let mut sim: ForceGraph<usize, ()> = ForceGraph::new(SimulationParameters {
        force_charge:   params.force_charge,
        force_spring:   params.force_spring,
        force_max:      params.force_max,
        node_speed:     params.node_speed,
        damping_factor: params.damping_factor,
    });

    let handles: Vec<DefaultNodeIdx> = (0..ids.len())
        .map(|i| {
            let (x, y) = rng.point_in_square(params.initial_spread);
            sim.add_node(NodeData {
                x,
                y,
                mass: params.node_mass,
                is_anchor: false,
                user_data: i,
            })
        })
        .collect();

    // One spring per unordered pair; self-loops exert no force.
    let mut springs = HashSet::new();
    for (s, t) in graph.index_pairs() {
        if s != t && springs.insert((s.min(t), s.max(t))) {
            sim.add_edge(handles[s], handles[t], EdgeData::default());
        }
    }

    let mut current = snapshot(&sim, ids.len());
    let mut steps = 0;
    while steps < params.iterations {
        sim.update(params.time_step);
        steps += 1;
        let next = snapshot(&sim, ids.len());
        let moved = current
            .iter()
            .zip(&next)
            .map(|(a, b)| (a.0 - b.0).hypot(a.1 - b.1))
            .fold(0.0, f64::max);
        current = next;
        if moved < params.tolerance {
            break;
        }
    }
    log::info!("layout: {} nodes, {steps} steps, seed {seed}", ids.len());

    let positions = ids
        .into_iter()
        .map(String::from)
        .zip(rescale(current, params.scale))
        .collect();
    Layout { positions, seed, steps }
}

fn snapshot(sim: &ForceGraph<usize, ()>, n: usize) -> Vec<Position> {
    let mut out = vec![(0.0, 0.0); n];
    sim.visit_nodes(|node| {
        out[node.data.user_data] = (node.x() as f64, node.y() as f64);
    });
    out
}

/// Centre on the mean, then scale so the largest coordinate is `scale`.
fn rescale(mut points: Vec<Position>, scale: f64) -> Vec<Position> {
    for p in points.iter_mut() {
        if !p.0.is_finite() || !p.1.is_finite() {
            *p = (0.0, 0.0);
        }
    }
    let n = points.len() as f64;
    let (mx, my) = points.iter().fold((0.0, 0.0), |acc, p| (acc.0 + p.0 / n, acc.1 + p.1 / n));
    let extent = points
        .iter()
        .map(|p| (p.0 - mx).abs().max((p.1 - my).abs()))
        .fold(0.0, f64::max);
    let factor = if extent > 0.0 { scale / extent } else { 0.0 };
    points
        .into_iter()
        .map(|p| ((p.0 - mx) * factor, (p.1 - my) * factor))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DuplicateEdges;

    fn triangle() -> DealGraph {
        let mut g = DealGraph::new(true);
        for (a, b) in [("A", "B"), ("B", "C"), ("A", "C")] {
            g.insert_edge(a.into(), b.into(), Default::default(), DuplicateEdges::Overwrite);
        }
        g
    }

    fn seeded(seed: u64) -> LayoutParams {
        LayoutParams { seed: Some(seed), iterations: 200, ..Default::default() }
    }

    #[test]
    fn every_node_gets_a_bounded_position() {
        let layout = spring_layout(&triangle(), &seeded(1));
        assert_eq!(layout.len(), 3);
        for (_, (x, y)) in layout.iter() {
            assert!(x.abs() <= 1.0 + 1e-9 && y.abs() <= 1.0 + 1e-9, "({x}, {y}) out of bounds");
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let a = spring_layout(&triangle(), &seeded(42));
        let b = spring_layout(&triangle(), &seeded(42));
        for id in ["A", "B", "C"] {
            assert_eq!(a.position(id), b.position(id));
        }
        assert_eq!(a.seed(), 42);
    }

    #[test]
    fn empty_graph_gives_empty_layout() {
        let layout = spring_layout(&DealGraph::new(true), &seeded(3));
        assert!(layout.is_empty());
    }

    #[test]
    fn lone_self_loop_sits_at_origin() {
        let mut g = DealGraph::new(false);
        g.insert_edge("A".into(), "A".into(), Default::default(), DuplicateEdges::Overwrite);
        let layout = spring_layout(&g, &seeded(9));
        assert_eq!(layout.position("A"), Some((0.0, 0.0)));
    }

    #[test]
    fn rescale_centres_and_bounds() {
        let out = rescale(vec![(10.0, 0.0), (30.0, 0.0), (20.0, 5.0)], 2.0);
        let max = out.iter().map(|p| p.0.abs().max(p.1.abs())).fold(0.0, f64::max);
        assert!((max - 2.0).abs() < 1e-9);
    }
}

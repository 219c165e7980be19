//! Route manipulation utilities for evolutionary search.
//!
//! Provides random initialization, crossover with link repair, and mutation.

use std::collections::{HashMap, HashSet};

use rand::prelude::*;

use crate::compute::NavGraph;
use crate::schema::{Representation, Route, WaypointId};

/// Random number generator wrapper for route operations.
pub struct RouteRng {
    rng: StdRng,
}

impl RouteRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform value in [0, 1).
    #[inline]
    pub fn unit(&mut self) -> f32 {
        self.rng.r#gen::<f32>()
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Generate a random route for the given representation.
    pub fn random_route(
        &mut self,
        graph: &NavGraph,
        start: WaypointId,
        goal: WaypointId,
        representation: Representation,
        max_walk_steps: Option<usize>,
    ) -> Route {
        match representation {
            Representation::VariableLength => {
                Route::new(self.random_walk(graph, start, goal, max_walk_steps))
            }
            Representation::FixedLength { chromosome_length } => {
                self.fixed_length_route(graph, start, goal, chromosome_length)
            }
        }
    }

    /// Cycle-free random walk from `start` that stops at `goal`, at a dead
    /// end, or after `max_steps` moves.
    pub fn random_walk(
        &mut self,
        graph: &NavGraph,
        start: WaypointId,
        goal: WaypointId,
        max_steps: Option<usize>,
    ) -> Vec<WaypointId> {
        let limit = max_steps.unwrap_or(usize::MAX);
        let mut genes = vec![start];
        let mut visited = HashSet::from([start]);
        let mut current = start;

        while current != goal && genes.len() <= limit {
            let unvisited: Vec<WaypointId> = graph
                .neighbors(current)
                .iter()
                .copied()
                .filter(|id| !visited.contains(id))
                .collect();

            let Some(&next) = unvisited.choose(&mut self.rng) else {
                log::trace!("No unvisited links available for point {current}, terminating walk");
                break;
            };

            genes.push(next);
            visited.insert(next);
            current = next;
        }

        genes
    }

    /// Walk for the first genes, pad by wandering the graph, and pin the
    /// final gene to the goal.
    fn fixed_length_route(
        &mut self,
        graph: &NavGraph,
        start: WaypointId,
        goal: WaypointId,
        length: usize,
    ) -> Route {
        let mut genes = self.random_walk(graph, start, goal, Some(length.saturating_sub(1)));
        genes.truncate(length);

        while genes.len() < length {
            let last = genes[genes.len() - 1];
            let next = match graph.neighbors(last).choose(&mut self.rng) {
                Some(&id) => id,
                None => match graph.waypoint_ids().choose(&mut self.rng) {
                    Some(&id) => id,
                    None => last,
                },
            };
            genes.push(next);
        }

        if length > 1 {
            genes[length - 1] = goal;
        }
        Route::new(genes)
    }

    /// Single-point crossover followed by link repair.
    ///
    /// The child takes `parent1` up to a random point and `parent2` after it,
    /// so its length equals `parent2`'s (or 2 when `parent2` is a single
    /// waypoint). Broken links are patched by
    /// replacing the second waypoint with a random neighbor of the first; the
    /// first and last genes are then pinned to `parent1`'s start and
    /// `parent2`'s end. Returns an empty route if either parent is empty.
    pub fn crossover(&mut self, graph: &NavGraph, parent1: &Route, parent2: &Route) -> Route {
        let (Some(start), Some(end)) = (parent1.first(), parent2.last()) else {
            log::trace!("One of the parents has an empty path");
            return Route::default();
        };

        let cut = self.index(parent1.len().min(parent2.len()));
        let mut genes = Vec::with_capacity(parent2.len());
        genes.extend_from_slice(&parent1.as_slice()[..cut]);
        genes.extend_from_slice(&parent2.as_slice()[cut..]);

        self.repair(graph, &mut genes);

        genes[0] = start;
        if genes.len() < 2 {
            // Single-waypoint parent2: keep the start and append its end
            genes.push(end);
        } else {
            let last = genes.len() - 1;
            genes[last] = end;
        }

        Route::new(genes)
    }

    /// Replace the second waypoint of every unlinked pair with a random
    /// neighbor of the first. Pairs whose first waypoint has no neighbors
    /// are left broken. Returns the number of patched links.
    pub fn repair(&mut self, graph: &NavGraph, genes: &mut [WaypointId]) -> usize {
        let mut repaired = 0;
        for i in 0..genes.len().saturating_sub(1) {
            let (a, b) = (genes[i], genes[i + 1]);
            if graph.is_linked(a, b) {
                continue;
            }
            if let Some(&replacement) = graph.neighbors(a).choose(&mut self.rng) {
                log::trace!("Invalid link between {a} and {b}, replaced with {replacement}");
                genes[i + 1] = replacement;
                repaired += 1;
            }
        }
        repaired
    }

    /// Mutate interior genes with independent probability `rate`.
    ///
    /// Variable-length routes draw the replacement from the predecessor's
    /// neighbors; fixed-length routes draw any waypoint in the graph. Genes
    /// with no candidates are skipped. The first and last genes never change.
    /// Returns the number of mutated genes.
    pub fn mutate(
        &mut self,
        graph: &NavGraph,
        route: &mut Route,
        rate: f32,
        representation: Representation,
    ) -> usize {
        let genes = route.genes_mut();
        if genes.len() <= 2 {
            return 0;
        }

        let mut mutated = 0;
        for i in 1..genes.len() - 1 {
            if self.unit() >= rate {
                continue;
            }
            let candidates = match representation {
                Representation::VariableLength => graph.neighbors(genes[i - 1]),
                Representation::FixedLength { .. } => graph.waypoint_ids(),
            };
            if let Some(&replacement) = candidates.choose(&mut self.rng) {
                log::trace!("Mutated gene {i}: {} -> {replacement}", genes[i]);
                genes[i] = replacement;
                mutated += 1;
            }
        }
        mutated
    }
}

/// Splice out loops: whenever a waypoint appears again later in the route,
/// everything between the two visits is dropped.
///
/// Every kept pair was already consecutive, so no new broken links appear
/// and length never grows. The first and last genes are preserved.
pub fn remove_loops(route: &mut Route) -> usize {
    let genes = route.genes_mut();
    if genes.len() < 2 {
        return 0;
    }

    let mut last_seen: HashMap<WaypointId, usize> = HashMap::with_capacity(genes.len());
    for (i, &id) in genes.iter().enumerate() {
        last_seen.insert(id, i);
    }

    let original = genes.len();
    let mut kept = Vec::with_capacity(original);
    let mut i = 0;
    while i < original {
        let id = genes[i];
        kept.push(id);
        i = last_seen[&id] + 1;
    }

    *genes = kept;
    original - genes.len()
}

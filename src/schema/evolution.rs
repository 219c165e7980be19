//! Progress and result types for the genetic route search.
//!
//! These types are plain data so that hosts can log them, plot them, or
//! hand the best route to a path follower.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Point3, WaypointId};

// ============================================================================
// Route Representation
// ============================================================================

/// Chromosome: an ordered sequence of waypoint ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route {
    waypoints: Vec<WaypointId>,
}

impl Route {
    /// Wrap an ordered list of waypoint ids.
    pub fn new(waypoints: Vec<WaypointId>) -> Self {
        Self { waypoints }
    }

    /// First waypoint (the start, for engine-produced routes).
    #[inline]
    pub fn first(&self) -> Option<WaypointId> {
        self.waypoints.first().copied()
    }

    /// Last waypoint.
    #[inline]
    pub fn last(&self) -> Option<WaypointId> {
        self.waypoints.last().copied()
    }

    /// Number of waypoints.
    #[inline]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Whether the route has no waypoints.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Waypoint ids in order.
    #[inline]
    pub fn as_slice(&self) -> &[WaypointId] {
        &self.waypoints
    }

    /// Consecutive waypoint pairs.
    pub fn links(&self) -> impl Iterator<Item = (WaypointId, WaypointId)> + '_ {
        self.waypoints.windows(2).map(|w| (w[0], w[1]))
    }

    pub(crate) fn genes_mut(&mut self) -> &mut Vec<WaypointId> {
        &mut self.waypoints
    }

    /// Unwrap into the waypoint id list.
    pub fn into_inner(self) -> Vec<WaypointId> {
        self.waypoints
    }
}

impl From<Vec<WaypointId>> for Route {
    fn from(waypoints: Vec<WaypointId>) -> Self {
        Self::new(waypoints)
    }
}

impl fmt::Display for Route {
    /// Formats as `0 -> 3 -> 7`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.waypoints.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{id}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Progress and Result Types
// ============================================================================

/// Progress update emitted after every evaluated generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchProgress {
    /// Index of the generation just evaluated (0 = initial population).
    pub generation: usize,
    /// Configured generation limit.
    pub max_generations: usize,
    /// Number of individuals in the evaluated population.
    pub population_size: usize,
    /// Best fitness seen over the whole run.
    pub best_fitness: f32,
    /// Best fitness in this generation.
    pub generation_best: f32,
    /// Average fitness of this generation.
    pub avg_fitness: f32,
    /// Consecutive generations without a change in best fitness.
    pub stagnation_count: usize,
    /// Best route of this generation.
    pub best_path: Option<PathSnapshot>,
    /// Current phase of the search.
    pub phase: SearchPhase,
}

/// A route copied out of the population.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathSnapshot {
    /// Ordered waypoint ids, starting at the start waypoint.
    pub route: Route,
    /// Final fitness.
    pub fitness: f32,
    /// Sum of segment lengths.
    pub length: f32,
    /// Distance from the last waypoint to the goal.
    pub goal_distance: f32,
    /// Consecutive pairs that are linked in the graph.
    pub valid_links: usize,
    /// Number of consecutive pairs.
    pub total_links: usize,
    /// Whether the last waypoint is the goal.
    pub reaches_goal: bool,
    /// Generation this route was created.
    pub generation: usize,
}

impl PathSnapshot {
    /// True when every consecutive pair is linked and the goal is reached.
    pub fn is_complete(&self) -> bool {
        self.reaches_goal && self.valid_links == self.total_links
    }
}

/// Per-generation statistics for plotting.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SearchHistory {
    /// Best fitness per generation.
    pub best_fitness: Vec<f32>,
    /// Average fitness per generation.
    pub avg_fitness: Vec<f32>,
    /// Standard deviation per generation.
    pub fitness_std: Vec<f32>,
    /// Distinct waypoint sequences per generation.
    pub distinct_routes: Vec<usize>,
}

/// Phase of the search state machine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SearchPhase {
    /// Population is being created.
    #[default]
    Initializing,
    /// Generations are being evaluated and bred.
    Evaluating,
    /// A stop condition fired.
    Terminated,
}

/// Reason the search stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Best fitness reached the configured target.
    Converged,
    /// Best fitness did not change for `stagnation_limit` generations.
    Stagnated,
    /// `max_generations` generations were evaluated.
    GenerationLimitReached,
    /// The cancel handle was set.
    Cancelled,
}

/// Statistics from a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchStats {
    /// Number of evaluated generations (including the initial population).
    pub generations: usize,
    /// Total fitness evaluations performed.
    pub total_evaluations: u64,
    /// Best fitness achieved.
    pub best_fitness: f32,
    /// Average fitness of the final population.
    pub final_avg_fitness: f32,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}

/// Final result of a search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Best route found during the run.
    pub best: PathSnapshot,
    /// Positions along the best route, in order.
    pub polyline: Vec<Point3>,
    /// Statistics from the run.
    pub stats: SearchStats,
    /// Full history for analysis.
    pub history: SearchHistory,
}

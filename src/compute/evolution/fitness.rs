//! Fitness scoring for candidate routes.
//!
//! A route is scored from three measurements:
//!
//! - **Length**: sum of Euclidean segment lengths.
//! - **Goal distance**: distance from the last waypoint to the goal, which
//!   penalizes walks that dead-ended before arriving.
//! - **Validity**: fraction of consecutive pairs that are linked in the
//!   graph, which penalizes links broken by recombination or mutation.
//!
//! These combine into a single reciprocal score for both chromosome
//! representations:
//!
//! ```text
//! fitness = scale * validity / (length + goal_distance + epsilon)
//! ```
//!
//! Shorter, closer and more valid routes always score higher. Routes with
//! fewer than two waypoints score exactly zero.

use crate::compute::NavGraph;
use crate::schema::{FitnessConfig, Point3, Route, WaypointId};

/// Measurements taken from a route.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PathMetrics {
    /// Sum of segment lengths.
    pub length: f32,
    /// Distance from the last waypoint to the goal.
    pub goal_distance: f32,
    /// Consecutive pairs linked in the graph.
    pub valid_links: usize,
    /// Number of consecutive pairs.
    pub total_links: usize,
    /// Whether the route ends on the goal waypoint.
    pub reaches_goal: bool,
}

impl PathMetrics {
    /// Fraction of linked consecutive pairs (0 for routes without pairs).
    pub fn validity(&self) -> f32 {
        if self.total_links == 0 {
            0.0
        } else {
            self.valid_links as f32 / self.total_links as f32
        }
    }
}

/// Scores routes against a fixed goal.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    config: FitnessConfig,
    goal: WaypointId,
    goal_position: Point3,
}

impl FitnessEvaluator {
    /// Create a new fitness evaluator.
    pub fn new(config: FitnessConfig, goal: WaypointId, goal_position: Point3) -> Self {
        Self {
            config,
            goal,
            goal_position,
        }
    }

    /// Evaluate a route and return its fitness and measurements.
    pub fn evaluate(&self, graph: &NavGraph, route: &Route) -> (f32, PathMetrics) {
        match self.measure(graph, route) {
            Some(metrics) => (self.score(&metrics), metrics),
            // References a waypoint outside the graph
            None => (0.0, PathMetrics::default()),
        }
    }

    /// Take measurements, or `None` if the route uses unknown waypoints.
    pub fn measure(&self, graph: &NavGraph, route: &Route) -> Option<PathMetrics> {
        let mut metrics = PathMetrics::default();

        for (a, b) in route.links() {
            metrics.length += graph.distance(a, b)?;
            metrics.total_links += 1;
            if graph.is_linked(a, b) {
                metrics.valid_links += 1;
            }
        }

        if let Some(last) = route.last() {
            metrics.goal_distance = graph.position(last)?.distance(&self.goal_position);
            metrics.reaches_goal = last == self.goal;
        }

        Some(metrics)
    }

    /// Combine measurements into a fitness value.
    pub fn score(&self, metrics: &PathMetrics) -> f32 {
        if metrics.total_links == 0 {
            return 0.0;
        }
        let denominator = (metrics.length + metrics.goal_distance).max(0.0) + self.config.epsilon;
        self.config.scale * metrics.validity() / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Waypoint;

    /// Unit square: 0 (0,0) - 1 (1,0) - 2 (1,1) - 3 (0,1), goal is 2.
    fn square() -> NavGraph {
        let waypoints = vec![
            Waypoint::new(0, [0.0, 0.0, 0.0]),
            Waypoint::new(1, [1.0, 0.0, 0.0]),
            Waypoint::new(2, [1.0, 1.0, 0.0]),
            Waypoint::new(3, [0.0, 1.0, 0.0]),
        ];
        NavGraph::from_links(&waypoints, &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]).unwrap()
    }

    fn evaluator(graph: &NavGraph) -> FitnessEvaluator {
        FitnessEvaluator::new(FitnessConfig::default(), 2, *graph.position(2).unwrap())
    }

    #[test]
    fn test_short_routes_score_zero() {
        let graph = square();
        let eval = evaluator(&graph);
        assert_eq!(eval.evaluate(&graph, &Route::default()).0, 0.0);
        assert_eq!(eval.evaluate(&graph, &Route::new(vec![0])).0, 0.0);
        assert_eq!(eval.evaluate(&graph, &Route::new(vec![2])).0, 0.0);
    }

    #[test]
    fn test_measurements() {
        let graph = square();
        let eval = evaluator(&graph);
        let (_, metrics) = eval.evaluate(&graph, &Route::new(vec![0, 1, 2]));
        assert!((metrics.length - 2.0).abs() < 1e-6);
        assert_eq!(metrics.goal_distance, 0.0);
        assert_eq!(metrics.valid_links, 2);
        assert_eq!(metrics.total_links, 2);
        assert!(metrics.reaches_goal);
    }

    #[test]
    fn test_shorter_route_scores_higher() {
        let graph = square();
        let eval = evaluator(&graph);
        let direct = eval.evaluate(&graph, &Route::new(vec![0, 2])).0;
        let detour = eval.evaluate(&graph, &Route::new(vec![0, 1, 2])).0;
        assert!(direct > detour);
        assert!(detour > 0.0);
    }

    #[test]
    fn test_unreached_goal_penalized() {
        let graph = square();
        let eval = evaluator(&graph);
        let (stuck, metrics) = eval.evaluate(&graph, &Route::new(vec![0, 1]));
        assert!(!metrics.reaches_goal);
        assert!((metrics.goal_distance - 1.0).abs() < 1e-6);
        // Same total of length + remaining distance as the detour, so equal score
        let detour = eval.evaluate(&graph, &Route::new(vec![0, 1, 2])).0;
        assert!((stuck - detour).abs() < 1e-6);
        // Wandering back toward the start is worse
        let away = eval.evaluate(&graph, &Route::new(vec![0, 3, 0])).0;
        assert!(stuck > away);
    }

    #[test]
    fn test_invalid_links_penalized() {
        let graph = square();
        let eval = evaluator(&graph);
        // 1 -> 3 is not linked
        let (broken, metrics) = eval.evaluate(&graph, &Route::new(vec![0, 1, 3, 2]));
        assert_eq!(metrics.valid_links, 2);
        assert_eq!(metrics.total_links, 3);
        let valid = eval.evaluate(&graph, &Route::new(vec![0, 1, 2])).0;
        assert!(broken < valid);

        let (none_valid, _) = eval.evaluate(&graph, &Route::new(vec![1, 3]));
        assert_eq!(none_valid, 0.0);
    }

    #[test]
    fn test_unknown_waypoint_scores_zero() {
        let graph = square();
        let eval = evaluator(&graph);
        assert_eq!(eval.evaluate(&graph, &Route::new(vec![0, 99, 2])).0, 0.0);
    }

    #[test]
    fn test_zero_length_route_is_finite() {
        let graph = square();
        let eval = FitnessEvaluator::new(FitnessConfig::default(), 0, Point3::default());
        // Not linked (self-loop), so validity is 0 rather than infinite fitness
        let (fitness, _) = eval.evaluate(&graph, &Route::new(vec![0, 0]));
        assert!(fitness.is_finite());
        assert_eq!(fitness, 0.0);
    }
}

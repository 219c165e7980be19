//! Generational search loop for route discovery.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use crate::compute::{GraphError, LineOfSight, NavGraph, build_graph};
use crate::schema::{
    ConfigError, PathSnapshot, Representation, Route, Scenario, SearchConfig, SearchHistory,
    SearchPhase, SearchProgress, SearchResult, SearchStats, StopReason, WaypointId,
};

use super::fitness::{FitnessEvaluator, PathMetrics};
use super::genome::{RouteRng, remove_loops};
use super::selection::Selector;

/// A candidate individual in the population.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Unique identifier.
    pub id: u64,
    /// The chromosome.
    pub route: Route,
    /// Fitness score.
    pub fitness: f32,
    /// Measurements behind the fitness score.
    pub metrics: PathMetrics,
    /// Generation created.
    pub generation: usize,
    /// Parent IDs.
    pub parents: Vec<u64>,
}

impl Candidate {
    /// Convert to snapshot for serialization.
    pub fn to_snapshot(&self) -> PathSnapshot {
        PathSnapshot {
            route: self.route.clone(),
            fitness: self.fitness,
            length: self.metrics.length,
            goal_distance: self.metrics.goal_distance,
            valid_links: self.metrics.valid_links,
            total_links: self.metrics.total_links,
            reaches_goal: self.metrics.reaches_goal,
            generation: self.generation,
        }
    }
}

/// Errors detected before the search starts.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid search configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("The {role} waypoint {id} is not in the graph")]
    MissingWaypoint { role: &'static str, id: WaypointId },
    #[error("Failed to build waypoint graph: {0}")]
    Graph(#[from] GraphError),
}

/// Evolution engine that runs the search.
pub struct EvolutionEngine {
    config: SearchConfig,
    graph: Arc<NavGraph>,
    start: WaypointId,
    goal: WaypointId,
    rng: RouteRng,
    evaluator: FitnessEvaluator,
    population: Vec<Candidate>,
    history: SearchHistory,
    phase: SearchPhase,
    /// Index of the most recently evaluated generation.
    generation: usize,
    generations_evaluated: usize,
    total_evaluations: u64,
    best: Option<Candidate>,
    previous_best: Option<f32>,
    stagnation_count: usize,
    next_id: u64,
    cancelled: Arc<AtomicBool>,
}

impl EvolutionEngine {
    /// Create a new evolution engine.
    ///
    /// Fails if the configuration is invalid or if `start` or `goal` is not
    /// a waypoint of `graph`.
    pub fn new(
        config: SearchConfig,
        graph: impl Into<Arc<NavGraph>>,
        start: WaypointId,
        goal: WaypointId,
    ) -> Result<Self, SearchError> {
        config.validate()?;

        let graph = graph.into();
        if !graph.contains(start) {
            return Err(SearchError::MissingWaypoint { role: "start", id: start });
        }
        let Some(&goal_position) = graph.position(goal) else {
            return Err(SearchError::MissingWaypoint { role: "goal", id: goal });
        };

        let seed = config.random_seed.unwrap_or_else(rand::random);
        log::debug!("Search random seed: {seed}");
        let rng = RouteRng::new(seed);
        let evaluator = FitnessEvaluator::new(config.fitness.clone(), goal, goal_position);

        Ok(Self {
            config,
            graph,
            start,
            goal,
            rng,
            evaluator,
            population: Vec::new(),
            history: SearchHistory::default(),
            phase: SearchPhase::Initializing,
            generation: 0,
            generations_evaluated: 0,
            total_evaluations: 0,
            best: None,
            previous_best: None,
            stagnation_count: 0,
            next_id: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Build the graph from a scenario's obstacles and create an engine for
    /// its start, goal and configuration.
    pub fn from_scenario(scenario: &Scenario) -> Result<Self, SearchError> {
        let graph = build_graph(&scenario.waypoints, &LineOfSight::new(&scenario.obstacles))?;
        Self::new(scenario.config.clone(), graph, scenario.start, scenario.goal)
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// The graph being searched.
    pub fn graph(&self) -> &NavGraph {
        &self.graph
    }

    /// Current population, sorted by descending fitness after evaluation.
    pub fn population(&self) -> &[Candidate] {
        &self.population
    }

    /// Initialize the population with random walks from the start.
    pub fn initialize(&mut self) {
        self.population.clear();
        self.history = SearchHistory::default();
        self.phase = SearchPhase::Initializing;
        self.generation = 0;
        self.generations_evaluated = 0;
        self.total_evaluations = 0;
        self.best = None;
        self.previous_best = None;
        self.stagnation_count = 0;

        for _ in 0..self.config.population_size {
            let route = self.rng.random_route(
                &self.graph,
                self.start,
                self.goal,
                self.config.representation,
                self.config.max_walk_steps,
            );
            log::trace!("Initial route: {route}");
            let id = self.next_id();
            self.population.push(Candidate {
                id,
                route,
                fitness: 0.0,
                metrics: PathMetrics::default(),
                generation: 0,
                parents: Vec::new(),
            });
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Evaluate all candidates in the population.
    #[cfg(not(target_arch = "wasm32"))]
    fn evaluate_population(&mut self) {
        let graph = &*self.graph;
        let evaluator = &self.evaluator;

        self.population.par_iter_mut().for_each(|candidate| {
            let (fitness, metrics) = evaluator.evaluate(graph, &candidate.route);
            candidate.fitness = fitness;
            candidate.metrics = metrics;
        });
        self.total_evaluations += self.population.len() as u64;
    }

    #[cfg(target_arch = "wasm32")]
    fn evaluate_population(&mut self) {
        let graph = &*self.graph;
        let evaluator = &self.evaluator;

        for candidate in &mut self.population {
            let (fitness, metrics) = evaluator.evaluate(graph, &candidate.route);
            candidate.fitness = fitness;
            candidate.metrics = metrics;
        }
        self.total_evaluations += self.population.len() as u64;
    }

    /// Sort the evaluated population and update best, stagnation and history.
    fn rank_population(&mut self) {
        self.population
            .sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

        let gen_best = self.population[0].fitness;
        let tolerance = self.config.stagnation_tolerance;
        match self.previous_best {
            Some(previous) if (gen_best - previous).abs() <= tolerance => {
                self.stagnation_count += 1;
            }
            _ => self.stagnation_count = 0,
        }
        self.previous_best = Some(gen_best);

        if self.best.as_ref().is_none_or(|best| gen_best > best.fitness) {
            self.best = Some(self.population[0].clone());
        }

        let avg_fitness = self.average_fitness();
        let variance: f32 = self
            .population
            .iter()
            .map(|c| (c.fitness - avg_fitness).powi(2))
            .sum::<f32>()
            / self.population.len() as f32;
        let distinct: HashSet<&Route> = self.population.iter().map(|c| &c.route).collect();

        self.history.best_fitness.push(gen_best);
        self.history.avg_fitness.push(avg_fitness);
        self.history.fitness_std.push(variance.sqrt());
        self.history.distinct_routes.push(distinct.len());

        self.generations_evaluated += 1;
        log::debug!(
            "Generation {}: best = {:.5}, avg = {:.5}, distinct = {}, stagnation = {}",
            self.generation,
            gen_best,
            avg_fitness,
            distinct.len(),
            self.stagnation_count
        );
    }

    fn average_fitness(&self) -> f32 {
        if self.population.is_empty() {
            0.0
        } else {
            self.population.iter().map(|c| c.fitness).sum::<f32>() / self.population.len() as f32
        }
    }

    fn best_fitness(&self) -> f32 {
        self.best.as_ref().map_or(0.0, |c| c.fitness)
    }

    /// Check if the search should stop.
    fn should_stop(&self) -> Option<StopReason> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(StopReason::Cancelled);
        }

        if self.stagnation_count >= self.config.stagnation_limit {
            return Some(StopReason::Stagnated);
        }

        if let Some(target) = self.config.target_fitness
            && self.best_fitness() >= target
        {
            return Some(StopReason::Converged);
        }

        if self.generations_evaluated >= self.config.max_generations {
            return Some(StopReason::GenerationLimitReached);
        }

        None
    }

    /// Replace the ranked population with the next generation.
    fn breed(&mut self) {
        let size = self.config.population_size;
        let next_generation = self.generation + 1;
        let fitness: Vec<f32> = self.population.iter().map(|c| c.fitness).collect();
        let selector = Selector::new(&self.config.selection, &fitness);

        let mut next_gen = Vec::with_capacity(size);

        // Elites are copied, never aliased
        next_gen.extend(
            self.population
                .iter()
                .take(self.config.effective_elitism())
                .cloned(),
        );

        while next_gen.len() < size {
            let (idx1, idx2) = selector.select_pair(&mut self.rng);
            let parent1 = &self.population[idx1];
            let parent2 = &self.population[idx2];

            let mut route = if self.rng.unit() < self.config.crossover_rate {
                self.rng.crossover(&self.graph, &parent1.route, &parent2.route)
            } else {
                parent1.route.clone()
            };

            let mutated = self.rng.mutate(
                &self.graph,
                &mut route,
                self.config.mutation_rate,
                self.config.representation,
            );
            let spliced = match self.config.representation {
                Representation::VariableLength => remove_loops(&mut route),
                Representation::FixedLength { .. } => 0,
            };
            log::trace!(
                "Child of {} x {}: {route} ({mutated} mutated, {spliced} spliced)",
                parent1.id,
                parent2.id
            );

            let parents = vec![parent1.id, parent2.id];
            let id = self.next_id();
            next_gen.push(Candidate {
                id,
                route,
                fitness: 0.0,
                metrics: PathMetrics::default(),
                generation: next_generation,
                parents,
            });
        }

        self.population = next_gen;
        self.generation = next_generation;
    }

    /// Get current progress.
    pub fn progress(&self) -> SearchProgress {
        let generation_best = self
            .population
            .iter()
            .map(|c| c.fitness)
            .fold(0.0, f32::max);

        let best_path = self
            .population
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
            .map(Candidate::to_snapshot);

        SearchProgress {
            generation: self.generation,
            max_generations: self.config.max_generations,
            population_size: self.population.len(),
            best_fitness: self.best_fitness(),
            generation_best,
            avg_fitness: self.average_fitness(),
            stagnation_count: self.stagnation_count,
            best_path,
            phase: self.phase,
        }
    }

    /// Run the search, invoking `callback` after every evaluated generation.
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> SearchResult
    where
        F: FnMut(&SearchProgress),
    {
        let start_time = std::time::Instant::now();
        log::info!(
            "Starting route search from {} to {}: population {}, up to {} generations",
            self.start,
            self.goal,
            self.config.population_size,
            self.config.max_generations
        );

        self.initialize();
        self.phase = SearchPhase::Evaluating;

        let stop_reason = loop {
            self.evaluate_population();
            self.rank_population();
            callback(&self.progress());

            if let Some(reason) = self.should_stop() {
                break reason;
            }

            self.breed();
        };
        self.phase = SearchPhase::Terminated;

        let elapsed = start_time.elapsed().as_secs_f64();
        let best = self
            .best
            .as_ref()
            .map(Candidate::to_snapshot)
            .unwrap_or_default();
        let polyline = best
            .route
            .as_slice()
            .iter()
            .filter_map(|&id| self.graph.position(id).copied())
            .collect();

        log::info!(
            "Search stopped ({:?}) after {} generations: best fitness {:.5}, route {}",
            stop_reason,
            self.generations_evaluated,
            best.fitness,
            best.route
        );

        SearchResult {
            stats: SearchStats {
                generations: self.generations_evaluated,
                total_evaluations: self.total_evaluations,
                best_fitness: best.fitness,
                final_avg_fitness: self.average_fitness(),
                elapsed_seconds: elapsed,
                stop_reason,
            },
            best,
            polyline,
            history: self.history.clone(),
        }
    }

    /// Run the search (blocking).
    pub fn run(&mut self) -> SearchResult {
        self.run_with_callback(|_| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SelectionMethod, Waypoint};

    /// Start (0), Mid (1) and End (2), all linked.
    fn triangle() -> NavGraph {
        let waypoints = vec![
            Waypoint::new(0, [0.0, 0.0, 0.0]),
            Waypoint::new(1, [1.0, 1.0, 0.0]),
            Waypoint::new(2, [2.0, 0.0, 0.0]),
        ];
        NavGraph::from_links(&waypoints, &[(0, 1), (1, 2), (0, 2)]).unwrap()
    }

    /// 5 x 5 grid with 4-neighborhood links and diagonal shortcuts.
    fn grid() -> NavGraph {
        let waypoints: Vec<Waypoint> = (0..25)
            .map(|i| Waypoint::new(i, [(i % 5) as f32, (i / 5) as f32, 0.0]))
            .collect();
        let mut links = Vec::new();
        for i in 0..25 {
            let (x, y) = (i % 5, i / 5);
            if x + 1 < 5 {
                links.push((i, i + 1));
            }
            if y + 1 < 5 {
                links.push((i, i + 5));
            }
            if x + 1 < 5 && y + 1 < 5 {
                links.push((i, i + 6));
            }
        }
        NavGraph::from_links(&waypoints, &links).unwrap()
    }

    fn config(seed: u64) -> SearchConfig {
        SearchConfig {
            population_size: 16,
            mutation_rate: 0.2,
            max_generations: 60,
            stagnation_limit: 1000,
            random_seed: Some(seed),
            ..Default::default()
        }
    }

    #[test]
    fn test_engine_creation() {
        let mut engine = EvolutionEngine::new(config(1), grid(), 0, 24).unwrap();
        engine.initialize();
        assert_eq!(engine.population().len(), 16);
        assert!(engine.population().iter().all(|c| c.route.first() == Some(0)));
    }

    #[test]
    fn test_missing_endpoints_rejected() {
        let err = EvolutionEngine::new(config(1), grid(), 99, 24).err().unwrap();
        assert!(matches!(err, SearchError::MissingWaypoint { role: "start", id: 99 }));

        let err = EvolutionEngine::new(config(1), grid(), 0, 99).err().unwrap();
        assert!(matches!(err, SearchError::MissingWaypoint { role: "goal", id: 99 }));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SearchConfig {
            population_size: 0,
            ..Default::default()
        };
        let err = EvolutionEngine::new(config, grid(), 0, 24).err().unwrap();
        assert!(matches!(err, SearchError::Config(ConfigError::EmptyPopulation)));
    }

    #[test]
    fn test_prefers_direct_link() {
        let config = SearchConfig {
            population_size: 10,
            stagnation_limit: 10,
            random_seed: Some(42),
            ..Default::default()
        };
        let mut engine = EvolutionEngine::new(config, triangle(), 0, 2).unwrap();
        let result = engine.run();

        assert_eq!(result.best.route.as_slice(), &[0, 2]);
        assert!(result.best.is_complete());
        assert_eq!(result.stats.stop_reason, StopReason::Stagnated);
        assert_eq!(result.polyline.len(), 2);
    }

    #[test]
    fn test_population_size_constant() {
        let mut engine = EvolutionEngine::new(config(3), grid(), 0, 24).unwrap();
        let mut sizes = Vec::new();
        engine.run_with_callback(|progress| sizes.push(progress.population_size));
        assert!(!sizes.is_empty());
        assert!(sizes.iter().all(|&size| size == 16));
    }

    #[test]
    fn test_best_fitness_monotonic_with_elitism() {
        for selection in [
            SelectionMethod::RouletteWheel,
            SelectionMethod::RankBased,
            SelectionMethod::Tournament { size: 3 },
            SelectionMethod::UniformPairs,
        ] {
            let config = SearchConfig {
                elitism_count: 1,
                selection,
                ..config(5)
            };
            let mut engine = EvolutionEngine::new(config, grid(), 0, 24).unwrap();
            let result = engine.run();
            for pair in result.history.best_fitness.windows(2) {
                assert!(pair[1] >= pair[0], "{:?}", result.history.best_fitness);
            }
        }
    }

    #[test]
    fn test_seeded_runs_identical() {
        let run = || {
            let mut engine = EvolutionEngine::new(config(77), grid(), 0, 24).unwrap();
            engine.run()
        };
        let a = run();
        let b = run();
        assert_eq!(a.best, b.best);
        assert_eq!(a.history, b.history);
        assert_eq!(a.stats.generations, b.stats.generations);
    }

    #[test]
    fn test_generation_limit() {
        let config = SearchConfig {
            max_generations: 5,
            ..config(9)
        };
        let mut engine = EvolutionEngine::new(config, grid(), 0, 24).unwrap();
        let result = engine.run();
        assert_eq!(result.stats.generations, 5);
        assert_eq!(result.stats.total_evaluations, 5 * 16);
        assert_eq!(result.stats.stop_reason, StopReason::GenerationLimitReached);
        assert_eq!(result.history.best_fitness.len(), 5);
    }

    #[test]
    fn test_stagnation() {
        // A line admits a single route, so the best never changes
        let waypoints: Vec<Waypoint> = (0..3)
            .map(|i| Waypoint::new(i, [i as f32, 0.0, 0.0]))
            .collect();
        let graph = NavGraph::from_links(&waypoints, &[(0, 1), (1, 2)]).unwrap();
        let config = SearchConfig {
            stagnation_limit: 4,
            ..config(2)
        };
        let mut engine = EvolutionEngine::new(config, graph, 0, 2).unwrap();
        let result = engine.run();
        assert_eq!(result.stats.stop_reason, StopReason::Stagnated);
        assert_eq!(result.stats.generations, 5);
        assert_eq!(result.best.route.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_cancellation() {
        let mut engine = EvolutionEngine::new(config(4), grid(), 0, 24).unwrap();
        let cancel = engine.cancel_handle();

        // Cancel immediately
        cancel.store(true, Ordering::Relaxed);

        let result = engine.run();
        assert_eq!(result.stats.stop_reason, StopReason::Cancelled);
        assert_eq!(result.stats.generations, 1);
        assert_eq!(result.best.route.first(), Some(0));
    }

    #[test]
    fn test_target_fitness() {
        let config = SearchConfig {
            target_fitness: Some(0.0),
            ..config(6)
        };
        let mut engine = EvolutionEngine::new(config, grid(), 0, 24).unwrap();
        let result = engine.run();
        assert_eq!(result.stats.stop_reason, StopReason::Converged);
        assert_eq!(result.stats.generations, 1);
    }

    #[test]
    fn test_fixed_length_routes() {
        let config = SearchConfig {
            representation: Representation::FixedLength {
                chromosome_length: 6,
            },
            max_generations: 20,
            ..config(8)
        };
        let mut engine = EvolutionEngine::new(config, grid(), 0, 24).unwrap();
        let mut lengths_ok = true;
        let result = engine.run_with_callback(|progress| {
            if let Some(path) = &progress.best_path {
                lengths_ok &= path.route.len() == 6;
            }
        });
        assert!(lengths_ok);
        assert!(engine.population().iter().all(|c| c.route.len() == 6));
        assert_eq!(result.best.route.len(), 6);
        assert_eq!(result.best.route.first(), Some(0));
        assert_eq!(result.best.route.last(), Some(24));
    }

    #[test]
    fn test_disconnected_goal_returns_best_effort() {
        let waypoints = vec![
            Waypoint::new(0, [0.0, 0.0, 0.0]),
            Waypoint::new(1, [1.0, 0.0, 0.0]),
            Waypoint::new(2, [5.0, 0.0, 0.0]),
            Waypoint::new(3, [6.0, 0.0, 0.0]),
        ];
        let graph = NavGraph::from_links(&waypoints, &[(0, 1), (2, 3)]).unwrap();
        let config = SearchConfig {
            max_generations: 20,
            stagnation_limit: 5,
            ..config(10)
        };
        let mut engine = EvolutionEngine::new(config, graph, 0, 3).unwrap();
        let result = engine.run();

        assert!(!result.best.reaches_goal);
        assert!(result.best.goal_distance > 0.0);
        assert!(result.stats.generations <= 20);
        assert_eq!(result.best.route.first(), Some(0));
    }

    #[test]
    fn test_from_scenario() {
        let scenario = Scenario::default();
        let mut engine = EvolutionEngine::from_scenario(&scenario).unwrap();
        let result = engine.run();
        assert!(result.best.is_complete());
        assert_eq!(result.best.route.first(), Some(scenario.start));
        assert_eq!(result.best.route.last(), Some(scenario.goal));
        assert_eq!(result.polyline.len(), result.best.route.len());
    }

    #[test]
    fn test_progress_phase() {
        let mut engine = EvolutionEngine::new(config(12), grid(), 0, 24).unwrap();
        assert_eq!(engine.progress().phase, SearchPhase::Initializing);
        let mut phases = Vec::new();
        engine.run_with_callback(|progress| phases.push(progress.phase));
        assert!(phases.iter().all(|&p| p == SearchPhase::Evaluating));
        assert_eq!(engine.progress().phase, SearchPhase::Terminated);
    }
}

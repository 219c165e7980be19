//! Genetic route search over a waypoint graph.
//!
//! # Overview
//!
//! The search is split into:
//!
//! - **Fitness** (`fitness`): scores a route by length, remaining distance
//!   to the goal and the fraction of linked hops
//! - **Genome Operations** (`genome`): random walks, crossover with link
//!   repair, mutation and loop splicing behind a seeded RNG
//! - **Selection** (`selection`): roulette wheel, rank, tournament and
//!   uniform parent sampling
//! - **Search Loop** (`search`): elitism, stagnation tracking and stop
//!   conditions
//! - **Export** (`export`): JSON dump of a finished run
//!
//! # Example
//!
//! ```rust,no_run
//! use waypoint_ga::compute::{LineOfSight, build_graph};
//! use waypoint_ga::compute::evolution::EvolutionEngine;
//! use waypoint_ga::schema::Scenario;
//!
//! let scenario = Scenario::default();
//! let graph = build_graph(&scenario.waypoints, &LineOfSight::new(&scenario.obstacles))?;
//!
//! let mut engine = EvolutionEngine::new(scenario.config, graph, scenario.start, scenario.goal)?;
//! let result = engine.run_with_callback(|progress| {
//!     println!("Generation {}: best fitness = {:.4}",
//!         progress.generation, progress.best_fitness);
//! });
//!
//! println!("Best route: {}", result.best.route);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Representations
//!
//! - `VariableLength`: routes grow and shrink; loops are spliced out after
//!   every recombination
//! - `FixedLength`: every chromosome keeps `chromosome_length` genes

mod export;
mod fitness;
mod genome;
mod search;
mod selection;

pub use export::{EXPORT_VERSION, ExportMetadata, PathExport};
pub use fitness::{FitnessEvaluator, PathMetrics};
pub use genome::{RouteRng, remove_loops};
pub use search::{Candidate, EvolutionEngine, SearchError};
pub use selection::Selector;

//! Waypoint GA - Genetic route search over sparse waypoint graphs.
//!
//! This crate finds a short route between a start and a goal waypoint using
//! an evolutionary search instead of a classical shortest-path algorithm.
//! Links between waypoints come from an injected visibility test, so
//! expensive or host-specific collision queries stay outside the search.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration, scenario and result types (all serde)
//! - `compute`: Graph construction and the evolutionary search
//!
//! # Example
//!
//! ```rust,no_run
//! use waypoint_ga::{
//!     compute::{build_graph, LineOfSight},
//!     compute::evolution::EvolutionEngine,
//!     schema::Scenario,
//! };
//!
//! let scenario = Scenario::default();
//!
//! // Link every pair of waypoints with a clear line of sight
//! let graph = build_graph(&scenario.waypoints, &LineOfSight::new(&scenario.obstacles))?;
//!
//! // Evolve routes from start to goal
//! let mut engine = EvolutionEngine::new(scenario.config, graph, scenario.start, scenario.goal)?;
//! let result = engine.run();
//!
//! println!("{} (fitness {:.4})", result.best.route, result.best.fitness);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{EvolutionEngine, SearchError};
pub use compute::{LineOfSight, NavGraph, build_graph};
pub use schema::{Route, Scenario, SearchConfig, SearchResult};

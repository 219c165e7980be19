//! Compute module - Graph construction and the genetic route search.

mod graph;
mod visibility;

pub mod evolution;

pub use graph::*;
pub use visibility::*;

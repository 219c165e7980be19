//! Schema module - Configuration, world description and result types.

mod config;
mod evolution;
mod scenario;

pub use config::*;
pub use evolution::*;
pub use scenario::*;

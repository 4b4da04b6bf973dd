//! Campaign runner.
//!
//! - [`builder`] - [`SimulationBuilder`] and the default in-memory fixture
//! - `orchestrator` - seed management and the round-robin tick loop
//! - [`report`] - [`SimulationReport`] and its parts

pub mod builder;
mod orchestrator;
pub mod report;

pub use builder::{Deployment, FixtureParams, SimulationBuilder, in_memory_fixture};
pub use report::{ActionCounts, IterationFailure, SimulationReport};

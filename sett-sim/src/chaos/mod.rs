//! Checking infrastructure for vault simulation.
//!
//! ## Submodules
//!
//! - [`assertions`] - `approx_eq`, `assert_sometimes!` and coverage statistics
//! - [`invariant_trait`] - The [`Invariant`] trait checked after every tick
//! - [`invariants`] - Built-in share and want conservation invariants
//!
//! ## Philosophy
//!
//! - **Round-trip law**: checked inside the interleaved action, fatal
//! - **Manager checks**: every deposit/withdraw verifies its own deltas, fatal
//! - **Invariants**: cross-user properties validated after every tick, fatal
//! - **assert_sometimes!**: coverage of rare paths, never fatal

pub mod assertions;
pub mod invariant_trait;
pub mod invariants;

pub use assertions::{
    AssertionStats, DEFAULT_TOLERANCE, approx_eq, get_assertion_results, record_assertion,
    reset_assertion_results, unreached_assertions,
};
pub use invariant_trait::{Invariant, invariant_fn};
pub use invariants::{ShareSupplyConservation, WantConservation};

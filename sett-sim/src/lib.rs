//! # Sett Simulation
//!
//! Randomized, seeded simulation of users depositing into and withdrawing
//! from a vault ("sett"), checking the vault's accounting after every step.
//!
//! ## Core Components
//!
//! - [`UserActor`]: per-user two-state machine choosing the next action
//! - [`SettAction`]: `Deposit`, `Withdraw` or `DepositAndWithdraw`, run once
//! - [`SnapshotManager`]: deposit/withdraw calls with before/after checks
//! - [`SimulationBuilder`]: configure and run a multi-seed campaign
//! - [`chaos`]: `approx_eq`, coverage assertions and ledger invariants
//! - [`ledger`]: in-memory reference vault used as the campaign fixture
//!
//! ## What gets checked
//!
//! | Check | Where | On failure |
//! |-------|-------|------------|
//! | Round trip `start ≈ end + rewards diff` (±1) | `DepositAndWithdraw` | iteration fails |
//! | Debit, credit, mint rate, price per share | `SnapshotManager::sett_deposit` | iteration fails |
//! | Exact burn, no overpayment | `SnapshotManager::sett_withdraw` | iteration fails |
//! | Share and want conservation | after every tick | iteration fails |
//! | Zero deposits, fee skims, exact round trips | `assert_sometimes!` | reported only |
//!
//! ## Quick Start
//!
//! ```ignore
//! use sett_sim::SimulationBuilder;
//!
//! let report = SimulationBuilder::new()
//!     .users(3)
//!     .ticks(1_000)
//!     .set_iterations(10)
//!     .run();
//! assert!(report.is_success(), "{report}");
//! ```
//!
//! Replaying a failing seed:
//!
//! ```ignore
//! SimulationBuilder::new()
//!     .set_debug_seeds(vec![failing_seed])
//!     .run();
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

// Re-export core types for convenience
pub use sett_core::{
    Address, Amount, Controller, LedgerError, LedgerResult, MAX_ALLOWANCE, PRICE_PRECISION,
    RandomProvider, SettProviders, SimulationError, SimulationResult, Vault, WantToken,
};

// =============================================================================
// Core Modules
// =============================================================================

/// Deterministic randomness.
pub mod sim;

/// Checking infrastructure: tolerance, coverage assertions, invariants.
pub mod chaos;

/// In-memory vault fixture.
pub mod ledger;

/// Snapshot manager and its accounting checks.
pub mod snapshot;

/// Actions run by actors.
pub mod actions;

/// Per-user actors.
pub mod actor;

/// Campaign runner and reporting.
pub mod runner;

/// Campaign configuration.
pub mod config;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use actions::{ActionError, ActionKind, SettAction};
pub use actor::{DepositState, INTERLEAVE_THRESHOLD, UserActor};
pub use chaos::{
    AssertionStats, DEFAULT_TOLERANCE, Invariant, approx_eq, get_assertion_results, invariant_fn,
    reset_assertion_results,
};
pub use config::CampaignConfig;
pub use ledger::{InMemorySett, SettFaults, SettParams};
pub use runner::{
    ActionCounts, Deployment, FixtureParams, IterationFailure, SimulationBuilder,
    SimulationReport, in_memory_fixture,
};
pub use sim::{SimRandomProvider, derive_seed};
pub use snapshot::{ManagerCall, ManagerCallKind, ManagerError, Snapshot, SnapshotManager};

//! # sett-core
//!
//! Core abstractions for the sett simulation framework.
//!
//! This crate provides the traits and types the simulation drives a vault
//! through, without knowing how the vault computes anything internally:
//!
//! - **Ledger traits**: [`WantToken`], [`Vault`] and [`Controller`], bundled
//!   by [`SettProviders`]
//! - **Randomness**: [`RandomProvider`] for deterministic, seedable decisions
//! - **Core types**: [`Address`] and [`Amount`]
//! - **Errors**: [`LedgerError`] for collaborator failures and
//!   [`SimulationError`] for campaign-level failures
//!
//! ## Provider Traits
//!
//! Provider traits let the same actor and action code run against an
//! in-memory reference vault in tests and against any other ledger backend
//! that can answer balance queries and execute deposits and withdrawals.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

mod error;
mod ledger;
mod math;
mod random;
mod types;

// Error exports
pub use error::{LedgerError, LedgerResult, SimulationError, SimulationResult};

// Provider trait exports
pub use ledger::{Controller, SettProviders, Vault, WantToken};
pub use random::RandomProvider;

// Core type exports
pub use math::{PRICE_PRECISION, mul_div_down};
pub use types::{Address, Amount, MAX_ALLOWANCE};

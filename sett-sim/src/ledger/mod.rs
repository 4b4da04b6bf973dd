//! Ledger fixtures.
//!
//! The simulation core only talks to the provider traits from `sett-core`.
//! This module supplies an in-memory implementation used by campaigns and
//! tests.

mod memory;

pub use memory::{
    DEAD_ADDRESS, InMemorySett, MemoryController, MemoryVault, MemoryWant, REWARDS_ADDRESS,
    SettFaults, SettParams, VAULT_ADDRESS, WANT_ADDRESS,
};

//! Deterministic randomness for simulation.
//!
//! See [`rng`] for seeded providers and seed derivation.

pub mod rng;

pub use rng::{SimRandomProvider, derive_seed};

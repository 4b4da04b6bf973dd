//! Random number generation provider abstraction.
//!
//! Actors never touch a global RNG: each owns a [`RandomProvider`] so a
//! campaign can be replayed exactly from its seed.

use rand::distr::{Distribution, StandardUniform, uniform::SampleUniform};
use std::ops::Range;

/// Provider trait for random number generation.
///
/// This trait abstracts random number generation so the simulation can use a
/// seeded deterministic source while tests can script individual draws.
pub trait RandomProvider: Clone {
    /// Generate a random value of type T.
    ///
    /// The type T must implement the Standard distribution.
    fn random<T>(&self) -> T
    where
        StandardUniform: Distribution<T>;

    /// Generate a random value within a specified range.
    ///
    /// The range is exclusive of the upper bound (start..end).
    fn random_range<T>(&self, range: Range<T>) -> T
    where
        T: SampleUniform + PartialOrd;

    /// Generate a random f64 in `[0.0, 1.0)`.
    fn random_ratio(&self) -> f64;
}

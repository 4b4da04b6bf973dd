//! Approximate equality and coverage tracking for simulation checks.
//!
//! [`approx_eq`] absorbs integer-truncation rounding across share math using
//! an absolute tolerance in base units. `assert_sometimes!` records how often
//! interesting paths (zero-amount deposits, fee skims, exact round trips) are
//! reached so a campaign report can show what it actually exercised.

use std::cell::RefCell;
use std::collections::HashMap;

use sett_core::Amount;

/// Absolute tolerance used by the round-trip law unless configured otherwise.
pub const DEFAULT_TOLERANCE: Amount = 1;

/// Check `|a - b| <= tolerance` without signed arithmetic.
///
/// The tolerance is an absolute unit count, not a percentage.
pub fn approx_eq(a: Amount, b: Amount, tolerance: Amount) -> bool {
    a.abs_diff(b) <= tolerance
}

/// Statistics for a tracked assertion.
///
/// Records the total number of times an assertion was checked and how many
/// times it succeeded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssertionStats {
    /// Total number of times this assertion was evaluated
    pub total_checks: usize,
    /// Number of times the assertion condition was true
    pub successes: usize,
}

impl AssertionStats {
    /// Create new assertion statistics starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate the success rate as a percentage (0.0 to 100.0).
    ///
    /// Returns 0.0 if no checks have been performed yet.
    pub fn success_rate(&self) -> f64 {
        if self.total_checks == 0 {
            0.0
        } else {
            (self.successes as f64 / self.total_checks as f64) * 100.0
        }
    }

    /// Record a new assertion check with the given result.
    pub fn record(&mut self, success: bool) {
        self.total_checks += 1;
        if success {
            self.successes += 1;
        }
    }
}

thread_local! {
    static ASSERTION_RESULTS: RefCell<HashMap<String, AssertionStats>> = RefCell::new(HashMap::new());
}

/// Record an assertion result for statistical tracking.
pub fn record_assertion(name: &str, success: bool) {
    ASSERTION_RESULTS.with(|results| {
        results
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .record(success);
    });
}

/// Get a snapshot of all assertion statistics collected on this thread.
pub fn get_assertion_results() -> HashMap<String, AssertionStats> {
    ASSERTION_RESULTS.with(|results| results.borrow().clone())
}

/// Clear all assertion statistics.
///
/// Called at the start of every campaign.
pub fn reset_assertion_results() {
    ASSERTION_RESULTS.with(|results| results.borrow_mut().clear());
}

/// Assertions checked at least once but never satisfied.
pub fn unreached_assertions() -> Vec<String> {
    let mut names: Vec<String> = get_assertion_results()
        .into_iter()
        .filter(|(_, stats)| stats.total_checks > 0 && stats.successes == 0)
        .map(|(name, _)| name)
        .collect();
    names.sort();
    names
}

/// Record whether a condition held, without failing.
///
/// Used to observe coverage of rare paths; never aborts the simulation.
#[macro_export]
macro_rules! assert_sometimes {
    ($condition:expr, $message:expr) => {
        $crate::chaos::assertions::record_assertion($message, $condition)
    };
}

//! Campaign results and reporting.

use std::collections::HashMap;
use std::fmt;

use sett_core::{Address, SimulationError};

use crate::actions::{ActionError, ActionKind};
use crate::chaos::AssertionStats;

/// Number of actions produced, per variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionCounts {
    /// `Deposit` productions.
    pub deposit: u64,
    /// `Withdraw` productions.
    pub withdraw: u64,
    /// `DepositAndWithdraw` productions.
    pub deposit_and_withdraw: u64,
}

impl ActionCounts {
    /// Count one production of `kind`.
    pub fn record(&mut self, kind: ActionKind) {
        match kind {
            ActionKind::Deposit => self.deposit += 1,
            ActionKind::Withdraw => self.withdraw += 1,
            ActionKind::DepositAndWithdraw => self.deposit_and_withdraw += 1,
        }
    }

    /// Count for one variant.
    pub fn get(&self, kind: ActionKind) -> u64 {
        match kind {
            ActionKind::Deposit => self.deposit,
            ActionKind::Withdraw => self.withdraw,
            ActionKind::DepositAndWithdraw => self.deposit_and_withdraw,
        }
    }

    /// All productions.
    pub fn total(&self) -> u64 {
        self.deposit + self.withdraw + self.deposit_and_withdraw
    }

    /// Share of productions that were `DepositAndWithdraw`, in `[0, 1]`.
    pub fn interleaved_ratio(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.deposit_and_withdraw as f64 / total as f64,
        }
    }

    pub(crate) fn merge(&mut self, other: &ActionCounts) {
        self.deposit += other.deposit;
        self.withdraw += other.withdraw;
        self.deposit_and_withdraw += other.deposit_and_withdraw;
    }
}

/// First fatal failure of an iteration.
///
/// `error` is [`SimulationError::ActionFailed`] for a failed action,
/// [`SimulationError::InvariantViolated`] for a broken invariant, and the
/// fixture's own error when setup failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationFailure {
    /// Iteration seed; rerun with `set_debug_seeds(vec![seed])` to replay.
    pub seed: u64,
    /// Tick at which the failure happened.
    pub tick: u64,
    /// User whose action ran in that tick, if any.
    pub user: Option<Address>,
    /// Action variant that ran in that tick, if any.
    pub action: Option<ActionKind>,
    /// What went wrong.
    pub error: SimulationError,
    /// The action's own error, when an action failed.
    pub cause: Option<ActionError>,
}

impl IterationFailure {
    /// Name of the violated invariant, when an invariant check failed.
    pub fn invariant(&self) -> Option<&str> {
        match &self.error {
            SimulationError::InvariantViolated { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for IterationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ActionFailed already renders its replay context.
        if let SimulationError::ActionFailed { .. } = self.error {
            return write!(f, "{}", self.error);
        }
        write!(f, "seed={} tick={}", self.seed, self.tick)?;
        if let Some(user) = self.user {
            write!(f, " user={}", user)?;
        }
        if let Some(action) = self.action {
            write!(f, " action={}", action)?;
        }
        write!(f, ": {}", self.error)
    }
}

/// Report of a simulation campaign.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// Number of iterations executed
    pub iterations: usize,
    /// Number of successful runs
    pub successful_runs: usize,
    /// Number of failed runs
    pub failed_runs: usize,
    /// Ticks executed across all iterations
    pub ticks_executed: u64,
    /// Seeds used for each iteration
    pub seeds_used: Vec<u64>,
    /// failed seeds
    pub seeds_failing: Vec<u64>,
    /// Productions per action variant across all iterations
    pub action_counts: ActionCounts,
    /// First failure of each failed iteration
    pub failures: Vec<IterationFailure>,
    /// Deposits verified by the snapshot manager
    pub deposits_verified: usize,
    /// Withdrawals verified by the snapshot manager
    pub withdrawals_verified: usize,
    /// Aggregated assertion results across all iterations
    pub assertion_results: HashMap<String, AssertionStats>,
}

impl SimulationReport {
    /// Calculate the success rate as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.iterations == 0 {
            0.0
        } else {
            (self.successful_runs as f64 / self.iterations as f64) * 100.0
        }
    }

    /// True when no iteration failed.
    pub fn is_success(&self) -> bool {
        self.failed_runs == 0
    }

    /// Assertions that were checked but never held.
    pub fn unreached_assertions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .assertion_results
            .iter()
            .filter(|(_, s)| s.total_checks > 0 && s.successes == 0)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Sett Simulation Report ===")?;
        writeln!(f, "Iterations: {}", self.iterations)?;
        writeln!(f, "Successful: {}", self.successful_runs)?;
        writeln!(f, "Failed: {}", self.failed_runs)?;
        writeln!(f, "Success Rate: {:.2}%", self.success_rate())?;
        writeln!(f, "Ticks: {}", self.ticks_executed)?;
        writeln!(f)?;

        writeln!(f, "Actions:")?;
        for kind in ActionKind::ALL {
            writeln!(f, "  {:<20} {}", kind, self.action_counts.get(kind))?;
        }
        writeln!(
            f,
            "  interleaved ratio    {:.3}",
            self.action_counts.interleaved_ratio()
        )?;
        writeln!(
            f,
            "Verified calls: {} deposits, {} withdrawals",
            self.deposits_verified, self.withdrawals_verified
        )?;

        if !self.assertion_results.is_empty() {
            writeln!(f)?;
            writeln!(f, "Assertions:")?;
            let mut names: Vec<_> = self.assertion_results.keys().collect();
            names.sort();
            for name in names {
                let stats = &self.assertion_results[name];
                writeln!(
                    f,
                    "  {:<28} {}/{} ({:.1}%)",
                    name,
                    stats.successes,
                    stats.total_checks,
                    stats.success_rate()
                )?;
            }
        }

        if !self.seeds_failing.is_empty() {
            writeln!(f)?;
            writeln!(f, "Faulty seeds: {:?}", self.seeds_failing)?;
            for failure in &self.failures {
                writeln!(f, "  {}", failure)?;
            }
        }

        Ok(())
    }
}

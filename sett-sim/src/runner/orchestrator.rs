//! Iteration management and the per-iteration tick loop.

use sett_core::{Address, Amount, SettProviders, SimulationError};

use crate::actions::{ActionError, ActionKind};
use crate::actor::UserActor;
use crate::chaos::invariant_trait::Invariant;
use crate::sim::{SimRandomProvider, derive_seed};
use crate::snapshot::{ManagerCallKind, SnapshotManager};

use super::builder::Deployment;
use super::report::{ActionCounts, IterationFailure};

/// Hands out one seed per iteration: explicit seeds first, then seeds
/// derived from a base seed.
pub(crate) struct IterationManager {
    iterations: usize,
    seeds: Vec<u64>,
    base_seed: u64,
    iteration_count: usize,
}

impl IterationManager {
    /// Create a manager running `iterations` iterations, at least one per
    /// explicit seed.
    pub(crate) fn new(iterations: usize, initial_seeds: Vec<u64>) -> Self {
        let base_seed = std::time::SystemTime::now()
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(12345);
        Self::with_base_seed(iterations, initial_seeds, base_seed)
    }

    pub(crate) fn with_base_seed(
        iterations: usize,
        initial_seeds: Vec<u64>,
        base_seed: u64,
    ) -> Self {
        Self {
            iterations: iterations.max(initial_seeds.len()),
            seeds: initial_seeds,
            base_seed,
            iteration_count: 0,
        }
    }

    /// Check if more iterations should be run.
    pub(crate) fn should_continue(&self) -> bool {
        self.iteration_count < self.iterations
    }

    /// Get the seed for the current iteration and advance to the next.
    pub(crate) fn next_iteration(&mut self) -> u64 {
        let seed = if self.iteration_count < self.seeds.len() {
            self.seeds[self.iteration_count]
        } else {
            let new_seed = derive_seed(self.base_seed, self.iteration_count as u64);
            self.seeds.push(new_seed);
            new_seed
        };

        self.iteration_count += 1;

        tracing::info!(
            "Starting iteration {}/{} with seed {}",
            self.iteration_count,
            self.iterations,
            seed
        );

        seed
    }

    /// Get all seeds used so far.
    pub(crate) fn seeds_used(&self) -> &[u64] {
        &self.seeds[..self.iteration_count]
    }
}

/// What one iteration produced, successful or not.
pub(crate) struct IterationOutcome {
    pub(crate) ticks: u64,
    pub(crate) counts: ActionCounts,
    pub(crate) deposits_verified: usize,
    pub(crate) withdrawals_verified: usize,
    pub(crate) failure: Option<IterationFailure>,
}

/// Drives one iteration: round-robin actors, one action per tick, invariants
/// after every tick, stop at the first failure.
pub(crate) struct IterationOrchestrator;

impl IterationOrchestrator {
    pub(crate) fn run_iteration<P: SettProviders>(
        deployment: Deployment<P>,
        invariants: &[Box<dyn Invariant<P>>],
        seed: u64,
        ticks: u64,
        tolerance: Amount,
    ) -> IterationOutcome {
        let Deployment { providers, users } = deployment;
        let snap = SnapshotManager::with_tolerance(providers.clone(), tolerance);

        let mut actors: Vec<UserActor<P, SimRandomProvider>> = users
            .iter()
            .enumerate()
            .map(|(idx, user)| {
                UserActor::new(
                    snap.clone(),
                    *user,
                    SimRandomProvider::new(derive_seed(seed, idx as u64)),
                )
            })
            .collect();

        let mut outcome = IterationOutcome {
            ticks: 0,
            counts: ActionCounts::default(),
            deposits_verified: 0,
            withdrawals_verified: 0,
            failure: None,
        };

        if actors.is_empty() {
            outcome.failure = Some(IterationFailure {
                seed,
                tick: 0,
                user: None,
                action: None,
                error: SimulationError::InvalidState("deployment has no users".to_string()),
                cause: None,
            });
            return outcome;
        }

        let actor_count = actors.len() as u64;
        for tick in 0..ticks {
            let actor = &mut actors[(tick % actor_count) as usize];
            let action = actor.generate_action();
            let kind = action.kind();
            let user = action.user();
            outcome.counts.record(kind);
            outcome.ticks += 1;

            tracing::debug!(seed, tick, %user, action = %kind, "tick");

            if let Err(cause) = action.run() {
                let error = SimulationError::ActionFailed {
                    seed,
                    tick,
                    user,
                    action: kind.to_string(),
                    reason: cause.to_string(),
                };
                tracing::error!("{}", error);
                outcome.failure = Some(Self::failure(seed, tick, user, kind, error, Some(cause)));
                break;
            }

            if let Some(error) = Self::check_invariants(invariants, &providers, &users) {
                tracing::error!(seed, tick, %user, action = %kind, "{}", error);
                outcome.failure = Some(Self::failure(seed, tick, user, kind, error, None));
                break;
            }
        }

        outcome.deposits_verified = snap.call_count(ManagerCallKind::Deposit);
        outcome.withdrawals_verified = snap.call_count(ManagerCallKind::Withdraw);
        outcome
    }

    fn check_invariants<P: SettProviders>(
        invariants: &[Box<dyn Invariant<P>>],
        providers: &P,
        users: &[Address],
    ) -> Option<SimulationError> {
        invariants.iter().find_map(|inv| {
            inv.check(providers, users)
                .err()
                .map(|message| SimulationError::InvariantViolated {
                    name: inv.name().to_string(),
                    message,
                })
        })
    }

    fn failure(
        seed: u64,
        tick: u64,
        user: Address,
        action: ActionKind,
        error: SimulationError,
        cause: Option<ActionError>,
    ) -> IterationFailure {
        IterationFailure {
            seed,
            tick,
            user: Some(user),
            action: Some(action),
            error,
            cause,
        }
    }
}

/// Collects and aggregates metrics across simulation iterations.
pub(crate) struct MetricsCollector {
    successful_runs: usize,
    failed_runs: usize,
    ticks_executed: u64,
    action_counts: ActionCounts,
    deposits_verified: usize,
    withdrawals_verified: usize,
    failures: Vec<IterationFailure>,
    faulty_seeds: Vec<u64>,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    pub(crate) fn new() -> Self {
        Self {
            successful_runs: 0,
            failed_runs: 0,
            ticks_executed: 0,
            action_counts: ActionCounts::default(),
            deposits_verified: 0,
            withdrawals_verified: 0,
            failures: Vec::new(),
            faulty_seeds: Vec::new(),
        }
    }

    /// Record the outcome of an iteration.
    pub(crate) fn record_iteration(&mut self, seed: u64, outcome: IterationOutcome) {
        self.ticks_executed += outcome.ticks;
        self.action_counts.merge(&outcome.counts);
        self.deposits_verified += outcome.deposits_verified;
        self.withdrawals_verified += outcome.withdrawals_verified;

        match outcome.failure {
            None => {
                self.successful_runs += 1;
                tracing::info!("Iteration completed successfully with seed {}", seed);
            }
            Some(failure) => self.record_failure(seed, failure),
        }
    }

    /// Record an iteration whose fixture could not be set up.
    pub(crate) fn record_setup_failure(&mut self, seed: u64, error: SimulationError) {
        self.record_failure(
            seed,
            IterationFailure {
                seed,
                tick: 0,
                user: None,
                action: None,
                error,
                cause: None,
            },
        );
    }

    fn record_failure(&mut self, seed: u64, failure: IterationFailure) {
        self.failed_runs += 1;
        tracing::warn!("Iteration FAILED with seed {}: {}", seed, failure);
        self.failures.push(failure);
        self.faulty_seeds.push(seed);
    }

    pub(crate) fn successful_runs(&self) -> usize {
        self.successful_runs
    }

    pub(crate) fn failed_runs(&self) -> usize {
        self.failed_runs
    }

    pub(crate) fn ticks_executed(&self) -> u64 {
        self.ticks_executed
    }

    pub(crate) fn action_counts(&self) -> ActionCounts {
        self.action_counts
    }

    pub(crate) fn verified_calls(&self) -> (usize, usize) {
        (self.deposits_verified, self.withdrawals_verified)
    }

    pub(crate) fn into_failures(self) -> (Vec<IterationFailure>, Vec<u64>) {
        (self.failures, self.faulty_seeds)
    }
}

//! Simulation builder pattern for configuring and running campaigns.
//!
//! ```ignore
//! let report = SimulationBuilder::new()
//!     .users(3)
//!     .ticks(500)
//!     .withdrawal_fee_bps(20)
//!     .set_iterations(20)
//!     .run();
//! assert!(report.is_success(), "{report}");
//! ```

use sett_core::{Address, Amount, SettProviders, SimulationError, SimulationResult, Vault};
use tracing::instrument;

use crate::chaos::invariant_trait::Invariant;
use crate::chaos::{
    DEFAULT_TOLERANCE, ShareSupplyConservation, WantConservation, get_assertion_results,
    invariant_fn, reset_assertion_results,
};
use crate::config::CampaignConfig;
use crate::ledger::{InMemorySett, SettFaults, SettParams};

use super::orchestrator::{IterationManager, IterationOrchestrator, MetricsCollector};
use super::report::SimulationReport;

/// Ledger handed to the actors of one iteration.
#[derive(Debug, Clone)]
pub struct Deployment<P> {
    /// Ledger collaborators.
    pub providers: P,
    /// Funded users, one actor each.
    pub users: Vec<Address>,
}

/// Inputs to a fixture, refreshed for every iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureParams {
    /// Number of users to fund.
    pub users: usize,
    /// Want minted to each user.
    pub initial_balance: Amount,
    /// Withdrawal fee in basis points.
    pub withdrawal_fee_bps: u32,
    /// Injected vault defects.
    pub faults: SettFaults,
    /// Iteration seed.
    pub seed: u64,
}

type Fixture<P> = Box<dyn Fn(&FixtureParams) -> SimulationResult<Deployment<P>>>;

/// Deploy a paused [`InMemorySett`], fund every user, then unpause.
pub fn in_memory_fixture(params: &FixtureParams) -> SimulationResult<Deployment<InMemorySett>> {
    let sett = InMemorySett::deploy(SettParams {
        withdrawal_fee_bps: params.withdrawal_fee_bps,
        faults: params.faults.clone(),
    });
    if !sett.vault().paused() {
        return Err(SimulationError::InvalidState(
            "vault must deploy paused".to_string(),
        ));
    }

    let count = u32::try_from(params.users)
        .map_err(|_| SimulationError::Config(format!("too many users: {}", params.users)))?;
    let users: Vec<Address> = (0..count).map(Address::user).collect();
    for user in &users {
        sett.mint(*user, params.initial_balance)?;
    }
    sett.unpause();

    Ok(Deployment {
        providers: sett,
        users,
    })
}

/// Builder pattern for configuring and running simulation campaigns.
pub struct SimulationBuilder<P: SettProviders = InMemorySett> {
    params: FixtureParams,
    ticks: u64,
    iterations: usize,
    seeds: Vec<u64>,
    tolerance: Amount,
    fixture: Fixture<P>,
    invariants: Vec<Box<dyn Invariant<P>>>,
}

impl Default for SimulationBuilder<InMemorySett> {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationBuilder<InMemorySett> {
    /// Builder over the in-memory vault with both conservation invariants.
    pub fn new() -> Self {
        Self::with_fixture(in_memory_fixture).with_default_invariants()
    }

    /// Builder over the in-memory vault configured from `config`.
    pub fn from_config(config: &CampaignConfig) -> Self {
        Self::new()
            .users(config.users)
            .ticks(config.ticks)
            .set_iterations(config.iterations)
            .set_debug_seeds(config.seeds.clone())
            .initial_balance(config.initial_balance)
            .withdrawal_fee_bps(config.withdrawal_fee_bps)
            .faults(config.faults.clone())
            .tolerance(config.tolerance)
    }
}

impl<P: SettProviders> SimulationBuilder<P> {
    /// Builder over a custom fixture, with no invariants registered.
    pub fn with_fixture(
        fixture: impl Fn(&FixtureParams) -> SimulationResult<Deployment<P>> + 'static,
    ) -> Self {
        let defaults = CampaignConfig::default();
        Self {
            params: FixtureParams {
                users: defaults.users,
                initial_balance: defaults.initial_balance,
                withdrawal_fee_bps: defaults.withdrawal_fee_bps,
                faults: defaults.faults,
                seed: 0,
            },
            ticks: defaults.ticks,
            iterations: 1,
            seeds: Vec::new(),
            tolerance: DEFAULT_TOLERANCE,
            fixture: Box::new(fixture),
            invariants: Vec::new(),
        }
    }

    /// Number of users (actors) per iteration.
    pub fn users(mut self, users: usize) -> Self {
        self.params.users = users;
        self
    }

    /// Ticks per iteration.
    pub fn ticks(mut self, ticks: u64) -> Self {
        self.ticks = ticks;
        self
    }

    /// Set the number of iterations to run.
    pub fn set_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set specific seeds for deterministic debugging and regression testing.
    pub fn set_debug_seeds(mut self, seeds: Vec<u64>) -> Self {
        self.seeds = seeds;
        self
    }

    /// Want minted to each user at genesis.
    pub fn initial_balance(mut self, amount: Amount) -> Self {
        self.params.initial_balance = amount;
        self
    }

    /// Withdrawal fee in basis points.
    pub fn withdrawal_fee_bps(mut self, bps: u32) -> Self {
        self.params.withdrawal_fee_bps = bps;
        self
    }

    /// Inject vault defects.
    pub fn faults(mut self, faults: SettFaults) -> Self {
        self.params.faults = faults;
        self
    }

    /// Absolute tolerance for the round-trip law and manager checks.
    pub fn tolerance(mut self, tolerance: Amount) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Add an invariant to be checked after every tick.
    pub fn invariant(mut self, i: impl Invariant<P> + 'static) -> Self {
        self.invariants.push(Box::new(i));
        self
    }

    /// Add a closure-based invariant.
    pub fn invariant_fn(
        mut self,
        name: &str,
        f: impl Fn(&P, &[Address]) -> Result<(), String> + 'static,
    ) -> Self {
        self.invariants.push(invariant_fn(name, f));
        self
    }

    /// Register [`ShareSupplyConservation`] and [`WantConservation`].
    pub fn with_default_invariants(self) -> Self {
        self.invariant(ShareSupplyConservation)
            .invariant(WantConservation)
    }

    /// Run the campaign.
    #[instrument(skip_all)]
    pub fn run(self) -> SimulationReport {
        reset_assertion_results();

        let mut iteration_manager = IterationManager::new(self.iterations, self.seeds.clone());
        let mut metrics = MetricsCollector::new();

        while iteration_manager.should_continue() {
            let seed = iteration_manager.next_iteration();
            let params = FixtureParams {
                seed,
                ..self.params.clone()
            };

            let deployment = match (self.fixture)(&params) {
                Ok(deployment) => deployment,
                Err(e) => {
                    tracing::error!(seed, "fixture failed: {}", e);
                    metrics.record_setup_failure(seed, e);
                    continue;
                }
            };

            let outcome = IterationOrchestrator::run_iteration(
                deployment,
                &self.invariants,
                seed,
                self.ticks,
                self.tolerance,
            );
            metrics.record_iteration(seed, outcome);
        }

        let seeds_used = iteration_manager.seeds_used().to_vec();
        let (deposits_verified, withdrawals_verified) = metrics.verified_calls();
        let successful_runs = metrics.successful_runs();
        let failed_runs = metrics.failed_runs();
        let ticks_executed = metrics.ticks_executed();
        let action_counts = metrics.action_counts();
        let (failures, seeds_failing) = metrics.into_failures();

        tracing::info!(
            iterations = seeds_used.len(),
            successful_runs,
            failed_runs,
            ticks_executed,
            "campaign finished"
        );

        SimulationReport {
            iterations: seeds_used.len(),
            successful_runs,
            failed_runs,
            ticks_executed,
            seeds_used,
            seeds_failing,
            action_counts,
            failures,
            deposits_verified,
            withdrawals_verified,
            assertion_results: get_assertion_results(),
        }
    }
}

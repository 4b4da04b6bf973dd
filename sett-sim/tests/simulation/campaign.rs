//! Full campaigns over the in-memory vault.

use sett_sim::{
    ActionError, ActionKind, CampaignConfig, Deployment, InMemorySett, LedgerError, ManagerError,
    PRICE_PRECISION, SettFaults, SettParams, SettProviders, SimulationBuilder, SimulationError,
    Vault, WantToken, in_memory_fixture,
};

#[test]
fn test_default_campaign_passes() {
    let report = SimulationBuilder::new()
        .users(3)
        .ticks(300)
        .set_debug_seeds(vec![1, 2, 3])
        .run();

    assert!(report.is_success(), "{report}");
    assert_eq!(report.iterations, 3);
    assert_eq!(report.successful_runs, 3);
    assert_eq!(report.seeds_used, vec![1, 2, 3]);
    assert_eq!(report.ticks_executed, 900);
    assert_eq!(report.action_counts.total(), 900);
    assert!(report.action_counts.get(ActionKind::Deposit) > 0);
    assert!(report.action_counts.get(ActionKind::Withdraw) > 0);
    assert!(report.deposits_verified > 0);
    assert!(report.withdrawals_verified > 0);

    let exact = &report.assertion_results["round trip exact"];
    assert_eq!(exact.successes, exact.total_checks);
}

#[test]
fn test_fee_campaign_passes_and_skims() {
    let report = SimulationBuilder::new()
        .withdrawal_fee_bps(20)
        .ticks(200)
        .set_debug_seeds(vec![5, 6])
        .run();

    assert!(report.is_success(), "{report}");
    let skimmed = &report.assertion_results["fee skimmed on withdraw"];
    assert!(skimmed.successes > 0);
}

#[test]
fn test_dust_fault_fails_every_seed() {
    let report = SimulationBuilder::new()
        .faults(SettFaults {
            dust_on_withdraw: 3,
        })
        .ticks(200)
        .set_debug_seeds(vec![10, 11, 12])
        .run();

    assert_eq!(report.failed_runs, 3);
    assert_eq!(report.seeds_failing, vec![10, 11, 12]);
    assert_eq!(report.failures.len(), 3);
    for failure in &report.failures {
        assert!(failure.user.is_some());
        assert!(failure.action.is_some());
        let caught_by_invariant = failure.invariant() == Some("want_conservation");
        let caught_by_round_trip =
            matches!(failure.cause, Some(ActionError::RoundTripLoss { .. }))
                && matches!(failure.error, SimulationError::ActionFailed { .. });
        assert!(
            caught_by_invariant || caught_by_round_trip,
            "unexpected failure: {}",
            failure
        );
    }
    assert!(report.to_string().contains("Faulty seeds: [10, 11, 12]"));
}

#[test]
fn test_failing_seed_replays_identically() {
    let run = || {
        SimulationBuilder::new()
            .faults(SettFaults {
                dust_on_withdraw: 3,
            })
            .set_debug_seeds(vec![77])
            .run()
    };
    let first = run();
    let second = run();
    assert_eq!(first.failures, second.failures);
    assert_eq!(first.action_counts, second.action_counts);
}

#[test]
fn test_from_config_runs_configured_campaign() {
    let config = CampaignConfig {
        users: 2,
        ticks: 50,
        iterations: 2,
        seeds: vec![4],
        ..Default::default()
    };
    let report = SimulationBuilder::from_config(&config).run();
    assert!(report.is_success(), "{report}");
    assert_eq!(report.iterations, 2);
    assert_eq!(report.seeds_used[0], 4);
    assert_eq!(report.ticks_executed, 100);
}

#[test]
fn test_paused_fixture_fails_on_first_tick() {
    let report = SimulationBuilder::with_fixture(|params| {
        let deployment = in_memory_fixture(params)?;
        deployment.providers.pause();
        Ok(deployment)
    })
    .users(1)
    .set_debug_seeds(vec![1])
    .run();

    assert_eq!(report.failed_runs, 1);
    let failure = &report.failures[0];
    assert_eq!(failure.tick, 0);
    assert!(failure.to_string().contains("vault is paused"), "{}", failure);
    assert!(matches!(
        failure.error,
        SimulationError::ActionFailed { seed: 1, tick: 0, .. }
    ));
    assert!(matches!(
        failure.cause,
        Some(ActionError::Manager {
            source: ManagerError::Ledger(LedgerError::Paused),
            ..
        })
    ));
}

#[test]
fn test_custom_invariant_failure_reports_name() {
    let report = SimulationBuilder::new()
        .invariant_fn("vault_never_holds_want", |providers: &InMemorySett, _users| {
            let held = providers.want().balance_of(providers.vault().address());
            if held > 0 {
                Err(format!("vault holds {}", held))
            } else {
                Ok(())
            }
        })
        .users(1)
        .ticks(50)
        .set_debug_seeds(vec![8])
        .run();

    // A deposit leaves want in the vault, so the first Deposit tick fails.
    assert_eq!(report.failed_runs, 1);
    let failure = &report.failures[0];
    assert_eq!(failure.invariant(), Some("vault_never_holds_want"));
    assert_eq!(failure.action, Some(ActionKind::Deposit));
    assert_eq!(failure.cause, None);
    assert!(matches!(
        &failure.error,
        SimulationError::InvariantViolated { message, .. } if message.starts_with("vault holds ")
    ));
}

#[test]
fn test_custom_fixture_with_default_invariants() {
    let report = SimulationBuilder::with_fixture(|params| {
        let sett = InMemorySett::deploy(SettParams {
            withdrawal_fee_bps: 50,
            ..Default::default()
        });
        let users: Vec<_> = (0..params.users as u32).map(sett_sim::Address::user).collect();
        for user in &users {
            sett.mint(*user, params.initial_balance)?;
        }
        sett.unpause();
        Ok(Deployment {
            providers: sett,
            users,
        })
    })
    .with_default_invariants()
    .users(2)
    .ticks(100)
    .set_debug_seeds(vec![21])
    .run();

    assert!(report.is_success(), "{report}");
    assert_eq!(report.ticks_executed, 100);
}

#[test]
fn test_wei_scale_campaign_passes() {
    let report = SimulationBuilder::new()
        .users(3)
        .initial_balance(1_000 * PRICE_PRECISION)
        .ticks(300)
        .set_debug_seeds(vec![1, 2])
        .run();

    assert!(report.is_success(), "{report}");
    assert_eq!(report.ticks_executed, 600);
    assert!(report.deposits_verified > 0);
    assert!(report.withdrawals_verified > 0);
}

#[test]
fn test_wei_scale_campaign_with_fee_passes() {
    let report = SimulationBuilder::new()
        .users(2)
        .initial_balance(1_000 * PRICE_PRECISION)
        .withdrawal_fee_bps(20)
        .ticks(200)
        .set_debug_seeds(vec![3])
        .run();

    assert!(report.is_success(), "{report}");
}

#[test]
fn test_unmintable_genesis_fails_setup_without_panicking() {
    let report = SimulationBuilder::new()
        .users(2)
        .initial_balance(u128::MAX / 2 + 1)
        .set_debug_seeds(vec![9])
        .run();

    assert_eq!(report.failed_runs, 1);
    assert_eq!(report.seeds_failing, vec![9]);
    let failure = &report.failures[0];
    assert!(failure.user.is_none());
    assert!(failure.to_string().contains("math overflow"), "{}", failure);
}

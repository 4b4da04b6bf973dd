//! Actor state machine properties.

use sett_sim::{
    ActionKind, Address, DepositState, InMemorySett, SettParams, SimRandomProvider,
    SnapshotManager, UserActor,
};

use crate::support::ScriptedRandom;

fn idle_manager() -> SnapshotManager<InMemorySett> {
    SnapshotManager::new(InMemorySett::deploy(SettParams::default()))
}

#[test]
fn test_non_interleaved_productions_alternate() {
    let mut actor = UserActor::new(idle_manager(), Address::user(0), SimRandomProvider::new(7));

    let sequence: Vec<ActionKind> = (0..1_000)
        .map(|_| actor.generate_action().kind())
        .filter(|k| *k != ActionKind::DepositAndWithdraw)
        .collect();

    assert!(!sequence.is_empty());
    for (i, kind) in sequence.iter().enumerate() {
        let expected = if i % 2 == 0 {
            ActionKind::Deposit
        } else {
            ActionKind::Withdraw
        };
        assert_eq!(*kind, expected, "production {} out of order", i);
    }
}

#[test]
fn test_interleaved_production_is_a_self_loop() {
    let mut actor = UserActor::new(idle_manager(), Address::user(0), SimRandomProvider::new(11));

    for _ in 0..500 {
        let before = actor.state();
        let action = actor.generate_action();
        if action.kind() == ActionKind::DepositAndWithdraw {
            assert_eq!(actor.state(), before);
        } else {
            assert_ne!(actor.state(), before);
        }
    }
}

#[test]
fn test_scripted_walk_through_both_states() {
    let draws = [0.9, 0.1, 0.75, 0.2, 0.4, 0.6];
    let mut actor = UserActor::new(idle_manager(), Address::user(2), ScriptedRandom::new(&draws));

    let observed: Vec<(ActionKind, DepositState)> = draws
        .iter()
        .map(|_| {
            let kind = actor.generate_action().kind();
            (kind, actor.state())
        })
        .collect();

    assert_eq!(
        observed,
        vec![
            (ActionKind::DepositAndWithdraw, DepositState::NoOpenDeposit),
            (ActionKind::Deposit, DepositState::OpenDeposit),
            (ActionKind::DepositAndWithdraw, DepositState::OpenDeposit),
            (ActionKind::Withdraw, DepositState::NoOpenDeposit),
            (ActionKind::Deposit, DepositState::OpenDeposit),
            (ActionKind::DepositAndWithdraw, DepositState::OpenDeposit),
        ]
    );
}

#[test]
fn test_interleaved_ratio_converges_to_half() {
    let mut actor = UserActor::new(idle_manager(), Address::user(0), SimRandomProvider::new(42));

    let total = 10_000;
    let interleaved = (0..total)
        .filter(|_| actor.generate_action().kind() == ActionKind::DepositAndWithdraw)
        .count();
    let ratio = interleaved as f64 / total as f64;

    assert!(
        (0.47..=0.53).contains(&ratio),
        "interleaved ratio {} not near 0.5",
        ratio
    );
}

#[test]
fn test_same_seed_same_decisions() {
    let kinds = |seed: u64| -> Vec<ActionKind> {
        let mut actor =
            UserActor::new(idle_manager(), Address::user(0), SimRandomProvider::new(seed));
        (0..64).map(|_| actor.generate_action().kind()).collect()
    };
    assert_eq!(kinds(99), kinds(99));
}

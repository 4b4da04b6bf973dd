//! Deposit amount law, round-trip law and their boundary scenarios.

use proptest::prelude::*;
use sett_sim::{
    ActionError, Address, Amount, ManagerError, PRICE_PRECISION, SettAction, SettProviders, Vault,
    WantToken,
};

use crate::support::{live_sett, manager_with_user, seed_deposit};

const ALICE: Address = Address::user(0);
const WHALE: Address = Address::user(99);

/// 1e27 base units: a billion 18-decimal tokens.
const WEI_CEILING: Amount = 1_000_000_000 * PRICE_PRECISION;

/// Run one `DepositAndWithdraw` for `ALICE` and return her final want.
fn round_trip(fee_bps: u32, dust: Amount, balance: Amount) -> Result<Amount, ActionError> {
    let snap = manager_with_user(fee_bps, dust, ALICE, balance);
    SettAction::deposit_and_withdraw(snap.clone(), ALICE).run()?;
    Ok(snap.snapshot(ALICE).user_want)
}

#[test]
fn test_zero_balance_cycle_is_noop() {
    let snap = manager_with_user(0, 0, ALICE, 0);
    SettAction::deposit(snap.clone(), ALICE)
        .run()
        .expect("deposit 0");
    SettAction::withdraw(snap.clone(), ALICE)
        .run()
        .expect("withdraw 0");
    SettAction::deposit_and_withdraw(snap.clone(), ALICE)
        .run()
        .expect("round trip 0");

    let s = snap.snapshot(ALICE);
    assert_eq!(s.user_want, 0);
    assert_eq!(s.user_shares, 0);
    assert_eq!(s.total_supply, 0);
}

#[test]
fn test_balance_of_one_deposits_nothing() {
    let snap = manager_with_user(0, 0, ALICE, 1);
    SettAction::deposit(snap.clone(), ALICE)
        .run()
        .expect("deposit");
    let s = snap.snapshot(ALICE);
    assert_eq!(s.user_want, 1);
    assert_eq!(s.user_shares, 0);
    assert_eq!(round_trip(0, 0, 1), Ok(1));
}

#[test]
fn test_thousand_round_trip_is_exact() {
    let snap = manager_with_user(0, 0, ALICE, 1_000).with_history();
    SettAction::deposit_and_withdraw(snap.clone(), ALICE)
        .run()
        .expect("round trip");

    let history = snap.history();
    assert_eq!(snap.call_count(sett_sim::ManagerCallKind::Deposit), 1);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].amount, 500);
    assert_eq!(history[0].after.user_shares - history[0].before.user_shares, 500);
    assert_eq!(history[1].amount, 500);
    assert_eq!(history[1].after.rewards_want, 0);
    assert_eq!(snap.snapshot(ALICE).user_want, 1_000);
}

#[test]
fn test_fee_is_reconstructed_from_rewards() {
    let snap = manager_with_user(20, 0, ALICE, 1_000);
    SettAction::deposit_and_withdraw(snap.clone(), ALICE)
        .run()
        .expect("round trip with fee");
    let s = snap.snapshot(ALICE);
    assert_eq!(s.user_want, 999);
    assert_eq!(s.rewards_want, 1);
}

#[test]
fn test_one_unit_loss_is_tolerated() {
    assert_eq!(round_trip(0, 1, 1_000), Ok(999));
}

#[test]
fn test_two_unit_loss_fails() {
    assert_eq!(
        round_trip(20, 2, 1_000),
        Err(ActionError::RoundTripLoss {
            starting_balance: 1_000,
            ending_balance: 997,
            rewards_diff: 1,
            tolerance: 1,
        })
    );
    assert!(matches!(
        round_trip(0, 2, 1_000),
        Err(ActionError::RoundTripLoss {
            ending_balance: 998,
            rewards_diff: 0,
            ..
        })
    ));
}

#[test]
fn test_truncation_at_high_share_price_is_detected() {
    // One share backed by 3 want: a deposit of 2 mints nothing.
    let sett = live_sett(0, 0);
    seed_deposit(&sett, WHALE, 1);
    sett.harvest(2).expect("harvest");
    sett.mint(ALICE, 4).expect("mint");

    let snap = sett_sim::SnapshotManager::new(sett);
    let err = SettAction::deposit_and_withdraw(snap.clone(), ALICE)
        .run()
        .expect_err("two units donated to the whale");
    assert_eq!(
        err,
        ActionError::RoundTripLoss {
            starting_balance: 4,
            ending_balance: 2,
            rewards_diff: 0,
            tolerance: 1,
        }
    );
    assert_eq!(snap.providers().vault().balance(), 5);
}

#[test]
fn test_truncation_within_tolerance_passes() {
    let sett = live_sett(0, 0);
    seed_deposit(&sett, WHALE, 1);
    sett.harvest(2).expect("harvest");
    sett.mint(ALICE, 3).expect("mint");

    let snap = sett_sim::SnapshotManager::new(sett);
    SettAction::deposit_and_withdraw(snap.clone(), ALICE)
        .run()
        .expect("one unit lost");
    assert_eq!(snap.snapshot(ALICE).user_want, 2);
}

#[test]
fn test_paused_vault_error_is_propagated() {
    let snap = manager_with_user(0, 0, ALICE, 10);
    snap.providers().pause();
    let err = SettAction::deposit_and_withdraw(snap, ALICE)
        .run()
        .expect_err("paused");
    assert!(matches!(
        err,
        ActionError::Manager {
            source: ManagerError::Ledger(sett_sim::LedgerError::Paused),
            ..
        }
    ));
}

#[test]
fn test_withdraw_after_deposit_returns_everything() {
    let snap = manager_with_user(0, 0, ALICE, 777);
    SettAction::deposit(snap.clone(), ALICE).run().expect("deposit");
    assert_eq!(snap.snapshot(ALICE).user_shares, 388);
    SettAction::withdraw(snap.clone(), ALICE).run().expect("withdraw");
    let s = snap.snapshot(ALICE);
    assert_eq!(s.user_shares, 0);
    assert_eq!(s.user_want, 777);
    assert_eq!(snap.providers().want().balance_of(snap.providers().vault().address()), 0);
}

#[test]
fn test_wei_scale_round_trip_next_to_existing_depositor() {
    let sett = live_sett(0, 0);
    seed_deposit(&sett, WHALE, 500 * PRICE_PRECISION);
    sett.mint(ALICE, 1_000 * PRICE_PRECISION).expect("mint");
    let snap = sett_sim::SnapshotManager::new(sett);

    SettAction::deposit_and_withdraw(snap.clone(), ALICE)
        .run()
        .expect("wei-scale round trip");
    let s = snap.snapshot(ALICE);
    assert_eq!(s.user_want, 1_000 * PRICE_PRECISION);
    assert_eq!(s.user_shares, 0);
    assert_eq!(s.price_per_share, PRICE_PRECISION);
}

#[test]
fn test_wei_scale_price_per_share_after_deposit() {
    let snap = manager_with_user(0, 0, ALICE, 1_000 * PRICE_PRECISION);
    SettAction::deposit(snap.clone(), ALICE)
        .run()
        .expect("deposit");
    let s = snap.snapshot(ALICE);
    assert_eq!(s.vault_balance, 500 * PRICE_PRECISION);
    assert_eq!(s.price_per_share, PRICE_PRECISION);
}

proptest! {
    #[test]
    fn prop_deposit_amount_is_half_of_balance(balance in 0u128..WEI_CEILING) {
        let snap = manager_with_user(0, 0, ALICE, balance);
        SettAction::deposit(snap.clone(), ALICE).run().expect("deposit");

        let deposited = balance / 2;
        prop_assert!(deposited <= balance);
        let s = snap.snapshot(ALICE);
        prop_assert_eq!(s.user_want, balance - deposited);
        prop_assert_eq!(s.user_shares, deposited);
        prop_assert_eq!(s.vault_balance, deposited);
    }

    #[test]
    fn prop_round_trip_holds_at_unit_price(
        balance in 0u128..WEI_CEILING,
        existing in 0u128..WEI_CEILING,
        fee_bps in 0u32..=10_000,
    ) {
        let sett = live_sett(fee_bps, 0);
        if existing > 0 {
            seed_deposit(&sett, WHALE, existing);
        }
        sett.mint(ALICE, balance).expect("mint");
        let snap = sett_sim::SnapshotManager::new(sett);

        let start = snap.snapshot(ALICE);
        SettAction::deposit_and_withdraw(snap.clone(), ALICE).run().expect("round trip");
        let end = snap.snapshot(ALICE);

        let rewards_diff = end.rewards_want - start.rewards_want;
        prop_assert!(sett_sim::approx_eq(start.user_want, end.user_want + rewards_diff, 1));
        prop_assert_eq!(end.user_shares, start.user_shares);
    }
}

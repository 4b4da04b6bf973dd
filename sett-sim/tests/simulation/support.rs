//! Shared fixtures for simulation tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ops::Range;
use std::rc::Rc;

use rand::distr::{Distribution, StandardUniform, uniform::SampleUniform};
use sett_sim::{
    Address, Amount, InMemorySett, MAX_ALLOWANCE, RandomProvider, SettFaults, SettParams,
    SettProviders, SimRandomProvider, SnapshotManager, Vault, WantToken,
};

/// Random provider returning scripted ratios, then a seeded stream.
#[derive(Clone)]
pub struct ScriptedRandom {
    ratios: Rc<RefCell<VecDeque<f64>>>,
    fallback: SimRandomProvider,
}

impl ScriptedRandom {
    pub fn new(ratios: &[f64]) -> Self {
        Self {
            ratios: Rc::new(RefCell::new(ratios.iter().copied().collect())),
            fallback: SimRandomProvider::new(0),
        }
    }
}

impl RandomProvider for ScriptedRandom {
    fn random<T>(&self) -> T
    where
        StandardUniform: Distribution<T>,
    {
        self.fallback.random()
    }

    fn random_range<T>(&self, range: Range<T>) -> T
    where
        T: SampleUniform + PartialOrd,
    {
        self.fallback.random_range(range)
    }

    fn random_ratio(&self) -> f64 {
        self.ratios
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| self.fallback.random_ratio())
    }
}

/// Unpaused vault with the given fee and dust fault.
pub fn live_sett(fee_bps: u32, dust: Amount) -> InMemorySett {
    let sett = InMemorySett::deploy(SettParams {
        withdrawal_fee_bps: fee_bps,
        faults: SettFaults {
            dust_on_withdraw: dust,
        },
    });
    sett.unpause();
    sett
}

/// Snapshot manager over a fresh vault, `user` funded with `balance`.
pub fn manager_with_user(
    fee_bps: u32,
    dust: Amount,
    user: Address,
    balance: Amount,
) -> SnapshotManager<InMemorySett> {
    let sett = live_sett(fee_bps, dust);
    sett.mint(user, balance).expect("mint");
    SnapshotManager::new(sett)
}

/// Deposit `amount` for `holder` directly, bypassing the manager.
pub fn seed_deposit(sett: &InMemorySett, holder: Address, amount: Amount) {
    sett.mint(holder, amount).expect("mint");
    sett.want()
        .approve(holder, sett.vault().address(), MAX_ALLOWANCE)
        .expect("approve");
    sett.vault().deposit(holder, amount).expect("deposit");
}

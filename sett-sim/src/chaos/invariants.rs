//! Built-in ledger invariants.
//!
//! Both are exact: they compare sums of balances, so no rounding is involved.
//! A sum that does not fit an [`Amount`] is reported as a violation.

use sett_core::{Address, Amount, Controller, SettProviders, Vault, WantToken};

use super::invariant_trait::Invariant;

fn checked_total(
    amounts: impl IntoIterator<Item = Amount>,
    what: &str,
) -> Result<Amount, String> {
    amounts
        .into_iter()
        .try_fold(0, |acc: Amount, amount| acc.checked_add(amount))
        .ok_or_else(|| format!("overflow summing {}", what))
}

/// Share conservation: sum of users' shares == vault total supply.
///
/// Holds as long as only simulated users ever hold shares.
pub struct ShareSupplyConservation;

impl<P: SettProviders> Invariant<P> for ShareSupplyConservation {
    fn name(&self) -> &str {
        "share_supply_conservation"
    }

    fn check(&self, providers: &P, users: &[Address]) -> Result<(), String> {
        let vault = providers.vault();
        let held = checked_total(users.iter().map(|u| vault.balance_of(*u)), "user shares")?;
        let supply = vault.total_supply();
        if held != supply {
            return Err(format!(
                "sum(user shares)={} != total_supply={}",
                held, supply
            ));
        }
        Ok(())
    }
}

/// Want conservation: users + vault + rewards sink hold the whole want supply.
///
/// Any unit that leaves this set (sent to an address nobody accounts for)
/// is a leak.
pub struct WantConservation;

impl<P: SettProviders> Invariant<P> for WantConservation {
    fn name(&self) -> &str {
        "want_conservation"
    }

    fn check(&self, providers: &P, users: &[Address]) -> Result<(), String> {
        let want = providers.want();
        let vault = providers.vault();
        let rewards = vault.controller().rewards();

        let user_total = checked_total(users.iter().map(|u| want.balance_of(*u)), "user want")?;
        let vault_total = want.balance_of(vault.address());
        let rewards_total = want.balance_of(rewards);
        let accounted = checked_total([user_total, vault_total, rewards_total], "held want")?;
        let supply = want.total_supply();

        if accounted != supply {
            return Err(format!(
                "users({}) + vault({}) + rewards({}) = {} != want supply {}",
                user_total, vault_total, rewards_total, accounted, supply
            ));
        }
        Ok(())
    }
}

//! Snapshot manager: deposit/withdraw with before/after accounting checks.
//!
//! Actions never call the vault's deposit or withdraw directly. They go
//! through [`SnapshotManager`], which captures a [`Snapshot`] before and after
//! each call and verifies the deltas the call must produce:
//!
//! | Call | Checks |
//! |------|--------|
//! | `sett_deposit` | user want debited by exactly `amount`, vault credited by exactly `amount`, user shares and total supply grow by the same minted count, minted ≈ `amount * supply / balance`, price per share does not fall |
//! | `sett_withdraw` | user shares and total supply shrink by exactly `shares`, user want does not fall, user + rewards payout ≤ share-proportional redemption |
//!
//! A failed check is returned as a [`ManagerError`] before the caller gets a
//! chance to read "after" balances.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use sett_core::{
    Address, Amount, Controller, LedgerError, SettProviders, Vault, WantToken, mul_div_down,
};
use thiserror::Error;

use crate::chaos::{DEFAULT_TOLERANCE, approx_eq};

/// Externally observable vault state relevant to one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// User's want balance.
    pub user_want: Amount,
    /// User's share balance.
    pub user_shares: Amount,
    /// Vault total share supply.
    pub total_supply: Amount,
    /// Want under vault management.
    pub vault_balance: Amount,
    /// Price per full share (1e18 scale).
    pub price_per_share: Amount,
    /// Want held by the controller's rewards sink.
    pub rewards_want: Amount,
}

/// Kind of manager call, for history and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagerCallKind {
    /// `sett_deposit`.
    Deposit,
    /// `sett_withdraw` (including via `sett_withdraw_all`).
    Withdraw,
}

/// One verified manager call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerCall {
    /// What was called.
    pub kind: ManagerCallKind,
    /// User the call was attributed to.
    pub user: Address,
    /// Want amount (deposit) or shares (withdraw) requested.
    pub amount: Amount,
    /// State before the call.
    pub before: Snapshot,
    /// State after the call.
    pub after: Snapshot,
}

/// Accounting check failures raised by the snapshot manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManagerError {
    /// The underlying ledger call failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// User want did not drop by exactly the deposited amount.
    #[error("deposit of {amount} debited user {user} by {debited} (want {before} -> {after})")]
    DepositDebit {
        /// Depositor.
        user: Address,
        /// Amount deposited.
        amount: Amount,
        /// Observed debit (saturating).
        debited: Amount,
        /// Want before.
        before: Amount,
        /// Want after.
        after: Amount,
    },

    /// Vault balance did not grow by exactly the deposited amount.
    #[error("deposit of {amount} changed vault balance {before} -> {after}")]
    VaultCredit {
        /// Amount deposited.
        amount: Amount,
        /// Vault balance before.
        before: Amount,
        /// Vault balance after.
        after: Amount,
    },

    /// User shares and total supply moved by different amounts.
    #[error("share delta mismatch: user {user_delta:?} vs supply {supply_delta:?}")]
    ShareDelta {
        /// Signed-by-option user delta (`None` when the balance went down).
        user_delta: Option<Amount>,
        /// Signed-by-option supply delta.
        supply_delta: Option<Amount>,
    },

    /// Minted shares disagree with the pre-deposit share price.
    #[error("deposit of {amount} minted {minted} shares, expected {expected} (tolerance {tolerance})")]
    MintRate {
        /// Amount deposited.
        amount: Amount,
        /// Shares minted.
        minted: Amount,
        /// Shares implied by the pre-deposit price.
        expected: Amount,
        /// Tolerance applied.
        tolerance: Amount,
    },

    /// Deposit lowered the price per share for existing holders.
    #[error("price per share fell on deposit: {before} -> {after}")]
    PriceDrop {
        /// Price before.
        before: Amount,
        /// Price after.
        after: Amount,
    },

    /// User shares or total supply did not shrink by exactly `shares`.
    #[error("withdraw of {shares} shares burned user {user_burned:?}, supply {supply_burned:?}")]
    ShareBurn {
        /// Shares requested.
        shares: Amount,
        /// Observed user burn (`None` when the balance went up).
        user_burned: Option<Amount>,
        /// Observed supply burn.
        supply_burned: Option<Amount>,
    },

    /// User want went down on a withdrawal.
    #[error("withdraw debited user {user}: want {before} -> {after}")]
    WithdrawDebit {
        /// Withdrawer.
        user: Address,
        /// Want before.
        before: Amount,
        /// Want after.
        after: Amount,
    },

    /// Rewards sink balance went down on a withdrawal.
    #[error("rewards balance fell on withdraw: {before} -> {after}")]
    RewardsDebit {
        /// Rewards want before.
        before: Amount,
        /// Rewards want after.
        after: Amount,
    },

    /// Payout exceeded what the burned shares were worth.
    #[error("withdraw of {shares} shares paid {paid}, worth {expected} (tolerance {tolerance})")]
    Overpaid {
        /// Shares burned.
        shares: Amount,
        /// User plus rewards payout.
        paid: Amount,
        /// Share-proportional redemption.
        expected: Amount,
        /// Tolerance applied.
        tolerance: Amount,
    },

    /// A check itself overflowed.
    #[error("overflow computing {0}")]
    Overflow(&'static str),
}

/// Performs vault operations on behalf of users and verifies their deltas.
///
/// Cheap to clone; clones share the call counters and, when enabled with
/// [`SnapshotManager::with_history`], the call history.
#[derive(Clone)]
pub struct SnapshotManager<P: SettProviders> {
    providers: P,
    tolerance: Amount,
    deposits: Rc<Cell<usize>>,
    withdrawals: Rc<Cell<usize>>,
    history: Option<Rc<RefCell<Vec<ManagerCall>>>>,
}

impl<P: SettProviders> SnapshotManager<P> {
    /// Create a manager over `providers` with the default tolerance.
    pub fn new(providers: P) -> Self {
        Self::with_tolerance(providers, DEFAULT_TOLERANCE)
    }

    /// Create a manager with an explicit absolute tolerance.
    pub fn with_tolerance(providers: P, tolerance: Amount) -> Self {
        Self {
            providers,
            tolerance,
            deposits: Rc::new(Cell::new(0)),
            withdrawals: Rc::new(Cell::new(0)),
            history: None,
        }
    }

    /// Keep every verified call with its before/after snapshots.
    ///
    /// Off by default; counts are always kept.
    pub fn with_history(mut self) -> Self {
        self.history = Some(Rc::new(RefCell::new(Vec::new())));
        self
    }

    /// Ledger collaborators this manager drives.
    pub fn providers(&self) -> &P {
        &self.providers
    }

    /// Absolute tolerance used by this manager's checks.
    pub fn tolerance(&self) -> Amount {
        self.tolerance
    }

    /// Every verified call so far, oldest first. Empty unless the manager
    /// was built [`with_history`](Self::with_history).
    pub fn history(&self) -> Vec<ManagerCall> {
        self.history
            .as_ref()
            .map(|h| h.borrow().clone())
            .unwrap_or_default()
    }

    /// Number of verified calls of `kind`.
    pub fn call_count(&self, kind: ManagerCallKind) -> usize {
        match kind {
            ManagerCallKind::Deposit => self.deposits.get(),
            ManagerCallKind::Withdraw => self.withdrawals.get(),
        }
    }

    /// Capture the externally observable state for `user`.
    pub fn snapshot(&self, user: Address) -> Snapshot {
        let want = self.providers.want();
        let vault = self.providers.vault();
        let rewards = vault.controller().rewards();
        Snapshot {
            user_want: want.balance_of(user),
            user_shares: vault.balance_of(user),
            total_supply: vault.total_supply(),
            vault_balance: vault.balance(),
            price_per_share: vault.price_per_share(),
            rewards_want: want.balance_of(rewards),
        }
    }

    /// Deposit `amount` want for `user` and verify the result.
    pub fn sett_deposit(&self, amount: Amount, user: Address) -> Result<(), ManagerError> {
        crate::assert_sometimes!(amount == 0, "deposit with zero amount");
        let before = self.snapshot(user);
        self.providers.vault().deposit(user, amount)?;
        let after = self.snapshot(user);

        tracing::debug!(
            %user,
            amount,
            minted = after.user_shares.saturating_sub(before.user_shares),
            "sett_deposit"
        );
        self.confirm_deposit(user, amount, &before, &after)?;
        self.record(ManagerCallKind::Deposit, user, amount, before, after);
        Ok(())
    }

    /// Burn `shares` for `user` and verify the result.
    pub fn sett_withdraw(&self, shares: Amount, user: Address) -> Result<(), ManagerError> {
        crate::assert_sometimes!(shares == 0, "withdraw of zero shares");
        let before = self.snapshot(user);
        self.providers.vault().withdraw(user, shares)?;
        let after = self.snapshot(user);

        tracing::debug!(
            %user,
            shares,
            received = after.user_want.saturating_sub(before.user_want),
            "sett_withdraw"
        );
        self.confirm_withdraw(user, shares, &before, &after)?;
        self.record(ManagerCallKind::Withdraw, user, shares, before, after);
        Ok(())
    }

    /// Burn every share `user` holds and verify the result.
    pub fn sett_withdraw_all(&self, user: Address) -> Result<(), ManagerError> {
        let shares = self.providers.vault().balance_of(user);
        self.sett_withdraw(shares, user)
    }

    fn record(
        &self,
        kind: ManagerCallKind,
        user: Address,
        amount: Amount,
        before: Snapshot,
        after: Snapshot,
    ) {
        let counter = match kind {
            ManagerCallKind::Deposit => &self.deposits,
            ManagerCallKind::Withdraw => &self.withdrawals,
        };
        counter.set(counter.get() + 1);

        if let Some(history) = &self.history {
            history.borrow_mut().push(ManagerCall {
                kind,
                user,
                amount,
                before,
                after,
            });
        }
    }

    fn confirm_deposit(
        &self,
        user: Address,
        amount: Amount,
        before: &Snapshot,
        after: &Snapshot,
    ) -> Result<(), ManagerError> {
        if before.user_want.checked_sub(after.user_want) != Some(amount) {
            return Err(ManagerError::DepositDebit {
                user,
                amount,
                debited: before.user_want.saturating_sub(after.user_want),
                before: before.user_want,
                after: after.user_want,
            });
        }
        if after.vault_balance.checked_sub(before.vault_balance) != Some(amount) {
            return Err(ManagerError::VaultCredit {
                amount,
                before: before.vault_balance,
                after: after.vault_balance,
            });
        }

        let user_delta = after.user_shares.checked_sub(before.user_shares);
        let supply_delta = after.total_supply.checked_sub(before.total_supply);
        let minted = match (user_delta, supply_delta) {
            (Some(u), Some(s)) if u == s => u,
            _ => {
                return Err(ManagerError::ShareDelta {
                    user_delta,
                    supply_delta,
                });
            }
        };

        let expected = if before.total_supply == 0 {
            amount
        } else {
            mul_div_down(amount, before.total_supply, before.vault_balance)
                .ok_or(ManagerError::Overflow("expected mint"))?
        };
        if !approx_eq(minted, expected, self.tolerance) {
            return Err(ManagerError::MintRate {
                amount,
                minted,
                expected,
                tolerance: self.tolerance,
            });
        }

        // Truncated minting can only push the price up.
        if before.total_supply > 0 && after.price_per_share < before.price_per_share {
            return Err(ManagerError::PriceDrop {
                before: before.price_per_share,
                after: after.price_per_share,
            });
        }
        Ok(())
    }

    fn confirm_withdraw(
        &self,
        user: Address,
        shares: Amount,
        before: &Snapshot,
        after: &Snapshot,
    ) -> Result<(), ManagerError> {
        let user_burned = before.user_shares.checked_sub(after.user_shares);
        let supply_burned = before.total_supply.checked_sub(after.total_supply);
        if user_burned != Some(shares) || supply_burned != Some(shares) {
            return Err(ManagerError::ShareBurn {
                shares,
                user_burned,
                supply_burned,
            });
        }

        let received = after
            .user_want
            .checked_sub(before.user_want)
            .ok_or(ManagerError::WithdrawDebit {
                user,
                before: before.user_want,
                after: after.user_want,
            })?;
        let fee = after
            .rewards_want
            .checked_sub(before.rewards_want)
            .ok_or(ManagerError::RewardsDebit {
                before: before.rewards_want,
                after: after.rewards_want,
            })?;
        crate::assert_sometimes!(fee > 0, "fee skimmed on withdraw");
        let paid = received
            .checked_add(fee)
            .ok_or(ManagerError::Overflow("withdraw payout"))?;

        let expected = if shares == 0 {
            0
        } else {
            mul_div_down(shares, before.vault_balance, before.total_supply)
                .ok_or(ManagerError::Overflow("expected redemption"))?
        };
        if paid > expected.saturating_add(self.tolerance) {
            return Err(ManagerError::Overpaid {
                shares,
                paid,
                expected,
                tolerance: self.tolerance,
            });
        }
        Ok(())
    }
}

impl<P: SettProviders> std::fmt::Debug for SnapshotManager<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotManager")
            .field("tolerance", &self.tolerance)
            .field("deposits", &self.deposits.get())
            .field("withdrawals", &self.withdrawals.get())
            .field("history", &self.history.is_some())
            .finish()
    }
}

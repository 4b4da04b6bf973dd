//! Actions an actor can perform against the vault.
//!
//! Every action is constructed by [`UserActor::generate_action`], run once and
//! discarded. Amounts are read from live balances inside [`SettAction::run`],
//! never when the action is produced.
//!
//! [`UserActor::generate_action`]: crate::actor::UserActor::generate_action

use std::fmt;

use sett_core::{
    Address, Amount, Controller, LedgerError, MAX_ALLOWANCE, SettProviders, Vault, WantToken,
};
use thiserror::Error;

use crate::chaos::approx_eq;
use crate::snapshot::{ManagerError, SnapshotManager};

/// Tag of an action variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKind {
    /// Deposit half the user's want.
    Deposit,
    /// Withdraw every share the user holds.
    Withdraw,
    /// Deposit half, then immediately withdraw exactly the minted shares.
    DepositAndWithdraw,
}

impl ActionKind {
    /// All variants, in declaration order.
    pub const ALL: [ActionKind; 3] = [
        ActionKind::Deposit,
        ActionKind::Withdraw,
        ActionKind::DepositAndWithdraw,
    ];

    /// Stable name used in logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Deposit => "Deposit",
            ActionKind::Withdraw => "Withdraw",
            ActionKind::DepositAndWithdraw => "DepositAndWithdraw",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal failure of a single action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Deposit amount exceeded the starting balance.
    #[error("{action}: precondition failed, deposit {deposit_amount} > balance {starting_balance}")]
    Precondition {
        /// Variant that failed.
        action: ActionKind,
        /// User want balance read at run time.
        starting_balance: Amount,
        /// Computed deposit amount.
        deposit_amount: Amount,
    },

    /// Round-trip law violated.
    #[error(
        "round trip lost value: start {starting_balance}, end {ending_balance}, \
         rewards diff {rewards_diff}, tolerance {tolerance}"
    )]
    RoundTripLoss {
        /// User want before the deposit.
        starting_balance: Amount,
        /// User want after the withdrawal.
        ending_balance: Amount,
        /// Change in the rewards sink's want balance.
        rewards_diff: Amount,
        /// Absolute tolerance applied.
        tolerance: Amount,
    },

    /// User share balance went down across a deposit.
    #[error("{action}: shares fell across deposit ({before} -> {after})")]
    ShareUnderflow {
        /// Variant that failed.
        action: ActionKind,
        /// Shares before.
        before: Amount,
        /// Shares after.
        after: Amount,
    },

    /// Rewards sink balance went down across a withdrawal.
    #[error("{action}: rewards balance fell across withdraw ({before} -> {after})")]
    RewardsDecreased {
        /// Variant that failed.
        action: ActionKind,
        /// Rewards want before.
        before: Amount,
        /// Rewards want after.
        after: Amount,
    },

    /// Approving the vault failed.
    #[error("{action}: approve failed: {source}")]
    Approve {
        /// Variant that failed.
        action: ActionKind,
        /// Ledger error.
        source: LedgerError,
    },

    /// A snapshot manager call failed.
    #[error("{action}: {source}")]
    Manager {
        /// Variant that failed.
        action: ActionKind,
        /// Manager error.
        source: ManagerError,
    },
}

/// Deposit `floor(S / 2)` of the user's want balance `S`.
pub struct DepositAction<P: SettProviders> {
    snap: SnapshotManager<P>,
    user: Address,
}

/// Withdraw every share the user holds.
pub struct WithdrawAction<P: SettProviders> {
    snap: SnapshotManager<P>,
    user: Address,
}

/// Deposit half, withdraw exactly what was minted, and check the round trip.
pub struct DepositAndWithdrawAction<P: SettProviders> {
    snap: SnapshotManager<P>,
    user: Address,
}

/// One unit of work produced by an actor.
pub enum SettAction<P: SettProviders> {
    /// See [`DepositAction`].
    Deposit(DepositAction<P>),
    /// See [`WithdrawAction`].
    Withdraw(WithdrawAction<P>),
    /// See [`DepositAndWithdrawAction`].
    DepositAndWithdraw(DepositAndWithdrawAction<P>),
}

impl<P: SettProviders> SettAction<P> {
    /// Build a deposit action.
    pub fn deposit(snap: SnapshotManager<P>, user: Address) -> Self {
        SettAction::Deposit(DepositAction { snap, user })
    }

    /// Build a withdraw-all action.
    pub fn withdraw(snap: SnapshotManager<P>, user: Address) -> Self {
        SettAction::Withdraw(WithdrawAction { snap, user })
    }

    /// Build an interleaved deposit-then-withdraw action.
    pub fn deposit_and_withdraw(snap: SnapshotManager<P>, user: Address) -> Self {
        SettAction::DepositAndWithdraw(DepositAndWithdrawAction { snap, user })
    }

    /// Variant tag.
    pub fn kind(&self) -> ActionKind {
        match self {
            SettAction::Deposit(_) => ActionKind::Deposit,
            SettAction::Withdraw(_) => ActionKind::Withdraw,
            SettAction::DepositAndWithdraw(_) => ActionKind::DepositAndWithdraw,
        }
    }

    /// User the action is attributed to.
    pub fn user(&self) -> Address {
        match self {
            SettAction::Deposit(a) => a.user,
            SettAction::Withdraw(a) => a.user,
            SettAction::DepositAndWithdraw(a) => a.user,
        }
    }

    /// Execute the action. Consumes it; actions never run twice.
    pub fn run(self) -> Result<(), ActionError> {
        match self {
            SettAction::Deposit(a) => a.run(),
            SettAction::Withdraw(a) => a.run(),
            SettAction::DepositAndWithdraw(a) => a.run(),
        }
    }
}

impl<P: SettProviders> fmt::Debug for SettAction<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettAction")
            .field("kind", &self.kind())
            .field("user", &self.user())
            .finish()
    }
}

/// Read the balance, approve the vault and deposit half. Returns
/// `(starting_balance, deposit_amount)`.
fn deposit_half<P: SettProviders>(
    snap: &SnapshotManager<P>,
    user: Address,
    action: ActionKind,
) -> Result<(Amount, Amount), ActionError> {
    let want = snap.providers().want();
    let vault = snap.providers().vault();

    let starting_balance = want.balance_of(user);
    let deposit_amount = starting_balance / 2;
    if deposit_amount > starting_balance {
        return Err(ActionError::Precondition {
            action,
            starting_balance,
            deposit_amount,
        });
    }

    want.approve(user, vault.address(), MAX_ALLOWANCE)
        .map_err(|source| ActionError::Approve { action, source })?;
    snap.sett_deposit(deposit_amount, user)
        .map_err(|source| ActionError::Manager { action, source })?;

    Ok((starting_balance, deposit_amount))
}

impl<P: SettProviders> DepositAction<P> {
    fn run(self) -> Result<(), ActionError> {
        let (starting_balance, deposit_amount) =
            deposit_half(&self.snap, self.user, ActionKind::Deposit)?;
        tracing::debug!(user = %self.user, starting_balance, deposit_amount, "deposit");
        Ok(())
    }
}

impl<P: SettProviders> WithdrawAction<P> {
    fn run(self) -> Result<(), ActionError> {
        let shares = self.snap.providers().vault().balance_of(self.user);
        self.snap
            .sett_withdraw_all(self.user)
            .map_err(|source| ActionError::Manager {
                action: ActionKind::Withdraw,
                source,
            })?;
        tracing::debug!(user = %self.user, shares, "withdraw all");
        Ok(())
    }
}

impl<P: SettProviders> DepositAndWithdrawAction<P> {
    fn run(self) -> Result<(), ActionError> {
        const ACTION: ActionKind = ActionKind::DepositAndWithdraw;
        let snap = &self.snap;
        let user = self.user;
        let want = snap.providers().want();
        let vault = snap.providers().vault();

        let before_shares = vault.balance_of(user);
        let (starting_balance, deposit_amount) = deposit_half(snap, user, ACTION)?;
        let after_shares = vault.balance_of(user);
        let sett_deposited =
            after_shares
                .checked_sub(before_shares)
                .ok_or(ActionError::ShareUnderflow {
                    action: ACTION,
                    before: before_shares,
                    after: after_shares,
                })?;

        let rewards = vault.controller().rewards();
        let before_rewards = want.balance_of(rewards);
        snap.sett_withdraw(sett_deposited, user)
            .map_err(|source| ActionError::Manager {
                action: ACTION,
                source,
            })?;
        let after_rewards = want.balance_of(rewards);
        let rewards_diff =
            after_rewards
                .checked_sub(before_rewards)
                .ok_or(ActionError::RewardsDecreased {
                    action: ACTION,
                    before: before_rewards,
                    after: after_rewards,
                })?;

        let ending_balance = want.balance_of(user);
        let tolerance = snap.tolerance();
        let reconstructed = ending_balance.saturating_add(rewards_diff);

        tracing::debug!(
            %user,
            starting_balance,
            deposit_amount,
            sett_deposited,
            ending_balance,
            rewards_diff,
            "deposit and withdraw"
        );

        crate::assert_sometimes!(reconstructed == starting_balance, "round trip exact");
        if !approx_eq(starting_balance, reconstructed, tolerance) {
            return Err(ActionError::RoundTripLoss {
                starting_balance,
                ending_balance,
                rewards_diff,
                tolerance,
            });
        }
        Ok(())
    }
}

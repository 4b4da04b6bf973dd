//! Per-user actor deciding which action to run next.
//!
//! The actor remembers one bit (whether it left a deposit open) and draws one
//! uniform ratio per tick:
//!
//! ```text
//! r > 0.5                     -> DepositAndWithdraw   (state unchanged)
//! r <= 0.5 and OpenDeposit    -> Withdraw             (-> NoOpenDeposit)
//! r <= 0.5 and NoOpenDeposit  -> Deposit              (-> OpenDeposit)
//! ```

use sett_core::{Address, RandomProvider, SettProviders};

use crate::actions::SettAction;
use crate::snapshot::SnapshotManager;

/// Draws strictly above this produce an interleaved deposit-and-withdraw.
pub const INTERLEAVE_THRESHOLD: f64 = 0.5;

/// Whether the actor's last non-interleaved action left shares in the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepositState {
    /// Next non-interleaved action is a deposit.
    #[default]
    NoOpenDeposit,
    /// Next non-interleaved action is a withdraw-all.
    OpenDeposit,
}

impl DepositState {
    /// True in [`DepositState::OpenDeposit`].
    pub fn has_open_deposit(&self) -> bool {
        matches!(self, DepositState::OpenDeposit)
    }
}

/// A simulated vault user.
pub struct UserActor<P: SettProviders, R: RandomProvider> {
    snap: SnapshotManager<P>,
    user: Address,
    state: DepositState,
    random: R,
}

impl<P: SettProviders, R: RandomProvider> UserActor<P, R> {
    /// Create an actor for `user` in the `NoOpenDeposit` state.
    pub fn new(snap: SnapshotManager<P>, user: Address, random: R) -> Self {
        Self {
            snap,
            user,
            state: DepositState::default(),
            random,
        }
    }

    /// User this actor acts for.
    pub fn user(&self) -> Address {
        self.user
    }

    /// Current deposit state.
    pub fn state(&self) -> DepositState {
        self.state
    }

    /// Produce the next action. Never touches the ledger.
    pub fn generate_action(&mut self) -> SettAction<P> {
        let r = self.random.random_ratio();
        if r > INTERLEAVE_THRESHOLD {
            return SettAction::deposit_and_withdraw(self.snap.clone(), self.user);
        }

        match self.state {
            DepositState::OpenDeposit => {
                self.state = DepositState::NoOpenDeposit;
                SettAction::withdraw(self.snap.clone(), self.user)
            }
            DepositState::NoOpenDeposit => {
                self.state = DepositState::OpenDeposit;
                SettAction::deposit(self.snap.clone(), self.user)
            }
        }
    }
}

impl<P: SettProviders, R: RandomProvider> std::fmt::Debug for UserActor<P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserActor")
            .field("user", &self.user)
            .field("state", &self.state)
            .finish()
    }
}

//! Ledger provider traits.
//!
//! These traits are the narrow surface the simulation drives: balance queries
//! plus the approve/deposit/withdraw commands a user can issue. Every method
//! takes `&self`; implementations are cheap-to-clone handles over shared
//! ledger state, the same way other providers in the framework are.
//!
//! All calls are synchronous. A command either commits fully before it
//! returns or fails with a [`LedgerError`], so a caller can read "after"
//! balances as soon as a command returns `Ok`.

use crate::{Address, Amount, LedgerResult};

/// The underlying ("want") asset a user deposits into a vault.
pub trait WantToken: Clone {
    /// Address of the token contract.
    fn address(&self) -> Address;

    /// Balance of `holder` in base units.
    fn balance_of(&self, holder: Address) -> Amount;

    /// Total amount of the token in existence.
    fn total_supply(&self) -> Amount;

    /// Current allowance `owner` has granted to `spender`.
    fn allowance(&self, owner: Address, spender: Address) -> Amount;

    /// Set the allowance `owner` grants to `spender`.
    ///
    /// Idempotent: approving the same amount twice leaves the same state.
    fn approve(&self, owner: Address, spender: Address, amount: Amount) -> LedgerResult<()>;
}

/// The controller that routes vault funds and designates the rewards sink.
pub trait Controller: Clone {
    /// Address receiving fees skimmed on withdrawal.
    fn rewards(&self) -> Address;
}

/// A share-issuing vault over a want token.
pub trait Vault: Clone {
    /// Controller type returned by [`Vault::controller`].
    type Controller: Controller;

    /// Address of the vault contract.
    fn address(&self) -> Address;

    /// Share balance of `holder`.
    fn balance_of(&self, holder: Address) -> Amount;

    /// Total shares outstanding.
    fn total_supply(&self) -> Amount;

    /// Want held under management (vault plus strategy).
    fn balance(&self) -> Amount;

    /// Want per full share, scaled by [`crate::PRICE_PRECISION`].
    fn price_per_share(&self) -> Amount;

    /// Controller attached to this vault.
    fn controller(&self) -> Self::Controller;

    /// Whether deposits and withdrawals are currently rejected.
    fn paused(&self) -> bool;

    /// Deposit `amount` want from `from`, minting shares to it.
    ///
    /// Requires `from` to have approved the vault for at least `amount`.
    fn deposit(&self, from: Address, amount: Amount) -> LedgerResult<()>;

    /// Burn `shares` from `from` and pay out the corresponding want.
    fn withdraw(&self, from: Address, shares: Amount) -> LedgerResult<()>;

    /// Burn every share held by `from`.
    fn withdraw_all(&self, from: Address) -> LedgerResult<()>;
}

/// Bundle of the ledger collaborators one simulated system exposes.
///
/// # Example
///
/// ```ignore
/// fn rewards_balance<P: SettProviders>(providers: &P) -> Amount {
///     let rewards = providers.vault().controller().rewards();
///     providers.want().balance_of(rewards)
/// }
/// ```
pub trait SettProviders: Clone + 'static {
    /// Want token type.
    type Want: WantToken + 'static;
    /// Controller type.
    type Controller: Controller + 'static;
    /// Vault type.
    type Vault: Vault<Controller = Self::Controller> + 'static;

    /// Get the want token.
    fn want(&self) -> &Self::Want;

    /// Get the vault.
    fn vault(&self) -> &Self::Vault;
}

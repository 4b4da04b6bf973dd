//! In-memory reference vault.
//!
//! A want token, a share-issuing vault and a controller over one shared
//! `Rc<RefCell<SettState>>`. Share math follows the usual vault rules:
//!
//! - deposit mints `amount` shares into an empty vault, otherwise
//!   `floor(amount * total_supply / balance)`
//! - withdraw pays `floor(shares * balance / total_supply)`, minus a
//!   withdrawal fee (basis points) routed to the controller's rewards sink
//!
//! A freshly deployed vault is paused, as a deployment fixture leaves it.
//! [`SettFaults`] lets tests inject defects that a correct vault never has.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use sett_core::{
    Address, Amount, Controller, LedgerError, LedgerResult, MAX_ALLOWANCE, PRICE_PRECISION,
    SettProviders, Vault, WantToken, mul_div_down,
};

/// Address of the in-memory want token.
pub const WANT_ADDRESS: Address = Address::new(0xa0);
/// Address of the in-memory vault.
pub const VAULT_ADDRESS: Address = Address::new(0xb0);
/// Address of the rewards sink designated by the in-memory controller.
pub const REWARDS_ADDRESS: Address = Address::new(0xd0);
/// Address receiving units lost to injected faults.
pub const DEAD_ADDRESS: Address = Address::new(0xdead);

const BPS_PRECISION: Amount = 10_000;

/// Defects the in-memory vault can be told to exhibit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettFaults {
    /// Units silently sent to [`DEAD_ADDRESS`] on every withdrawal.
    ///
    /// Capped by the amount actually redeemed.
    pub dust_on_withdraw: Amount,
}

impl SettFaults {
    /// No faults.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Parameters for deploying an [`InMemorySett`].
#[derive(Debug, Clone, Default)]
pub struct SettParams {
    /// Withdrawal fee in basis points, routed to the rewards sink.
    ///
    /// Capped at 10_000 (100%).
    pub withdrawal_fee_bps: u32,
    /// Injected defects.
    pub faults: SettFaults,
}

#[derive(Debug)]
struct SettState {
    want_balances: BTreeMap<Address, Amount>,
    allowances: BTreeMap<(Address, Address), Amount>,
    want_supply: Amount,
    shares: BTreeMap<Address, Amount>,
    share_supply: Amount,
    paused: bool,
    withdrawal_fee_bps: Amount,
    faults: SettFaults,
}

impl SettState {
    fn want_of(&self, holder: Address) -> Amount {
        self.want_balances.get(&holder).copied().unwrap_or(0)
    }

    fn shares_of(&self, holder: Address) -> Amount {
        self.shares.get(&holder).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> LedgerResult<()> {
        let available = self.want_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                holder: from,
                available,
                requested: amount,
            });
        }
        self.want_balances.insert(from, available - amount);
        credit(&mut self.want_balances, to, amount, "transfer")
    }

    fn spend_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        let allowance = self
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(0);
        if allowance < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner,
                spender,
                allowance,
                requested: amount,
            });
        }
        // Unlimited approvals are never decremented.
        if allowance != MAX_ALLOWANCE {
            self.allowances.insert((owner, spender), allowance - amount);
        }
        Ok(())
    }

    fn pool(&self) -> Amount {
        self.want_of(VAULT_ADDRESS)
    }

    fn deposit(&mut self, from: Address, amount: Amount) -> LedgerResult<Amount> {
        if self.paused {
            return Err(LedgerError::Paused);
        }
        let pool = self.pool();
        let supply = self.share_supply;

        // Validate everything before mutating so a failed call commits nothing.
        let available = self.want_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                holder: from,
                available,
                requested: amount,
            });
        }
        let minted = if supply == 0 {
            amount
        } else {
            mul_div_down(amount, supply, pool).ok_or(LedgerError::MathOverflow("deposit"))?
        };
        let share_supply = supply
            .checked_add(minted)
            .ok_or(LedgerError::MathOverflow("deposit"))?;
        if pool.checked_add(amount).is_none() {
            return Err(LedgerError::MathOverflow("deposit"));
        }

        self.spend_allowance(from, VAULT_ADDRESS, amount)?;
        self.transfer(from, VAULT_ADDRESS, amount)?;
        // Holder shares never exceed the supply, so this cannot overflow.
        *self.shares.entry(from).or_insert(0) += minted;
        self.share_supply = share_supply;
        Ok(minted)
    }

    fn withdraw(&mut self, from: Address, shares: Amount) -> LedgerResult<Amount> {
        if self.paused {
            return Err(LedgerError::Paused);
        }
        let held = self.shares_of(from);
        if held < shares {
            return Err(LedgerError::InsufficientShares {
                holder: from,
                available: held,
                requested: shares,
            });
        }

        let redeemed = if shares == 0 {
            0
        } else {
            mul_div_down(shares, self.pool(), self.share_supply)
                .ok_or(LedgerError::MathOverflow("withdraw"))?
        };
        let fee = mul_div_down(redeemed, self.withdrawal_fee_bps, BPS_PRECISION)
            .ok_or(LedgerError::MathOverflow("withdrawal fee"))?;
        let dust = self.faults.dust_on_withdraw.min(redeemed - fee);

        self.shares.insert(from, held - shares);
        self.share_supply -= shares;
        self.transfer(VAULT_ADDRESS, REWARDS_ADDRESS, fee)?;
        self.transfer(VAULT_ADDRESS, DEAD_ADDRESS, dust)?;
        self.transfer(VAULT_ADDRESS, from, redeemed - fee - dust)?;
        Ok(redeemed)
    }
}

fn credit(
    balances: &mut BTreeMap<Address, Amount>,
    to: Address,
    amount: Amount,
    op: &'static str,
) -> LedgerResult<()> {
    let balance = balances.entry(to).or_insert(0);
    *balance = balance
        .checked_add(amount)
        .ok_or(LedgerError::MathOverflow(op))?;
    Ok(())
}

/// Want token handle of an [`InMemorySett`].
#[derive(Clone, Debug)]
pub struct MemoryWant {
    state: Rc<RefCell<SettState>>,
}

impl WantToken for MemoryWant {
    fn address(&self) -> Address {
        WANT_ADDRESS
    }

    fn balance_of(&self, holder: Address) -> Amount {
        self.state.borrow().want_of(holder)
    }

    fn total_supply(&self) -> Amount {
        self.state.borrow().want_supply
    }

    fn allowance(&self, owner: Address, spender: Address) -> Amount {
        self.state
            .borrow()
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(0)
    }

    fn approve(&self, owner: Address, spender: Address, amount: Amount) -> LedgerResult<()> {
        self.state
            .borrow_mut()
            .allowances
            .insert((owner, spender), amount);
        Ok(())
    }
}

/// Controller handle of an [`InMemorySett`].
#[derive(Clone, Debug)]
pub struct MemoryController {
    rewards: Address,
}

impl Controller for MemoryController {
    fn rewards(&self) -> Address {
        self.rewards
    }
}

/// Vault handle of an [`InMemorySett`].
#[derive(Clone, Debug)]
pub struct MemoryVault {
    state: Rc<RefCell<SettState>>,
}

impl Vault for MemoryVault {
    type Controller = MemoryController;

    fn address(&self) -> Address {
        VAULT_ADDRESS
    }

    fn balance_of(&self, holder: Address) -> Amount {
        self.state.borrow().shares_of(holder)
    }

    fn total_supply(&self) -> Amount {
        self.state.borrow().share_supply
    }

    fn balance(&self) -> Amount {
        self.state.borrow().pool()
    }

    fn price_per_share(&self) -> Amount {
        let state = self.state.borrow();
        if state.share_supply == 0 {
            return PRICE_PRECISION;
        }
        // Saturates only past 3.4e20 want per share.
        mul_div_down(state.pool(), PRICE_PRECISION, state.share_supply).unwrap_or(Amount::MAX)
    }

    fn controller(&self) -> MemoryController {
        MemoryController {
            rewards: REWARDS_ADDRESS,
        }
    }

    fn paused(&self) -> bool {
        self.state.borrow().paused
    }

    fn deposit(&self, from: Address, amount: Amount) -> LedgerResult<()> {
        let minted = self.state.borrow_mut().deposit(from, amount)?;
        tracing::trace!(%from, amount, minted, "in-memory deposit");
        Ok(())
    }

    fn withdraw(&self, from: Address, shares: Amount) -> LedgerResult<()> {
        let redeemed = self.state.borrow_mut().withdraw(from, shares)?;
        tracing::trace!(%from, shares, redeemed, "in-memory withdraw");
        Ok(())
    }

    fn withdraw_all(&self, from: Address) -> LedgerResult<()> {
        let shares = self.balance_of(from);
        self.withdraw(from, shares)
    }
}

/// In-memory sett system: want token, vault and controller sharing one state.
///
/// # Example
///
/// ```
/// use sett_sim::{Address, MAX_ALLOWANCE, SettProviders, Vault, WantToken};
/// use sett_sim::ledger::{InMemorySett, SettParams};
///
/// let sett = InMemorySett::deploy(SettParams::default());
/// let alice = Address::user(0);
/// sett.mint(alice, 1_000).unwrap();
/// sett.unpause();
///
/// sett.want().approve(alice, sett.vault().address(), MAX_ALLOWANCE).unwrap();
/// sett.vault().deposit(alice, 400).unwrap();
/// assert_eq!(sett.vault().balance_of(alice), 400);
/// assert_eq!(sett.want().balance_of(alice), 600);
/// ```
#[derive(Clone, Debug)]
pub struct InMemorySett {
    state: Rc<RefCell<SettState>>,
    want: MemoryWant,
    vault: MemoryVault,
}

impl InMemorySett {
    /// Deploy a new, paused system.
    pub fn deploy(params: SettParams) -> Self {
        let state = Rc::new(RefCell::new(SettState {
            want_balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            want_supply: 0,
            shares: BTreeMap::new(),
            share_supply: 0,
            paused: true,
            withdrawal_fee_bps: Amount::from(params.withdrawal_fee_bps).min(BPS_PRECISION),
            faults: params.faults,
        }));
        Self {
            want: MemoryWant {
                state: state.clone(),
            },
            vault: MemoryVault {
                state: state.clone(),
            },
            state,
        }
    }

    /// Mint want to `to` (faucet).
    ///
    /// Fails with [`LedgerError::MathOverflow`] if the want supply would
    /// exceed [`Amount::MAX`]; nothing is minted in that case.
    pub fn mint(&self, to: Address, amount: Amount) -> LedgerResult<()> {
        let mut state = self.state.borrow_mut();
        let supply = state
            .want_supply
            .checked_add(amount)
            .ok_or(LedgerError::MathOverflow("mint"))?;
        // Every balance is bounded by the supply.
        credit(&mut state.want_balances, to, amount, "mint")?;
        state.want_supply = supply;
        Ok(())
    }

    /// Simulate strategy yield: new want lands in the vault, raising the
    /// price per share for every holder.
    pub fn harvest(&self, amount: Amount) -> LedgerResult<()> {
        self.mint(VAULT_ADDRESS, amount)
    }

    /// Reject deposits and withdrawals.
    pub fn pause(&self) {
        self.state.borrow_mut().paused = true;
    }

    /// Accept deposits and withdrawals.
    pub fn unpause(&self) {
        self.state.borrow_mut().paused = false;
    }

    /// Replace the injected faults.
    pub fn set_faults(&self, faults: SettFaults) {
        self.state.borrow_mut().faults = faults;
    }
}

impl SettProviders for InMemorySett {
    type Want = MemoryWant;
    type Controller = MemoryController;
    type Vault = MemoryVault;

    fn want(&self) -> &MemoryWant {
        &self.want
    }

    fn vault(&self) -> &MemoryVault {
        &self.vault
    }
}

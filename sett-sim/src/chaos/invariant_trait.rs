//! Trait-based invariant system for simulation testing.
//!
//! Invariants are checked after every tick against the live ledger. Unlike
//! the per-action round-trip law, they validate cross-user properties.

use sett_core::{Address, SettProviders};

/// A named invariant over the whole simulated ledger.
///
/// # Example
///
/// ```ignore
/// struct VaultNeverEmptyWithShares;
///
/// impl<P: SettProviders> Invariant<P> for VaultNeverEmptyWithShares {
///     fn name(&self) -> &str { "vault_never_empty_with_shares" }
///     fn check(&self, providers: &P, _users: &[Address]) -> Result<(), String> {
///         let vault = providers.vault();
///         if vault.total_supply() > 0 && vault.balance() == 0 {
///             return Err("shares outstanding over an empty vault".to_string());
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Invariant<P: SettProviders> {
    /// The human-readable name of this invariant.
    fn name(&self) -> &str;

    /// Check this invariant against the ledger after a tick.
    ///
    /// `users` lists every simulated user in the iteration. Returns a message
    /// with the compared values on violation.
    fn check(&self, providers: &P, users: &[Address]) -> Result<(), String>;
}

/// Create a boxed invariant from a name and closure.
///
/// # Example
///
/// ```ignore
/// let inv = invariant_fn("vault_not_paused", |providers: &InMemorySett, _users| {
///     if providers.vault().paused() { Err("paused mid-run".into()) } else { Ok(()) }
/// });
/// ```
pub fn invariant_fn<P, F>(name: &str, check: F) -> Box<dyn Invariant<P>>
where
    P: SettProviders,
    F: Fn(&P, &[Address]) -> Result<(), String> + 'static,
{
    Box::new(FnInvariant {
        name: name.to_string(),
        check,
    })
}

struct FnInvariant<F> {
    name: String,
    check: F,
}

impl<P, F> Invariant<P> for FnInvariant<F>
where
    P: SettProviders,
    F: Fn(&P, &[Address]) -> Result<(), String>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, providers: &P, users: &[Address]) -> Result<(), String> {
        (self.check)(providers, users)
    }
}

//! Error types for ledger calls and simulation campaigns.

use thiserror::Error;

use crate::{Address, Amount};

/// Failures reported by a ledger collaborator (vault, want token, controller).
///
/// The simulation never recovers from these: they are propagated as-is to
/// the tick that issued the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The vault is paused and rejects deposits and withdrawals.
    #[error("vault is paused")]
    Paused,

    /// A holder tried to move more want than it owns.
    #[error("insufficient balance for {holder}: have {available}, need {requested}")]
    InsufficientBalance {
        /// Account being debited.
        holder: Address,
        /// Balance at the time of the call.
        available: Amount,
        /// Amount requested.
        requested: Amount,
    },

    /// A spender tried to pull more want than it was approved for.
    #[error("insufficient allowance from {owner} to {spender}: have {allowance}, need {requested}")]
    InsufficientAllowance {
        /// Token owner.
        owner: Address,
        /// Approved spender.
        spender: Address,
        /// Current allowance.
        allowance: Amount,
        /// Amount requested.
        requested: Amount,
    },

    /// A holder tried to burn more shares than it owns.
    #[error("insufficient shares for {holder}: have {available}, need {requested}")]
    InsufficientShares {
        /// Share holder.
        holder: Address,
        /// Shares held at the time of the call.
        available: Amount,
        /// Shares requested.
        requested: Amount,
    },

    /// Share or fee math overflowed, or divided by an empty pool.
    #[error("math overflow in {0}")]
    MathOverflow(&'static str),
}

/// Result alias for ledger calls.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Campaign-level failures surfaced by the simulation runner.
///
/// Every failing iteration carries one of these in its report entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// An action failed during a tick. Fatal for the iteration.
    #[error("seed={seed} tick={tick} user={user} action={action}: {reason}")]
    ActionFailed {
        /// Iteration seed, for replay.
        seed: u64,
        /// Tick index within the iteration.
        tick: u64,
        /// User whose action failed.
        user: Address,
        /// Name of the executing action variant.
        action: String,
        /// Rendered failure including the literal values involved.
        reason: String,
    },

    /// A ledger-wide invariant did not hold after a tick.
    #[error("invariant '{name}' violated: {message}")]
    InvariantViolated {
        /// Invariant name.
        name: String,
        /// Description with the compared values.
        message: String,
    },

    /// A ledger call failed outside of an action (fixture setup).
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Invalid campaign configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The simulation reached a state it cannot continue from.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// I/O failure while loading configuration.
    #[error("io error: {0}")]
    Io(String),

    /// Configuration file is not valid JSON for the expected schema.
    #[error("json error: {0}")]
    Json(String),
}

/// Result alias for simulation operations.
pub type SimulationResult<T> = Result<T, SimulationError>;

impl From<std::io::Error> for SimulationError {
    fn from(err: std::io::Error) -> Self {
        SimulationError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SimulationError {
    fn from(err: serde_json::Error) -> Self {
        SimulationError::Json(err.to_string())
    }
}

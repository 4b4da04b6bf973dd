//! Campaign configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "users": 5, "ticks": 1000, "withdrawal_fee_bps": 20 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use sett_core::{Amount, SimulationError, SimulationResult};

use crate::ledger::SettFaults;

/// Parameters of a simulation campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    /// Actors per iteration.
    pub users: usize,
    /// Ticks per iteration; one tick runs one action for one actor.
    pub ticks: u64,
    /// Number of iterations (seeds) to run.
    pub iterations: usize,
    /// Explicit seeds, used before any generated seed.
    pub seeds: Vec<u64>,
    /// Want minted to each user at genesis.
    pub initial_balance: Amount,
    /// Withdrawal fee routed to the rewards sink, in basis points.
    pub withdrawal_fee_bps: u32,
    /// Absolute tolerance for the round-trip law and manager checks.
    pub tolerance: Amount,
    /// Defects injected into the in-memory vault.
    pub faults: SettFaults,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            users: 3,
            ticks: 200,
            iterations: 10,
            seeds: Vec::new(),
            initial_balance: 1_000_000,
            withdrawal_fee_bps: 0,
            tolerance: 1,
            faults: SettFaults::none(),
        }
    }
}

impl CampaignConfig {
    /// Load and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> SimulationResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot run.
    pub fn validate(&self) -> SimulationResult<()> {
        if self.users == 0 {
            return Err(SimulationError::Config("users must be at least 1".into()));
        }
        let Ok(users) = u32::try_from(self.users) else {
            return Err(SimulationError::Config(format!(
                "users {} exceeds {}",
                self.users,
                u32::MAX
            )));
        };
        if self.initial_balance.checked_mul(Amount::from(users)).is_none() {
            return Err(SimulationError::Config(format!(
                "{} users x initial_balance {} overflows the want supply",
                self.users, self.initial_balance
            )));
        }
        if self.iterations == 0 && self.seeds.is_empty() {
            return Err(SimulationError::Config(
                "iterations must be at least 1".into(),
            ));
        }
        if self.withdrawal_fee_bps > 10_000 {
            return Err(SimulationError::Config(format!(
                "withdrawal_fee_bps {} exceeds 10000",
                self.withdrawal_fee_bps
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CampaignConfig::default();
        assert_eq!(config.users, 3);
        assert_eq!(config.ticks, 200);
        assert_eq!(config.tolerance, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CampaignConfig =
            serde_json::from_str(r#"{"users": 5, "withdrawal_fee_bps": 20}"#).expect("parse");
        assert_eq!(config.users, 5);
        assert_eq!(config.withdrawal_fee_bps, 20);
        assert_eq!(config.initial_balance, 1_000_000);
        assert_eq!(config.faults, SettFaults::none());
    }

    #[test]
    fn test_faults_from_json() {
        let config: CampaignConfig =
            serde_json::from_str(r#"{"faults": {"dust_on_withdraw": 3}}"#).expect("parse");
        assert_eq!(config.faults.dust_on_withdraw, 3);
    }

    #[test]
    fn test_validate_rejects() {
        let zero_users = CampaignConfig {
            users: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_users.validate(),
            Err(SimulationError::Config(_))
        ));

        let huge_fee = CampaignConfig {
            withdrawal_fee_bps: 10_001,
            ..Default::default()
        };
        assert!(huge_fee.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unmintable_supply() {
        let config = CampaignConfig {
            users: 2,
            initial_balance: Amount::MAX / 2 + 1,
            ..Default::default()
        };
        let err = config.validate().expect_err("supply overflow");
        assert!(err.to_string().contains("overflows the want supply"), "{err}");

        let single = CampaignConfig {
            users: 1,
            initial_balance: Amount::MAX,
            ..Default::default()
        };
        assert!(single.validate().is_ok());

        let wei = CampaignConfig {
            initial_balance: 1_000 * sett_core::PRICE_PRECISION,
            ..Default::default()
        };
        assert!(wei.validate().is_ok());
    }

    #[test]
    fn test_from_missing_file() {
        let err = CampaignConfig::from_json_file("/nonexistent/sett-campaign.json")
            .expect_err("missing file");
        assert!(matches!(err, SimulationError::Io(_)));
    }
}

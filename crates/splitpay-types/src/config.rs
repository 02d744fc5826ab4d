//! Ledger configuration.

use serde::{Deserialize, Serialize};

use crate::{constants, AccountId, Result, SplitpayError};

/// Engine-wide settings. Bills themselves carry no configuration beyond their funding mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// The account that holds escrowed funds and pays beneficiaries.
    pub custody_account: AccountId,
    /// Upper bound on a fixed-split payer list.
    pub max_payers: usize,
    /// Refuse fixed-split bills whose total does not divide evenly among the
    /// payers. Off by default: such bills are accepted and can never be fully
    /// funded.
    pub reject_indivisible_split: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            custody_account: AccountId::custody(),
            max_payers: constants::DEFAULT_MAX_PAYERS,
            reject_indivisible_split: false,
        }
    }
}

impl LedgerConfig {
    /// Parse a config from JSON and validate it. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// Returns `Configuration` if `max_payers` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_payers == 0 {
            return Err(SplitpayError::Configuration(
                "max_payers must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

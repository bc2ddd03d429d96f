//! Ledger configuration
//!
//! Behaviours the reference model leaves open are selected here rather than
//! hard-coded. Every field has a default, so an empty JSON object is a valid
//! configuration.

use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};

/// Whether a published output may be referenced by more than one spend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpentOutputPolicy {
    /// Nothing records consumption; the same output may be spent repeatedly
    #[default]
    AllowReuse,
    /// An output is consumed by the first spend admitted against it
    Track,
}

/// Which pending transactions may be confirmed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationPolicy {
    #[default]
    AnyPending,
    /// Only zero-input transactions confirm (reduced model)
    CoinbaseOnly,
}

/// Which relative timelocks a timelocked multisig output may carry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelockPolicy {
    /// Any value up to `MAX_RELATIVE_TIMELOCK`
    #[default]
    Arbitrary,
    /// Only `MAX_RELATIVE_TIMELOCK`
    MaximumOnly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    pub spent_outputs: SpentOutputPolicy,
    pub confirmation: ConfirmationPolicy,
    pub timelock: TimelockPolicy,
}

impl LedgerConfig {
    /// Settings that reproduce the reference model exactly
    pub fn reference_model() -> Self {
        Self {
            spent_outputs: SpentOutputPolicy::AllowReuse,
            confirmation: ConfirmationPolicy::CoinbaseOnly,
            timelock: TimelockPolicy::MaximumOnly,
        }
    }

    pub fn with_spent_outputs(mut self, policy: SpentOutputPolicy) -> Self {
        self.spent_outputs = policy;
        self
    }

    pub fn with_confirmation(mut self, policy: ConfirmationPolicy) -> Self {
        self.confirmation = policy;
        self
    }

    pub fn with_timelock(mut self, policy: TimelockPolicy) -> Self {
        self.timelock = policy;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LedgerError::Config(e.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn tracks_spent_outputs(&self) -> bool {
        self.spent_outputs == SpentOutputPolicy::Track
    }
}

//! Ledger configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{HolderId, LedgerError};

/// Protocol version constant
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Global ledger parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// How many days past today a reservation may target
    #[serde(default = "default_max_advance_days")]
    pub max_advance_days: u64,
    /// Price of one resource unit, multiplied into every redemption
    #[serde(default = "default_cost_per_resource_unit")]
    pub cost_per_resource_unit: u128,
    /// Resource units one redeemed token frees, used to size batches
    #[serde(default = "default_per_token_resource_yield")]
    pub per_token_resource_yield: u128,
    /// Bias (in thousandths of a token) added before flooring batch estimates
    #[serde(default = "default_rounding_bias")]
    pub rounding_bias: u128,
    /// Most recent events kept in memory; older ones are dropped
    #[serde(default = "default_max_events")]
    pub max_events: usize,
    /// Only identity allowed through the admin facade
    pub owner: HolderId,
    /// Where the server persists ledger state
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
    /// Protocol version
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_max_advance_days() -> u64 {
    7
}

fn default_cost_per_resource_unit() -> u128 {
    1
}

fn default_per_token_resource_yield() -> u128 {
    24_000
}

fn default_rounding_bias() -> u128 {
    500
}

fn default_max_events() -> usize {
    10_000
}

fn default_version() -> String {
    PROTOCOL_VERSION.to_string()
}

impl LedgerConfig {
    /// Default parameters owned by `owner`
    pub fn new(owner: HolderId) -> Self {
        Self {
            owner,
            ..Self::default()
        }
    }

    pub fn with_owner(mut self, owner: HolderId) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_max_advance_days(mut self, days: u64) -> Self {
        self.max_advance_days = days;
        self
    }

    pub fn with_cost_per_resource_unit(mut self, cost: u128) -> Self {
        self.cost_per_resource_unit = cost;
        self
    }

    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Reject parameters the ledger cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.owner.is_zero() {
            return Err(LedgerError::InvalidConfig(
                "owner must be a non-zero identity".to_string(),
            ));
        }
        if self.per_token_resource_yield == 0 {
            return Err(LedgerError::InvalidConfig(
                "per_token_resource_yield must be non-zero".to_string(),
            ));
        }
        if self.version != PROTOCOL_VERSION {
            return Err(LedgerError::InvalidConfig(format!(
                "unsupported version {}, expected {}",
                self.version, PROTOCOL_VERSION
            )));
        }
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_advance_days: default_max_advance_days(),
            cost_per_resource_unit: default_cost_per_resource_unit(),
            per_token_resource_yield: default_per_token_resource_yield(),
            rounding_bias: default_rounding_bias(),
            max_events: default_max_events(),
            owner: HolderId::ZERO,
            snapshot_path: None,
            version: default_version(),
        }
    }
}

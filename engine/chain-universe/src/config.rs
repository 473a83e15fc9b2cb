//! Configuration for chain universe selection

use crate::error::SelectionError;
use crate::filter::ContractFilterSpec;
use crate::types::{AssetClass, UniverseSettings};
use crate::DEFAULT_REFRESH_INTERVAL_SECS;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a chain universe selection model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Seconds between universe refreshes (0 = refresh on every poll)
    pub refresh_interval_secs: u64,

    /// Asset class the selector must return
    pub asset_class: AssetClass,

    /// Subscription settings; engine defaults apply when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universe_settings: Option<UniverseSettings>,

    /// Fixed contract filter attached to every chain; identity when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_filter: Option<ContractFilterSpec>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            asset_class: AssetClass::Future,
            universe_settings: None,
            contract_filter: None,
        }
    }
}

impl SelectionConfig {
    /// Get refresh interval as a chrono Duration
    pub fn refresh_interval(&self) -> Result<chrono::Duration, SelectionError> {
        let secs = i64::try_from(self.refresh_interval_secs).map_err(|_| {
            SelectionError::Config(format!(
                "refresh_interval_secs {} is out of range",
                self.refresh_interval_secs
            ))
        })?;
        chrono::Duration::try_seconds(secs).ok_or_else(|| {
            SelectionError::Config(format!("refresh_interval_secs {secs} is out of range"))
        })
    }

    pub fn validate(&self) -> Result<(), SelectionError> {
        self.refresh_interval()?;
        if let Some(settings) = &self.universe_settings {
            if !(settings.leverage.is_finite() && settings.leverage > 0.0) {
                return Err(SelectionError::Config(format!(
                    "leverage must be positive, got {}",
                    settings.leverage
                )));
            }
        }
        Ok(())
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SelectionError> {
        let content = std::fs::read_to_string(path)?;
        let config: SelectionConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), SelectionError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

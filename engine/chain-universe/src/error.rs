//! Error types for chain universe selection

use crate::types::{AssetClass, InstrumentId};
use thiserror::Error;

/// Errors that can occur while selecting chain universes
#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("selector must return symbols of the configured asset class: expected {expected}, got {actual} for {symbol}")]
    InvalidArgument { expected: AssetClass, actual: AssetClass, symbol: InstrumentId },

    #[error("Symbol selector failed: {0}")]
    Selector(#[source] anyhow::Error),

    #[error("Security provisioning failed: {0}")]
    Provisioning(#[source] anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl SelectionError {
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, SelectionError::InvalidArgument { .. })
    }
}

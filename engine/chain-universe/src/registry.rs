//! Security registry and subscription-configuration collaborators.
//!
//! Both belong to the host engine; the traits describe the only calls the
//! selection core makes against them. The in-memory implementations back the
//! simulated engine and the tests.

use crate::filter::{ContractFilter, IdentityFilter};
use crate::types::{ChainSecurity, InstrumentId, Resolution};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Subscription configuration produced by the subscription service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionDataConfig {
    pub symbol: InstrumentId,
    pub resolution: Resolution,
    pub fill_forward: bool,
    pub extended_market_hours: bool,
    pub is_internal: bool,
}

/// Engine-owned store of securities keyed by identifier
pub trait SecurityRegistry {
    fn get(&self, symbol: &InstrumentId) -> Option<Arc<ChainSecurity>>;

    /// Materialize a security from `config` and keep it in the registry
    fn create_security(
        &mut self,
        symbol: &InstrumentId,
        config: SubscriptionDataConfig,
        leverage: f64,
        seed_data: bool,
    ) -> anyhow::Result<Arc<ChainSecurity>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Engine service that creates subscription configurations
pub trait SubscriptionConfigService {
    fn add(
        &mut self,
        symbol: &InstrumentId,
        resolution: Resolution,
        fill_forward: bool,
        extended_market_hours: bool,
        is_internal: bool,
    ) -> anyhow::Result<SubscriptionDataConfig>;
}

/// Registry entry for a security
struct SecurityEntry {
    security: Arc<ChainSecurity>,
    seeded: bool,
}

/// In-memory security registry
#[derive(Default)]
pub struct InMemorySecurityRegistry {
    entries: HashMap<InstrumentId, SecurityEntry>,
    creations: u64,
}

impl InMemorySecurityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `create_security` calls that produced a new security
    pub fn creations(&self) -> u64 {
        self.creations
    }

    pub fn contains(&self, symbol: &InstrumentId) -> bool {
        self.entries.contains_key(symbol)
    }

    pub fn is_seeded(&self, symbol: &InstrumentId) -> bool {
        self.entries.get(symbol).map(|entry| entry.seeded).unwrap_or(false)
    }

    pub fn symbols(&self) -> Vec<InstrumentId> {
        self.entries.keys().cloned().collect()
    }
}

impl SecurityRegistry for InMemorySecurityRegistry {
    fn get(&self, symbol: &InstrumentId) -> Option<Arc<ChainSecurity>> {
        self.entries.get(symbol).map(|entry| Arc::clone(&entry.security))
    }

    fn create_security(
        &mut self,
        symbol: &InstrumentId,
        config: SubscriptionDataConfig,
        leverage: f64,
        seed_data: bool,
    ) -> anyhow::Result<Arc<ChainSecurity>> {
        if self.entries.contains_key(symbol) {
            anyhow::bail!("Security {symbol} already registered");
        }

        let filter: Arc<dyn ContractFilter> = Arc::new(IdentityFilter);
        let security = Arc::new(ChainSecurity::new(symbol.clone(), config, leverage, filter));
        self.entries.insert(
            symbol.clone(),
            SecurityEntry { security: Arc::clone(&security), seeded: seed_data },
        );
        self.creations += 1;

        debug!("Registered security {} ({} total)", symbol, self.entries.len());
        Ok(security)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// In-memory subscription service that records every configuration it hands out
#[derive(Debug, Default)]
pub struct InMemorySubscriptionService {
    configs: Vec<SubscriptionDataConfig>,
}

impl InMemorySubscriptionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configs(&self) -> &[SubscriptionDataConfig] {
        &self.configs
    }
}

impl SubscriptionConfigService for InMemorySubscriptionService {
    fn add(
        &mut self,
        symbol: &InstrumentId,
        resolution: Resolution,
        fill_forward: bool,
        extended_market_hours: bool,
        is_internal: bool,
    ) -> anyhow::Result<SubscriptionDataConfig> {
        let config = SubscriptionDataConfig {
            symbol: symbol.clone(),
            resolution,
            fill_forward,
            extended_market_hours,
            is_internal,
        };
        self.configs.push(config.clone());
        Ok(config)
    }
}

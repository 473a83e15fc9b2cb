//! # Chain Universe
//!
//! Selects which contract chains a trading engine subscribes to and re-runs
//! that selection on a fixed cadence.
//!
//! A caller-supplied [`SymbolSelector`] proposes instruments; the
//! [`ChainUniverseSelectionModel`] rewrites them to one canonical chain
//! identifier per underlying, creates each chain's security at most once, and
//! hands the host one [`ChainUniverse`] per chain.
//!
//! The [`RsiAlphaModel`] consumes the resulting [`SecurityChanges`] and emits
//! directional insights for the chains it tracks.

pub mod alpha;
pub mod canonical;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod indicator;
pub mod metrics;
pub mod model;
pub mod provisioner;
pub mod registry;
pub mod schedule;
pub mod selector;
pub mod symbol;
pub mod types;


#[cfg(test)]
mod integration_tests;

pub use alpha::{
    InMemoryPriceHistory, Insight, InsightDirection, PriceBar, PriceHistory, RsiAlphaConfig,
    RsiAlphaModel, RsiState,
};
pub use canonical::canonicalize;
pub use config::SelectionConfig;
pub use engine::{SelectionContext, SimulatedEngine};
pub use error::SelectionError;
pub use filter::{ContractFilter, ContractFilterSpec, FixedFilter, IdentityFilter};
pub use indicator::RelativeStrengthIndex;
pub use metrics::SelectionMetrics;
pub use model::ChainUniverseSelectionModel;
pub use provisioner::{Provisioned, SecurityProvisioner};
pub use registry::{
    InMemorySecurityRegistry, InMemorySubscriptionService, SecurityRegistry,
    SubscriptionConfigService, SubscriptionDataConfig,
};
pub use schedule::RefreshSchedule;
pub use selector::{StaticSelector, SymbolSelector};
pub use symbol::parse_future_ticker;
pub use types::{
    AssetClass, ChainSecurity, ChainUniverse, InstrumentId, Resolution, SecurityChanges,
    UniverseSettings,
};

use chrono::{DateTime, Utc};

/// Default refresh interval (one day)
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Contract between a host engine and a universe selection model
pub trait UniverseSelectionModel {
    /// When the host should next call `create_universes`
    fn next_refresh_time_utc(&self) -> DateTime<Utc>;

    /// Run selection and return one universe per selected chain
    fn create_universes(
        &mut self,
        ctx: &mut SelectionContext<'_>,
    ) -> Result<Vec<ChainUniverse>, SelectionError>;
}

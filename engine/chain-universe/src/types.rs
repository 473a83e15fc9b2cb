use crate::filter::{ContractFilter, ContractFilterSpec};
use crate::registry::SubscriptionDataConfig;
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Prefix that marks a canonical chain value (e.g. "/ES")
pub const CANONICAL_PREFIX: char = '/';

/// Asset class of a tradable instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Equity,
    Option,
    Future,
    FutureOption,
    IndexOption,
    Forex,
    Crypto,
    Cfd,
    Index,
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetClass::Equity => "equity",
            AssetClass::Option => "option",
            AssetClass::Future => "future",
            AssetClass::FutureOption => "future_option",
            AssetClass::IndexOption => "index_option",
            AssetClass::Forex => "forex",
            AssetClass::Crypto => "crypto",
            AssetClass::Cfd => "cfd",
            AssetClass::Index => "index",
        };
        f.write_str(name)
    }
}

/// Immutable identifier of a tradable instrument.
///
/// Equality is structural: two identifiers are equal when every field matches,
/// which is what chain deduplication relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstrumentId {
    pub asset_class: AssetClass,
    pub market: String,
    pub raw_value: String,
    /// Expiry of a concrete contract; always `None` for canonical identifiers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<NaiveDate>,
    pub is_canonical: bool,
}

impl InstrumentId {
    pub fn new(
        asset_class: AssetClass,
        raw_value: impl Into<String>,
        market: impl Into<String>,
        expiry: Option<NaiveDate>,
        is_canonical: bool,
    ) -> Self {
        Self {
            asset_class,
            market: market.into(),
            raw_value: raw_value.into(),
            expiry,
            is_canonical,
        }
    }

    /// Concrete future without a known expiry
    pub fn future(root: impl Into<String>, market: impl Into<String>) -> Self {
        Self::new(AssetClass::Future, root, market, None, false)
    }

    /// Concrete future contract expiring on `expiry`
    pub fn future_contract(
        root: impl Into<String>,
        market: impl Into<String>,
        expiry: NaiveDate,
    ) -> Self {
        Self::new(AssetClass::Future, root, market, Some(expiry), false)
    }

    /// Canonical chain identifier for `root`; the raw value becomes "/{root}"
    pub fn canonical(asset_class: AssetClass, root: &str, market: impl Into<String>) -> Self {
        let root = root.trim_start_matches(CANONICAL_PREFIX);
        Self::new(asset_class, format!("{CANONICAL_PREFIX}{root}"), market, None, true)
    }

    /// Underlying root without the canonical prefix
    pub fn root(&self) -> &str {
        self.raw_value.trim_start_matches(CANONICAL_PREFIX)
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expiry {
            Some(expiry) => write!(f, "{} {} {}", self.raw_value, expiry, self.market),
            None => write!(f, "{} {}", self.raw_value, self.market),
        }
    }
}

/// Data granularity for subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Tick,
    Second,
    Minute,
    Hour,
    Daily,
}

impl Resolution {
    /// Length of one bar; ticks have no fixed length
    pub fn bar_duration(self) -> chrono::Duration {
        match self {
            Resolution::Tick => chrono::Duration::zero(),
            Resolution::Second => chrono::Duration::seconds(1),
            Resolution::Minute => chrono::Duration::minutes(1),
            Resolution::Hour => chrono::Duration::hours(1),
            Resolution::Daily => chrono::Duration::days(1),
        }
    }
}

/// Attributes of the subscriptions created for a universe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseSettings {
    /// Data granularity
    pub resolution: Resolution,

    /// Fill gaps with the previous value
    pub fill_forward: bool,

    /// Include pre and post market sessions
    pub extended_market_hours: bool,

    /// Margin multiplier applied to created securities
    pub leverage: f64,

    /// Minimum seconds a security stays in the universe once added
    pub minimum_time_in_universe_secs: u64,
}

impl Default for UniverseSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::Minute,
            fill_forward: true,
            extended_market_hours: false,
            leverage: 1.0,
            minimum_time_in_universe_secs: 24 * 60 * 60,
        }
    }
}

impl UniverseSettings {
    /// Get minimum time in universe as Duration
    pub fn minimum_time_in_universe(&self) -> Duration {
        Duration::from_secs(self.minimum_time_in_universe_secs)
    }
}

/// Engine-side security backing one canonical chain.
///
/// Owned by the security registry and shared as `Arc<ChainSecurity>`; the
/// attached contract filter is replaced on every selection cycle.
pub struct ChainSecurity {
    symbol: InstrumentId,
    config: SubscriptionDataConfig,
    leverage: f64,
    filter: RwLock<Arc<dyn ContractFilter>>,
}

impl ChainSecurity {
    pub fn new(
        symbol: InstrumentId,
        config: SubscriptionDataConfig,
        leverage: f64,
        filter: Arc<dyn ContractFilter>,
    ) -> Self {
        Self { symbol, config, leverage, filter: RwLock::new(filter) }
    }

    pub fn symbol(&self) -> &InstrumentId {
        &self.symbol
    }

    pub fn config(&self) -> &SubscriptionDataConfig {
        &self.config
    }

    pub fn leverage(&self) -> f64 {
        self.leverage
    }

    /// Attach the filter the chain-filter engine should evaluate
    pub fn set_filter(&self, filter: Arc<dyn ContractFilter>) {
        *self.filter.write() = filter;
    }

    /// Run the attached filter over `spec`
    pub fn apply_filter(&self, spec: ContractFilterSpec) -> ContractFilterSpec {
        let filter: Arc<dyn ContractFilter> = self.filter.read().clone();
        filter.filter(spec)
    }
}

impl fmt::Debug for ChainSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainSecurity")
            .field("symbol", &self.symbol)
            .field("config", &self.config)
            .field("leverage", &self.leverage)
            .finish_non_exhaustive()
    }
}

/// One selected chain paired with the settings its subscriptions use
#[derive(Debug, Clone)]
pub struct ChainUniverse {
    pub security: Arc<ChainSecurity>,
    pub settings: UniverseSettings,
}

impl ChainUniverse {
    pub fn new(security: Arc<ChainSecurity>, settings: UniverseSettings) -> Self {
        Self { security, settings }
    }

    pub fn symbol(&self) -> &InstrumentId {
        self.security.symbol()
    }
}

/// Chains that entered or left the active universes in one refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityChanges {
    pub added: Vec<InstrumentId>,
    pub removed: Vec<InstrumentId>,
}

impl SecurityChanges {
    /// Compare two refreshes, keeping each side in its own order
    pub fn between(previous: &[ChainUniverse], current: &[ChainUniverse]) -> Self {
        let before: HashSet<&InstrumentId> = previous.iter().map(ChainUniverse::symbol).collect();
        let after: HashSet<&InstrumentId> = current.iter().map(ChainUniverse::symbol).collect();

        Self {
            added: current
                .iter()
                .map(ChainUniverse::symbol)
                .filter(|symbol| !before.contains(symbol))
                .cloned()
                .collect(),
            removed: previous
                .iter()
                .map(ChainUniverse::symbol)
                .filter(|symbol| !after.contains(symbol))
                .cloned()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

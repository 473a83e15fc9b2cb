//! Contract filter hook attached to every chain security.
//!
//! The hook only narrows a [`ContractFilterSpec`]; evaluating the spec against
//! quoted contracts is the job of the host's chain-filter engine.

use serde::{Deserialize, Serialize};

/// Default expiry window, in days, for a freshly attached chain
pub const DEFAULT_MAX_EXPIRY_DAYS: u32 = 35;

/// Narrowing options a chain-filter engine applies to the contracts of a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractFilterSpec {
    /// Earliest expiry to keep, in days from now
    pub min_expiry_days: u32,

    /// Latest expiry to keep, in days from now
    pub max_expiry_days: u32,

    /// Keep only the nearest expiry
    pub front_month_only: bool,

    /// Drop the nearest expiry and keep the rest
    pub back_months_only: bool,

    /// Keep only standard (monthly) contracts
    pub standards_only: bool,

    /// Keep weekly contracts alongside standard ones
    pub include_weeklys: bool,
}

impl Default for ContractFilterSpec {
    fn default() -> Self {
        Self {
            min_expiry_days: 0,
            max_expiry_days: DEFAULT_MAX_EXPIRY_DAYS,
            front_month_only: false,
            back_months_only: false,
            standards_only: true,
            include_weeklys: false,
        }
    }
}

impl ContractFilterSpec {
    pub fn expiration(mut self, min_days: u32, max_days: u32) -> Self {
        self.min_expiry_days = min_days;
        self.max_expiry_days = max_days.max(min_days);
        self
    }

    pub fn front_month(mut self) -> Self {
        self.front_month_only = true;
        self.back_months_only = false;
        self
    }

    pub fn back_months(mut self) -> Self {
        self.back_months_only = true;
        self.front_month_only = false;
        self
    }

    pub fn standards_only(mut self) -> Self {
        self.standards_only = true;
        self.include_weeklys = false;
        self
    }

    pub fn include_weeklys(mut self) -> Self {
        self.include_weeklys = true;
        self.standards_only = false;
        self
    }
}

/// Extension point narrowing which contracts of a chain stay active
pub trait ContractFilter: Send + Sync {
    fn filter(&self, spec: ContractFilterSpec) -> ContractFilterSpec {
        spec
    }
}

/// Leaves the spec untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityFilter;

impl ContractFilter for IdentityFilter {}

/// Replaces whatever spec it receives with a configured one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedFilter(pub ContractFilterSpec);

impl ContractFilter for FixedFilter {
    fn filter(&self, _spec: ContractFilterSpec) -> ContractFilterSpec {
        self.0.clone()
    }
}

/// Any `Fn(spec) -> spec` closure can serve as a filter
impl<F> ContractFilter for F
where
    F: Fn(ContractFilterSpec) -> ContractFilterSpec + Send + Sync,
{
    fn filter(&self, spec: ContractFilterSpec) -> ContractFilterSpec {
        self(spec)
    }
}

use crate::canonical::canonicalize;
use crate::config::SelectionConfig;
use crate::engine::SelectionContext;
use crate::error::SelectionError;
use crate::filter::{ContractFilter, FixedFilter, IdentityFilter};
use crate::metrics::{MetricsCollector, SelectionMetrics};
use crate::provisioner::SecurityProvisioner;
use crate::schedule::RefreshSchedule;
use crate::selector::SymbolSelector;
use crate::types::{AssetClass, ChainUniverse, InstrumentId, UniverseSettings};
use crate::UniverseSelectionModel;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Subscribes to one contract chain per underlying chosen by a selector.
///
/// Every call to [`create_universes`](UniverseSelectionModel::create_universes)
/// advances the schedule first, then re-runs the selector, canonicalizes and
/// deduplicates its candidates, and resolves one chain security per canonical
/// identifier.
pub struct ChainUniverseSelectionModel<S> {
    schedule: RefreshSchedule,
    selector: S,
    asset_class: AssetClass,
    universe_settings: Option<UniverseSettings>,
    filter: Arc<dyn ContractFilter>,
    metrics: MetricsCollector,
}

impl<S: SymbolSelector> ChainUniverseSelectionModel<S> {
    /// Fails when `refresh_interval` is negative
    pub fn new(refresh_interval: Duration, selector: S) -> Result<Self, SelectionError> {
        Ok(Self {
            schedule: RefreshSchedule::new(refresh_interval)?,
            selector,
            asset_class: AssetClass::Future,
            universe_settings: None,
            filter: Arc::new(IdentityFilter),
            metrics: MetricsCollector::new(),
        })
    }

    pub fn from_config(config: &SelectionConfig, selector: S) -> Result<Self, SelectionError> {
        config.validate()?;
        let mut model =
            Self::new(config.refresh_interval()?, selector)?.with_asset_class(config.asset_class);
        model.universe_settings = config.universe_settings.clone();
        if let Some(spec) = &config.contract_filter {
            model.filter = Arc::new(FixedFilter(spec.clone()));
        }
        Ok(model)
    }

    pub fn with_universe_settings(mut self, settings: UniverseSettings) -> Self {
        self.universe_settings = Some(settings);
        self
    }

    pub fn with_asset_class(mut self, asset_class: AssetClass) -> Self {
        self.asset_class = asset_class;
        self
    }

    pub fn with_filter(mut self, filter: impl ContractFilter + 'static) -> Self {
        self.filter = Arc::new(filter);
        self
    }

    pub fn asset_class(&self) -> AssetClass {
        self.asset_class
    }

    pub fn refresh_interval(&self) -> Duration {
        self.schedule.refresh_interval()
    }

    pub fn metrics(&self) -> SelectionMetrics {
        self.metrics.get_metrics()
    }

    /// Canonical identifiers in first-seen order, one per chain
    fn unique_chains(
        &self,
        candidates: &[InstrumentId],
    ) -> Result<Vec<InstrumentId>, SelectionError> {
        let mut seen = HashSet::with_capacity(candidates.len());
        let mut chains = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let canonical = canonicalize(candidate, self.asset_class)?;
            if seen.insert(canonical.clone()) {
                chains.push(canonical);
            }
        }

        Ok(chains)
    }

    fn run_selection(
        &mut self,
        ctx: &mut SelectionContext<'_>,
    ) -> Result<Vec<ChainUniverse>, SelectionError> {
        let candidates = self.selector.select(ctx.utc_time).map_err(SelectionError::Selector)?;
        self.metrics.record_candidates(candidates.len());

        let chains = self.unique_chains(&candidates)?;
        self.metrics.record_duplicates(candidates.len() - chains.len());

        let settings = self.universe_settings.as_ref().unwrap_or(ctx.default_settings).clone();

        let mut universes = Vec::with_capacity(chains.len());
        for chain in &chains {
            let provisioned = SecurityProvisioner::resolve_or_create(
                &mut *ctx.securities,
                &mut *ctx.subscriptions,
                chain,
                &settings,
            )?;
            self.metrics.record_security(provisioned.was_created());

            let security = provisioned.into_security();
            security.set_filter(Arc::clone(&self.filter));
            universes.push(ChainUniverse::new(security, settings.clone()));
        }

        Ok(universes)
    }
}

impl<S: SymbolSelector> UniverseSelectionModel for ChainUniverseSelectionModel<S> {
    fn next_refresh_time_utc(&self) -> DateTime<Utc> {
        self.schedule.next_refresh_time_utc()
    }

    fn create_universes(
        &mut self,
        ctx: &mut SelectionContext<'_>,
    ) -> Result<Vec<ChainUniverse>, SelectionError> {
        let started = Instant::now();
        let next = self.schedule.advance(ctx.utc_time);
        self.metrics.record_cycle_started();
        debug!(
            "Selecting {} chains at {}, next refresh at {}",
            self.asset_class, ctx.utc_time, next
        );

        match self.run_selection(ctx) {
            Ok(universes) => {
                self.metrics.record_cycle_completed(universes.len(), started.elapsed());
                Ok(universes)
            }
            Err(e) => {
                warn!("Universe selection at {} failed: {}", ctx.utc_time, e);
                self.metrics.record_cycle_failed();
                Err(e)
            }
        }
    }
}

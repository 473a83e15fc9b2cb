//! Host engine view handed to selection models, plus a simulated host.

use crate::error::SelectionError;
use crate::registry::{
    InMemorySecurityRegistry, InMemorySubscriptionService, SecurityRegistry,
    SubscriptionConfigService,
};
use crate::types::{ChainUniverse, SecurityChanges, UniverseSettings};
use crate::UniverseSelectionModel;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

/// Everything a model may touch while creating universes
pub struct SelectionContext<'a> {
    /// Current engine time
    pub utc_time: DateTime<Utc>,

    /// Engine-wide settings used when a model has none of its own
    pub default_settings: &'a UniverseSettings,

    pub securities: &'a mut dyn SecurityRegistry,
    pub subscriptions: &'a mut dyn SubscriptionConfigService,
}

/// Single-threaded host engine with in-memory collaborators.
///
/// Time only moves when the caller advances it; [`poll`](Self::poll) refreshes
/// the active universes whenever the model reports selection is due.
pub struct SimulatedEngine {
    utc_time: DateTime<Utc>,
    universe_settings: UniverseSettings,
    securities: InMemorySecurityRegistry,
    subscriptions: InMemorySubscriptionService,
    active_universes: Vec<ChainUniverse>,
    last_changes: SecurityChanges,
    refreshes: u64,
}

impl SimulatedEngine {
    pub fn new(start: DateTime<Utc>, universe_settings: UniverseSettings) -> Self {
        info!("Creating SimulatedEngine at {}", start);
        Self {
            utc_time: start,
            universe_settings,
            securities: InMemorySecurityRegistry::new(),
            subscriptions: InMemorySubscriptionService::new(),
            active_universes: Vec::new(),
            last_changes: SecurityChanges::default(),
            refreshes: 0,
        }
    }

    pub fn utc_time(&self) -> DateTime<Utc> {
        self.utc_time
    }

    pub fn set_time(&mut self, utc_time: DateTime<Utc>) {
        self.utc_time = utc_time;
    }

    pub fn advance(&mut self, by: Duration) {
        self.utc_time = self.utc_time.checked_add_signed(by).unwrap_or(DateTime::<Utc>::MAX_UTC);
    }

    pub fn universe_settings(&self) -> &UniverseSettings {
        &self.universe_settings
    }

    pub fn securities(&self) -> &InMemorySecurityRegistry {
        &self.securities
    }

    pub fn subscriptions(&self) -> &InMemorySubscriptionService {
        &self.subscriptions
    }

    pub fn active_universes(&self) -> &[ChainUniverse] {
        &self.active_universes
    }

    /// Chains added and removed by the latest successful refresh
    pub fn last_changes(&self) -> &SecurityChanges {
        &self.last_changes
    }

    /// Number of successful refreshes
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    /// Borrow the engine as a selection context at the current time
    pub fn context(&mut self) -> SelectionContext<'_> {
        SelectionContext {
            utc_time: self.utc_time,
            default_settings: &self.universe_settings,
            securities: &mut self.securities,
            subscriptions: &mut self.subscriptions,
        }
    }

    /// Refresh the active universes if the model is due.
    ///
    /// Returns `Ok(true)` when selection ran. A failed cycle leaves the
    /// previous universes in place.
    pub fn poll<M>(&mut self, model: &mut M) -> Result<bool, SelectionError>
    where
        M: UniverseSelectionModel + ?Sized,
    {
        if self.utc_time < model.next_refresh_time_utc() {
            return Ok(false);
        }

        let universes = {
            let mut ctx = self.context();
            model.create_universes(&mut ctx)?
        };

        let changes = SecurityChanges::between(&self.active_universes, &universes);
        info!(
            "Refreshed {} chain universes at {} (+{} -{}, {} securities registered)",
            universes.len(),
            self.utc_time,
            changes.added.len(),
            changes.removed.len(),
            self.securities.len()
        );
        self.active_universes = universes;
        self.last_changes = changes;
        self.refreshes += 1;
        Ok(true)
    }
}

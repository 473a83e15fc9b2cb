use crate::error::SelectionError;
use crate::registry::{SecurityRegistry, SubscriptionConfigService};
use crate::types::{ChainSecurity, InstrumentId, UniverseSettings};
use std::sync::Arc;
use tracing::info;

/// Outcome of resolving a chain security
#[derive(Debug, Clone)]
pub enum Provisioned {
    Existing(Arc<ChainSecurity>),
    Created(Arc<ChainSecurity>),
}

impl Provisioned {
    pub fn security(&self) -> &Arc<ChainSecurity> {
        match self {
            Provisioned::Existing(security) | Provisioned::Created(security) => security,
        }
    }

    pub fn into_security(self) -> Arc<ChainSecurity> {
        match self {
            Provisioned::Existing(security) | Provisioned::Created(security) => security,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Provisioned::Created(_))
    }
}

/// Resolves chain securities, creating each one at most once.
///
/// Lookup-then-create is not atomic; callers hold `&mut` access to the
/// registry for the whole call.
#[derive(Debug, Default, Clone, Copy)]
pub struct SecurityProvisioner;

impl SecurityProvisioner {
    pub fn resolve_or_create(
        securities: &mut dyn SecurityRegistry,
        subscriptions: &mut dyn SubscriptionConfigService,
        symbol: &InstrumentId,
        settings: &UniverseSettings,
    ) -> Result<Provisioned, SelectionError> {
        if let Some(existing) = securities.get(symbol) {
            return Ok(Provisioned::Existing(existing));
        }

        let config = subscriptions
            .add(
                symbol,
                settings.resolution,
                settings.fill_forward,
                settings.extended_market_hours,
                false,
            )
            .map_err(SelectionError::Provisioning)?;

        let security = securities
            .create_security(symbol, config, settings.leverage, false)
            .map_err(SelectionError::Provisioning)?;

        info!("Created chain security {} at {:?} resolution", symbol, settings.resolution);
        Ok(Provisioned::Created(security))
    }
}

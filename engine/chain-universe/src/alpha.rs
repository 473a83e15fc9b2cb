//! RSI alpha model fed by universe changes.
//!
//! Tracks one [`RelativeStrengthIndex`] per chain in the active universes and
//! emits a directional [`Insight`] when the index crosses into an oversold or
//! overbought band. A tripped band only resets once the index clears the
//! bounce margin, so a value hovering around a threshold signals once.

use crate::error::SelectionError;
use crate::indicator::RelativeStrengthIndex;
use crate::types::{InstrumentId, Resolution, SecurityChanges};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Default RSI lookback
pub const DEFAULT_RSI_PERIOD: usize = 14;

const TRIPPED_HIGH: Decimal = Decimal::from_parts(70, 0, 0, false, 0);
const TRIPPED_LOW: Decimal = Decimal::from_parts(30, 0, 0, false, 0);
const RESET_HIGH: Decimal = Decimal::from_parts(65, 0, 0, false, 0);
const RESET_LOW: Decimal = Decimal::from_parts(35, 0, 0, false, 0);

/// Band the index of one chain currently sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiState {
    TrippedLow,
    Middle,
    TrippedHigh,
}

impl RsiState {
    /// Band for `rsi` given the band it was in before
    pub fn next(self, rsi: Decimal) -> Self {
        if rsi > TRIPPED_HIGH {
            return RsiState::TrippedHigh;
        }
        if rsi < TRIPPED_LOW {
            return RsiState::TrippedLow;
        }
        match self {
            RsiState::TrippedLow if rsi > RESET_LOW => RsiState::Middle,
            RsiState::TrippedHigh if rsi < RESET_HIGH => RsiState::Middle,
            unchanged => unchanged,
        }
    }
}

/// Expected direction of price over an insight's period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightDirection {
    Up,
    Down,
}

/// Price prediction for one chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insight {
    pub symbol: InstrumentId,
    pub direction: InsightDirection,
    pub generated_time_utc: DateTime<Utc>,
    pub period: Duration,
}

impl Insight {
    pub fn close_time_utc(&self) -> DateTime<Utc> {
        self.generated_time_utc
            .checked_add_signed(self.period)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// One closing price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBar {
    pub symbol: InstrumentId,
    pub time: DateTime<Utc>,
    pub close: Decimal,
}

/// Source of historical bars used to warm up newly tracked chains
pub trait PriceHistory {
    /// Up to `bars` most recent bars for `symbol`, oldest first
    fn history(
        &mut self,
        symbol: &InstrumentId,
        bars: usize,
        resolution: Resolution,
    ) -> anyhow::Result<Vec<PriceBar>>;
}

/// In-memory bar store; unknown symbols have an empty history
#[derive(Debug, Default)]
pub struct InMemoryPriceHistory {
    bars: HashMap<InstrumentId, Vec<PriceBar>>,
}

impl InMemoryPriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bar: PriceBar) {
        self.bars.entry(bar.symbol.clone()).or_default().push(bar);
    }
}

impl PriceHistory for InMemoryPriceHistory {
    fn history(
        &mut self,
        symbol: &InstrumentId,
        bars: usize,
        _resolution: Resolution,
    ) -> anyhow::Result<Vec<PriceBar>> {
        let stored = self.bars.get(symbol).map(Vec::as_slice).unwrap_or_default();
        Ok(stored[stored.len().saturating_sub(bars)..].to_vec())
    }
}

/// Configuration for an RSI alpha model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsiAlphaConfig {
    /// RSI lookback in bars
    pub period: usize,

    /// Bar resolution; insights last `period` bars
    pub resolution: Resolution,
}

impl Default for RsiAlphaConfig {
    fn default() -> Self {
        Self { period: DEFAULT_RSI_PERIOD, resolution: Resolution::Daily }
    }
}

struct SymbolData {
    rsi: RelativeStrengthIndex,
    state: RsiState,
}

/// Emits Up insights on oversold crossings and Down insights on overbought ones
pub struct RsiAlphaModel {
    resolution: Resolution,
    insight_period: Duration,
    name: String,
    template: RelativeStrengthIndex,
    symbols: BTreeMap<InstrumentId, SymbolData>,
}

impl RsiAlphaModel {
    pub fn new(period: usize, resolution: Resolution) -> Result<Self, SelectionError> {
        let template = RelativeStrengthIndex::new(period)?;
        let insight_period = i32::try_from(period)
            .ok()
            .and_then(|bars| resolution.bar_duration().checked_mul(bars))
            .ok_or_else(|| {
                SelectionError::Config(format!("RSI period {period} is out of range"))
            })?;

        Ok(Self {
            resolution,
            insight_period,
            name: format!("RsiAlphaModel({period},{resolution:?})"),
            template,
            symbols: BTreeMap::new(),
        })
    }

    pub fn from_config(config: &RsiAlphaConfig) -> Result<Self, SelectionError> {
        Self::new(config.period, config.resolution)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period(&self) -> usize {
        self.template.period()
    }

    pub fn insight_period(&self) -> Duration {
        self.insight_period
    }

    pub fn is_tracking(&self, symbol: &InstrumentId) -> bool {
        self.symbols.contains_key(symbol)
    }

    pub fn tracked(&self) -> impl Iterator<Item = &InstrumentId> {
        self.symbols.keys()
    }

    pub fn state(&self, symbol: &InstrumentId) -> Option<RsiState> {
        self.symbols.get(symbol).map(|data| data.state)
    }

    /// Drop state for removed chains and start an index for each added one.
    ///
    /// Added chains are warmed up from `history`. A chain whose history
    /// cannot be loaded is not tracked.
    pub fn on_securities_changed(
        &mut self,
        changes: &SecurityChanges,
        history: &mut dyn PriceHistory,
    ) {
        for symbol in &changes.removed {
            if self.symbols.remove(symbol).is_some() {
                debug!("{} stopped tracking {}", self.name, symbol);
            }
        }

        for symbol in &changes.added {
            if self.symbols.contains_key(symbol) {
                continue;
            }

            let mut rsi = self.template.clone();
            match history.history(symbol, rsi.warm_up_period(), self.resolution) {
                Ok(bars) => {
                    for bar in &bars {
                        rsi.update(bar.close);
                    }
                }
                Err(e) => {
                    warn!("{} has no history for {}: {}", self.name, symbol, e);
                    continue;
                }
            }

            debug!("{} tracking {} (ready: {})", self.name, symbol, rsi.is_ready());
            self.symbols.insert(symbol.clone(), SymbolData { rsi, state: RsiState::Middle });
        }
    }

    /// Feed new bars and return the insights they trigger.
    ///
    /// Bars for untracked chains are ignored. A chain keeps its band until its
    /// index is ready.
    pub fn update(&mut self, utc_time: DateTime<Utc>, bars: &[PriceBar]) -> Vec<Insight> {
        for bar in bars {
            if let Some(data) = self.symbols.get_mut(&bar.symbol) {
                data.rsi.update(bar.close);
            }
        }

        let mut insights = Vec::new();
        for (symbol, data) in self.symbols.iter_mut() {
            let Some(value) = data.rsi.current() else {
                continue;
            };

            let state = data.state.next(value);
            if state != data.state {
                let direction = match state {
                    RsiState::TrippedLow => Some(InsightDirection::Up),
                    RsiState::TrippedHigh => Some(InsightDirection::Down),
                    RsiState::Middle => None,
                };
                if let Some(direction) = direction {
                    debug!("{} RSI {} for {}: {:?}", self.name, value, symbol, direction);
                    insights.push(Insight {
                        symbol: symbol.clone(),
                        direction,
                        generated_time_utc: utc_time,
                        period: self.insight_period,
                    });
                }
            }
            data.state = state;
        }

        insights
    }
}

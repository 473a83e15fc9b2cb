use crate::types::InstrumentId;
use chrono::{DateTime, Utc};

/// Caller-supplied rule choosing candidate instruments at a point in time
pub trait SymbolSelector {
    fn select(&mut self, utc_time: DateTime<Utc>) -> anyhow::Result<Vec<InstrumentId>>;
}

impl<F> SymbolSelector for F
where
    F: FnMut(DateTime<Utc>) -> anyhow::Result<Vec<InstrumentId>>,
{
    fn select(&mut self, utc_time: DateTime<Utc>) -> anyhow::Result<Vec<InstrumentId>> {
        self(utc_time)
    }
}

/// Selector returning the same candidates on every call
#[derive(Debug, Clone, Default)]
pub struct StaticSelector {
    symbols: Vec<InstrumentId>,
}

impl StaticSelector {
    pub fn new(symbols: Vec<InstrumentId>) -> Self {
        Self { symbols }
    }
}

impl SymbolSelector for StaticSelector {
    fn select(&mut self, _utc_time: DateTime<Utc>) -> anyhow::Result<Vec<InstrumentId>> {
        Ok(self.symbols.clone())
    }
}

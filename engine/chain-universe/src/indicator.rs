//! Wilder's relative strength index over closing prices

use crate::error::SelectionError;
use rust_decimal::Decimal;

const FIFTY: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Simple mean over the first `window` inputs, Wilder smoothing afterwards
#[derive(Debug, Clone)]
struct WilderAverage {
    divisor: Decimal,
    samples: usize,
    window: usize,
    sum: Decimal,
    value: Decimal,
}

impl WilderAverage {
    fn new(window: usize) -> Self {
        Self {
            divisor: Decimal::from(window),
            samples: 0,
            window,
            sum: Decimal::ZERO,
            value: Decimal::ZERO,
        }
    }

    fn update(&mut self, input: Decimal) {
        self.samples += 1;
        if self.samples <= self.window {
            self.sum += input;
            self.value = self.sum / Decimal::from(self.samples);
        } else {
            self.value = (self.value * (self.divisor - Decimal::ONE) + input) / self.divisor;
        }
    }

    fn is_ready(&self) -> bool {
        self.samples >= self.window
    }
}

/// Relative strength index using Wilder's moving average.
///
/// Needs `period + 1` closes (that is, `period` price changes) before it
/// produces a value.
#[derive(Debug, Clone)]
pub struct RelativeStrengthIndex {
    period: usize,
    previous_close: Option<Decimal>,
    average_gain: WilderAverage,
    average_loss: WilderAverage,
}

impl RelativeStrengthIndex {
    pub fn new(period: usize) -> Result<Self, SelectionError> {
        if period == 0 {
            return Err(SelectionError::Config("RSI period must be > 0".to_string()));
        }
        Ok(Self {
            period,
            previous_close: None,
            average_gain: WilderAverage::new(period),
            average_loss: WilderAverage::new(period),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Closes required before the first value
    pub fn warm_up_period(&self) -> usize {
        self.period + 1
    }

    pub fn is_ready(&self) -> bool {
        self.average_gain.is_ready() && self.average_loss.is_ready()
    }

    /// Feed one close and return the current value once ready
    pub fn update(&mut self, close: Decimal) -> Option<Decimal> {
        if let Some(previous) = self.previous_close {
            let change = close - previous;
            self.average_gain.update(change.max(Decimal::ZERO));
            self.average_loss.update((-change).max(Decimal::ZERO));
        }
        self.previous_close = Some(close);
        self.current()
    }

    pub fn current(&self) -> Option<Decimal> {
        if !self.is_ready() {
            return None;
        }
        Some(Self::calculate(self.average_gain.value, self.average_loss.value))
    }

    fn calculate(average_gain: Decimal, average_loss: Decimal) -> Decimal {
        if average_loss.is_zero() {
            // Flat prices are neutral; pure gains saturate
            return if average_gain.is_zero() { FIFTY } else { Decimal::ONE_HUNDRED };
        }
        let rs = average_gain / average_loss;
        Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / (Decimal::ONE + rs)
    }
}

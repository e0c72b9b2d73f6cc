use serde::{Deserialize, Serialize};

use crate::indicators::{annualized_volatility, latest_sma, rate_of_change, rsi};

/// Minimum number of closes for a meaningful snapshot.
pub const MIN_CLOSES: usize = 20;

const RSI_PERIOD: usize = 14;
const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;

/// Point-in-time technical state of an index, derived from its closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TechnicalIndicators {
    /// SMA5 vs SMA20 crossover, scaled to [-1, 1]
    pub trend: f64,
    /// Five-bar rate of change, scaled to [-1, 1]
    pub momentum: f64,
    /// Annualized volatility of daily returns
    pub volatility: f64,
    pub rsi: f64,
    pub sma_5: Option<f64>,
    pub sma_20: Option<f64>,
    pub current_price: Option<f64>,
}

impl Default for TechnicalIndicators {
    fn default() -> Self {
        Self {
            trend: 0.0,
            momentum: 0.0,
            volatility: 0.0,
            rsi: 50.0,
            sma_5: None,
            sma_20: None,
            current_price: None,
        }
    }
}

impl TechnicalIndicators {
    /// Collapse the indicators into one signal in [-1, 1].
    ///
    /// Trend and momentum are weighted 40/60; the result is damped by 30%
    /// while RSI sits in overbought or oversold territory.
    pub fn signal(&self) -> f64 {
        let mut signal = 0.4 * self.trend + 0.6 * self.momentum;
        if self.is_overbought() || self.is_oversold() {
            signal *= 0.7;
        }
        signal.clamp(-1.0, 1.0)
    }

    pub fn is_overbought(&self) -> bool {
        self.rsi > RSI_OVERBOUGHT
    }

    pub fn is_oversold(&self) -> bool {
        self.rsi < RSI_OVERSOLD
    }
}

/// Compute the snapshot from closes ordered oldest first.
///
/// With fewer than [`MIN_CLOSES`] prices the neutral default is returned.
pub fn calculate_technical_indicators(closes: &[f64]) -> TechnicalIndicators {
    if closes.len() < MIN_CLOSES {
        return TechnicalIndicators::default();
    }

    let sma_5 = latest_sma(closes, 5);
    let sma_20 = latest_sma(closes, 20);

    let trend = match (sma_5, sma_20) {
        (Some(short), Some(long)) if long != 0.0 => ((short - long) / long * 10.0).clamp(-1.0, 1.0),
        _ => 0.0,
    };

    let momentum = (rate_of_change(closes, 5) * 5.0).clamp(-1.0, 1.0);

    TechnicalIndicators {
        trend,
        momentum,
        volatility: annualized_volatility(closes),
        rsi: rsi(closes, RSI_PERIOD),
        sma_5,
        sma_20,
        current_price: closes.last().copied(),
    }
}

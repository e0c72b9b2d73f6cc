use analysis_core::stats::population_std_dev;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Average of the last `period` values, if there are enough of them.
pub fn latest_sma(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    Some(data[data.len() - period..].iter().sum::<f64>() / period as f64)
}

/// Relative Strength Index over the last `period` price changes.
///
/// Gains and losses are plain averages (no Wilder smoothing). Returns 50 when
/// there are fewer than `period + 1` prices and 100 when there were no losses.
pub fn rsi(data: &[f64], period: usize) -> f64 {
    if period == 0 || data.len() < period + 1 {
        return 50.0;
    }

    let window = &data[data.len() - period - 1..];
    let mut gains = 0.0;
    let mut losses = 0.0;

    for pair in window.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gains += change;
        } else {
            losses += change.abs();
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Period-over-period simple returns. Steps from a zero price are skipped.
pub fn simple_returns(data: &[f64]) -> Vec<f64> {
    data.windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Annualized volatility: population std-dev of daily returns times sqrt(252).
pub fn annualized_volatility(data: &[f64]) -> f64 {
    let returns = simple_returns(data);
    population_std_dev(&returns) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Fractional change between the last price and the price `lookback` places
/// from the end (`lookback = 5` compares against `data[len - 5]`).
pub fn rate_of_change(data: &[f64], lookback: usize) -> f64 {
    if lookback == 0 || data.len() < lookback {
        return 0.0;
    }
    let base = data[data.len() - lookback];
    match data.last() {
        Some(&last) if base != 0.0 => (last - base) / base,
        _ => 0.0,
    }
}

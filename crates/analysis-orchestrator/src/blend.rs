use analysis_core::stats::round_to;
use analysis_core::Direction;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use technical_analysis::{TechnicalIndicators, TRADING_DAYS_PER_YEAR};

pub const TECHNICAL_WEIGHT: f64 = 0.6;
pub const SENTIMENT_WEIGHT: f64 = 0.4;
pub const DIRECTION_THRESHOLD: f64 = 0.1;
pub const MAX_CHANGE_PERCENT: f64 = 20.0;
pub const MIN_HORIZON_DAYS: u32 = 1;
pub const MAX_HORIZON_DAYS: u32 = 30;

const DEFAULT_VOLATILITY: f64 = 0.15;
const DAILY_DECAY: f64 = 0.9;

/// One day of the forecast path
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ForecastPoint {
    pub date: String,
    pub predicted_close: f64,
    pub confidence: f64,
    pub sentiment_influence: f64,
}

/// Output of [`blend`]
#[derive(Debug, Clone)]
pub struct Blend {
    pub technical_signal: f64,
    pub combined_signal: f64,
    pub direction: Direction,
    pub volatility: f64,
    pub predicted_change_percent: f64,
    pub confidence: f64,
    pub path: Vec<ForecastPoint>,
}

pub fn combined_signal(technical: f64, sentiment: f64) -> f64 {
    TECHNICAL_WEIGHT * technical + SENTIMENT_WEIGHT * sentiment
}

/// Volatility used for sizing moves; non-positive input falls back to 15%.
pub fn effective_volatility(volatility: f64) -> f64 {
    if volatility > 0.0 {
        volatility
    } else {
        DEFAULT_VOLATILITY
    }
}

/// Two-sigma daily move as a fraction.
pub fn max_daily_move(volatility: f64) -> f64 {
    effective_volatility(volatility) / TRADING_DAYS_PER_YEAR.sqrt() * 2.0
}

/// Cumulative change % for each day 1..=days, clamped to +/-20%.
pub fn cumulative_changes(combined: f64, volatility: f64, days: u32) -> Vec<f64> {
    let base = combined * max_daily_move(volatility) * 100.0;
    let mut cumulative = 0.0;
    (1..=days)
        .map(|i| {
            cumulative += base * DAILY_DECAY.powi(i as i32);
            cumulative.clamp(-MAX_CHANGE_PERCENT, MAX_CHANGE_PERCENT)
        })
        .collect()
}

pub fn day_confidence(day: u32) -> f64 {
    (0.85 - 0.07 * day as f64).max(0.3)
}

fn horizon_factor(days: u32) -> f64 {
    (1.0 - 0.025 * days.saturating_sub(1) as f64).max(0.5)
}

/// Overall confidence in [0, 1]: stronger signals raise it, volatility and
/// longer horizons lower it.
pub fn prediction_confidence(combined: f64, volatility: f64, days: u32) -> f64 {
    let strength = (0.5 + combined.abs() * 0.5).min(0.85);
    let calm = (1.0 - effective_volatility(volatility) * 0.5).clamp(0.0, 1.0);
    (strength * calm * horizon_factor(days)).clamp(0.0, 1.0)
}

/// Blend technical indicators with a sentiment score into a forecast.
///
/// Without a current price the path is empty but direction, change and
/// confidence are still derived from the signals.
pub fn blend(
    technicals: &TechnicalIndicators,
    sentiment_score: f64,
    current_price: Option<f64>,
    days: u32,
    start: NaiveDate,
) -> Blend {
    let days = days.clamp(MIN_HORIZON_DAYS, MAX_HORIZON_DAYS);
    let technical_signal = technicals.signal();
    let sentiment = sentiment_score.clamp(-1.0, 1.0);
    let combined = combined_signal(technical_signal, sentiment);
    let volatility = effective_volatility(technicals.volatility);

    let changes = cumulative_changes(combined, volatility, days);
    let predicted_change_percent = changes.last().copied().unwrap_or(0.0);

    let path = match current_price {
        Some(price) => changes
            .iter()
            .enumerate()
            .map(|(idx, cumulative)| {
                let day = idx as u32 + 1;
                ForecastPoint {
                    date: (start + Duration::days(day as i64)).format("%Y-%m-%d").to_string(),
                    predicted_close: round_to(price * (1.0 + cumulative / 100.0), 2),
                    confidence: round_to(day_confidence(day), 2),
                    sentiment_influence: round_to(sentiment * SENTIMENT_WEIGHT, 4),
                }
            })
            .collect(),
        None => Vec::new(),
    };

    Blend {
        technical_signal,
        combined_signal: combined,
        direction: Direction::from_signal(combined, DIRECTION_THRESHOLD),
        volatility,
        predicted_change_percent: round_to(predicted_change_percent, 2),
        confidence: round_to(prediction_confidence(combined, volatility, days), 2),
        path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn technicals(trend: f64, momentum: f64, volatility: f64) -> TechnicalIndicators {
        TechnicalIndicators {
            trend,
            momentum,
            volatility,
            ..TechnicalIndicators::default()
        }
    }

    #[test]
    fn test_combined_weights() {
        assert!((combined_signal(1.0, 0.0) - 0.6).abs() < 1e-12);
        assert!((combined_signal(0.0, -1.0) + 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_direction_thresholds() {
        let bullish = blend(&technicals(0.5, 0.5, 0.2), 0.5, Some(100.0), 7, start());
        assert_eq!(bullish.direction, Direction::Bullish);

        let bearish = blend(&technicals(-0.5, -0.5, 0.2), -0.5, Some(100.0), 7, start());
        assert_eq!(bearish.direction, Direction::Bearish);

        // 0.4 * 0.25 = 0.1 is not above the threshold
        let neutral = blend(&TechnicalIndicators::default(), 0.25, Some(100.0), 7, start());
        assert_eq!(neutral.direction, Direction::Neutral);
    }

    #[test]
    fn test_rsi_damps_technical_only() {
        let mut t = technicals(0.5, 0.5, 0.2);
        t.rsi = 80.0;
        let b = blend(&t, 1.0, Some(100.0), 7, start());
        assert!((b.technical_signal - 0.35).abs() < 1e-9);
        assert!((b.combined_signal - (0.6 * 0.35 + 0.4)).abs() < 1e-9);
    }

    #[test]
    fn test_path_is_deterministic_and_dated() {
        let t = technicals(0.3, 0.4, 0.18);
        let a = blend(&t, 0.2, Some(22000.0), 5, start());
        let b = blend(&t, 0.2, Some(22000.0), 5, start());

        assert_eq!(a.path.len(), 5);
        assert_eq!(a.path[0].date, "2024-03-02");
        assert_eq!(a.path[4].date, "2024-03-06");
        for (x, y) in a.path.iter().zip(&b.path) {
            assert_eq!(x.predicted_close, y.predicted_close);
        }
        assert_eq!(a.path[0].confidence, 0.78);
        assert!((a.path[0].sentiment_influence - 0.08).abs() < 1e-9);
    }

    #[test]
    fn test_first_day_change() {
        let t = technicals(1.0, 1.0, 0.252);
        let b = blend(&t, 1.0, Some(100.0), 1, start());
        let expected = b.combined_signal * max_daily_move(0.252) * 100.0 * 0.9;
        assert!((b.predicted_change_percent - round_to(expected, 2)).abs() < 1e-9);
        assert!((b.path[0].predicted_close - round_to(100.0 * (1.0 + expected / 100.0), 2)).abs() < 1e-9);
    }

    #[test]
    fn test_day_confidence_floor() {
        assert!((day_confidence(1) - 0.78).abs() < 1e-9);
        assert_eq!(day_confidence(8), 0.3);
        assert_eq!(day_confidence(30), 0.3);
    }

    #[test]
    fn test_confidence_non_increasing_in_horizon() {
        for (trend, momentum, vol, sent) in [
            (0.5, 0.5, 0.2, 0.3),
            (-1.0, -1.0, 0.05, -1.0),
            (0.0, 0.0, 0.0, 0.0),
            (0.2, -0.1, 1.5, 0.6),
        ] {
            let t = technicals(trend, momentum, vol);
            let mut previous = f64::INFINITY;
            for days in 1..=30 {
                let c = blend(&t, sent, Some(100.0), days, start()).confidence;
                assert!(c <= previous, "confidence rose at day {}", days);
                assert!((0.0..=1.0).contains(&c));
                previous = c;
            }
        }
    }

    #[test]
    fn test_change_is_bounded() {
        let t = technicals(1.0, 1.0, 5.0);
        for days in [1, 7, 30] {
            let b = blend(&t, 1.0, Some(100.0), days, start());
            assert!(b.predicted_change_percent.abs() <= MAX_CHANGE_PERCENT);
            assert!(b.path.iter().all(|p| p.predicted_close <= 120.0));
        }
    }

    #[test]
    fn test_zero_volatility_uses_default() {
        assert_eq!(effective_volatility(0.0), 0.15);
        assert_eq!(effective_volatility(-0.3), 0.15);
        assert!((max_daily_move(0.0) - 0.15 / 252f64.sqrt() * 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_without_price_path_is_empty() {
        let b = blend(&TechnicalIndicators::default(), 0.0, None, 7, start());
        assert!(b.path.is_empty());
        assert_eq!(b.direction, Direction::Neutral);
        assert_eq!(b.predicted_change_percent, 0.0);
        assert!(b.confidence > 0.0);
    }
}

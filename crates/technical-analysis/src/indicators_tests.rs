#[cfg(test)]
mod tests {
    use super::super::indicators::*;
    use super::super::snapshot::*;

    // Helper function to create sample price data
    fn sample_prices() -> Vec<f64> {
        vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ]
    }

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    fn falling(n: usize) -> Vec<f64> {
        (0..n).map(|i| 200.0 - i as f64).collect()
    }

    #[test]
    fn test_latest_sma_uses_trailing_window() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(latest_sma(&data, 3), Some(4.0)); // (3+4+5)/3
        assert_eq!(latest_sma(&data, 5), Some(3.0));

        let prices = sample_prices();
        let expected = (46.41 + 46.22 + 45.64 + 46.03 + 46.00) / 5.0;
        assert!((latest_sma(&prices, 5).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_latest_sma_insufficient_data() {
        assert_eq!(latest_sma(&[1.0, 2.0], 5), None);
        assert_eq!(latest_sma(&[1.0, 2.0], 0), None);
    }

    #[test]
    fn test_rsi_bounds() {
        let value = rsi(&sample_prices(), 14);
        assert!(value > 0.0 && value < 100.0);
    }

    #[test]
    fn test_rsi_insufficient_data_is_neutral() {
        assert_eq!(rsi(&[1.0, 2.0, 3.0], 14), 50.0);
        // 14 closes give only 13 deltas
        assert_eq!(rsi(&rising(14), 14), 50.0);
    }

    #[test]
    fn test_rsi_monotonic_rise_is_100() {
        assert_eq!(rsi(&rising(15), 14), 100.0);
        assert_eq!(rsi(&rising(40), 14), 100.0);
    }

    #[test]
    fn test_rsi_monotonic_fall_is_0() {
        assert!(rsi(&falling(30), 14).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_uses_last_window_only() {
        // An early crash outside the 14-delta window must not matter
        let mut prices = vec![500.0, 100.0];
        prices.extend(rising(15).iter().map(|p| p + 1.0));
        assert_eq!(rsi(&prices, 14), 100.0);
    }

    #[test]
    fn test_simple_returns() {
        let returns = simple_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - 0.1).abs() < 1e-9);
        assert!((returns[1] + 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_volatility_of_flat_series_is_zero() {
        assert_eq!(annualized_volatility(&[100.0; 30]), 0.0);
    }

    #[test]
    fn test_volatility_annualized() {
        // Alternating +1% / -1% style moves
        let mut prices = vec![100.0];
        for i in 0..40 {
            let last = *prices.last().unwrap();
            prices.push(if i % 2 == 0 { last * 1.01 } else { last * 0.99 });
        }
        let vol = annualized_volatility(&prices);
        assert!((vol - 0.01 * 252f64.sqrt()).abs() < 1e-3);
    }

    #[test]
    fn test_rate_of_change() {
        let prices = vec![10.0, 100.0, 101.0, 102.0, 103.0, 110.0];
        assert!((rate_of_change(&prices, 5) - 0.1).abs() < 1e-9);
        assert_eq!(rate_of_change(&prices[..3], 5), 0.0);
    }

    #[test]
    fn test_snapshot_needs_twenty_closes() {
        let snapshot = calculate_technical_indicators(&rising(19));
        assert_eq!(snapshot, TechnicalIndicators::default());
        assert_eq!(snapshot.rsi, 50.0);
        assert_eq!(snapshot.signal(), 0.0);
    }

    #[test]
    fn test_snapshot_uptrend() {
        let closes = rising(30);
        let snapshot = calculate_technical_indicators(&closes);

        assert!(snapshot.trend > 0.0 && snapshot.trend <= 1.0);
        assert!(snapshot.momentum > 0.0 && snapshot.momentum <= 1.0);
        assert!(snapshot.volatility > 0.0);
        assert_eq!(snapshot.rsi, 100.0);
        assert_eq!(snapshot.current_price, Some(129.0));
        assert_eq!(snapshot.sma_5, Some(127.0));
        assert!(snapshot.is_overbought());
    }

    #[test]
    fn test_snapshot_trend_formula() {
        let closes = rising(30);
        let snapshot = calculate_technical_indicators(&closes);
        let sma_20 = latest_sma(&closes, 20).unwrap();
        let expected = ((127.0 - sma_20) / sma_20 * 10.0).clamp(-1.0, 1.0);
        assert!((snapshot.trend - expected).abs() < 1e-9);
        let expected_momentum = ((129.0 - 125.0) / 125.0 * 5.0_f64).clamp(-1.0, 1.0);
        assert!((snapshot.momentum - expected_momentum).abs() < 1e-9);
    }

    #[test]
    fn test_signal_rsi_damping() {
        let base = TechnicalIndicators {
            trend: 0.5,
            momentum: 0.5,
            rsi: 50.0,
            ..TechnicalIndicators::default()
        };
        assert!((base.signal() - 0.5).abs() < 1e-9);

        let overbought = TechnicalIndicators { rsi: 75.0, ..base.clone() };
        assert!((overbought.signal() - 0.35).abs() < 1e-9);

        let oversold = TechnicalIndicators { rsi: 25.0, ..base };
        assert!((oversold.signal() - 0.35).abs() < 1e-9);
        assert!(oversold.is_oversold());
    }

    #[test]
    fn test_signal_is_clamped() {
        let extreme = TechnicalIndicators {
            trend: 1.0,
            momentum: 1.0,
            ..TechnicalIndicators::default()
        };
        assert!(extreme.signal() <= 1.0);

        let downtrend = calculate_technical_indicators(&falling(30));
        assert!(downtrend.signal() < 0.0 && downtrend.signal() >= -1.0);
    }
}

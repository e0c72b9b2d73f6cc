//! Small numeric helpers shared by the indicator and blending code.

/// Compute the mean of a data slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population standard deviation (divides by N, not N-1).
pub fn population_std_dev(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64;
    variance.sqrt()
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Percent change from `from` to `to`. Returns 0.0 when `from` is zero.
pub fn pct_change(from: f64, to: f64) -> f64 {
    if from == 0.0 {
        return 0.0;
    }
    (to - from) / from * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_population_std_dev() {
        let data = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_std_dev(&data) - 2.0).abs() < 1e-9);
        assert_eq!(population_std_dev(&[1.0]), 0.0);
    }

    #[test]
    fn test_round_to() {
        assert!((round_to(1.23456, 2) - 1.23).abs() < 1e-12);
        assert!((round_to(-0.98765, 4) - (-0.9877)).abs() < 1e-12);
    }

    #[test]
    fn test_pct_change() {
        assert!((pct_change(100.0, 110.0) - 10.0).abs() < 1e-9);
        assert_eq!(pct_change(0.0, 5.0), 0.0);
    }
}

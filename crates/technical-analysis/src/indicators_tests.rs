#[cfg(test)]
mod tests {
    use super::super::indicators::*;
    use analysis_core::Bar;
    use chrono::Utc;

    // Wilder's original RSI worksheet
    fn sample_prices() -> Vec<f64> {
        vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ]
    }

    fn sample_bars(ranges: &[(f64, f64)]) -> Vec<Bar> {
        ranges
            .iter()
            .enumerate()
            .map(|(i, &(high, low))| Bar {
                timestamp: Utc::now() - chrono::Duration::days(ranges.len() as i64 - i as i64),
                open: low,
                high,
                low,
                close: high,
                volume: 1000000.0,
            })
            .collect()
    }

    #[test]
    fn test_sma_basic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&data, 3);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 2.0).abs() < 0.001);
        assert!((result[1] - 3.0).abs() < 0.001);
        assert!((result[2] - 4.0).abs() < 0.001);
    }

    #[test]
    fn test_sma_insufficient_data() {
        assert!(sma(&[1.0, 2.0], 5).is_empty());
        assert!(sma(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn test_rsi_matches_wilder_worksheet() {
        let result = rsi(&sample_prices(), 14);

        assert_eq!(result.len(), 6);
        assert!((result[0] - 70.46).abs() < 0.01);
        assert!((result[5] - 57.92).abs() < 0.01);
        for &value in &result {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let data: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let result = rsi(&data, 14);
        assert!(result.iter().all(|v| (*v - 100.0).abs() < 1e-9));
    }

    #[test]
    fn test_rsi_all_losses_is_0() {
        let data: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        assert!(latest_rsi(&data, 14) < 1e-9);
    }

    #[test]
    fn test_latest_rsi_short_history_is_neutral() {
        let data = vec![1.0, 2.0, 3.0];
        assert!(rsi(&data, 14).is_empty());
        assert_eq!(latest_rsi(&data, 14), NEUTRAL_RSI);
    }

    #[test]
    fn test_average_range() {
        let bars = sample_bars(&[(10.0, 8.0), (11.0, 10.0), (12.0, 9.0)]);
        // (2 + 1 + 3) / 3
        assert!((average_range(&bars, 3).unwrap() - 2.0).abs() < 1e-9);
        // last two only
        assert!((average_range(&bars, 2).unwrap() - 2.0).abs() < 1e-9);
        assert!(average_range(&bars, 4).is_none());
    }

    #[test]
    fn test_normalized_slope_direction() {
        let up: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let down: Vec<f64> = up.iter().rev().copied().collect();
        let flat = vec![50.0; 20];

        let s = normalized_slope(&up, 20);
        // slope 1 over mean 109.5
        assert!((s - 1.0 / 109.5).abs() < 1e-9);
        assert!((normalized_slope(&down, 20) + s).abs() < 1e-9);
        assert_eq!(normalized_slope(&flat, 20), 0.0);
    }

    #[test]
    fn test_normalized_slope_degenerate_inputs() {
        assert_eq!(normalized_slope(&[1.0, 2.0], 20), 0.0);
        assert_eq!(normalized_slope(&[0.0; 20], 20), 0.0);
        assert_eq!(normalized_slope(&[5.0; 20], 1), 0.0);
    }
}

use crate::stats::median;

/// `(upper-lower)/max(1e-8, mean) * 100` for a 20-bar, `k`-sigma band
/// (spec §4.3, glossary "Bollinger width %"). `closes` must hold exactly the
/// lookback window (oldest first); `None` if empty.
pub fn width_pct(closes: &[f64], k: f64) -> Option<f64> {
    if closes.is_empty() {
        return None;
    }
    let n = closes.len() as f64;
    let mean = closes.iter().sum::<f64>() / n;
    let variance = closes.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
    let sd = variance.sqrt();
    let upper = mean + k * sd;
    let lower = mean - k * sd;
    Some((upper - lower) / mean.max(1e-8) * 100.0)
}

/// `latest / max(1e-8, median(window)) * 100` — shared shape used both for
/// Bollinger-adjacent volume ratios and `volumePct` (spec §4.3).
pub fn ratio_to_median_pct(latest: f64, window: &[f64]) -> f64 {
    latest / median(window).max(1e-8) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_series_has_zero_width() {
        let closes = vec![100.0; 20];
        let width = width_pct(&closes, 2.0).unwrap();
        assert!(width.abs() < 1e-9);
    }

    #[test]
    fn volatile_series_has_positive_width() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i as f64 % 2.0) * 5.0).collect();
        let width = width_pct(&closes, 2.0).unwrap();
        assert!(width > 0.0);
    }

    #[test]
    fn empty_is_none() {
        assert!(width_pct(&[], 2.0).is_none());
    }

    #[test]
    fn ratio_to_median_pct_matches_formula() {
        let window = vec![10.0, 20.0, 30.0];
        assert!((ratio_to_median_pct(40.0, &window) - 200.0).abs() < 1e-9);
    }
}

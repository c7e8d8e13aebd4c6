use serde::{Deserialize, Serialize};

use crate::candle::Timeframe;

/// Derived purely from the most recent ≥205 candles ending at `close_time_ms`
/// (spec §3 "FeatureVector", §4.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub close_time_ms: i64,

    pub log_return: f64,
    pub atr_pct: f64,
    pub ewma_sigma: f64,
    pub sigma_norm: f64,
    pub vol_pct_5m: f64,
    pub bb_width_pct: f64,
    /// In `[0, 100]`.
    pub bb_width_percentile: f64,
    pub ema20: f64,
    pub ema50: f64,
    pub ema200: f64,
    pub ema50_slope: f64,
    pub volume_pct: f64,
    /// In `[0, 100]`.
    pub volume_percentile: f64,
}

impl FeatureVector {
    /// `0 <= bb_width_percentile <= 100`, `0 <= volume_percentile <= 100`, `ewma_sigma >= 0`.
    pub fn is_valid(&self) -> bool {
        (0.0..=100.0).contains(&self.bb_width_percentile)
            && (0.0..=100.0).contains(&self.volume_percentile)
            && self.ewma_sigma >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_feature() -> FeatureVector {
        FeatureVector {
            symbol: "BTCUSDT".into(),
            timeframe: Timeframe::M5,
            close_time_ms: 300_000,
            log_return: 0.001,
            atr_pct: 1.2,
            ewma_sigma: 0.01,
            sigma_norm: 1.0,
            vol_pct_5m: 2.2,
            bb_width_pct: 3.0,
            bb_width_percentile: 50.0,
            ema20: 100.0,
            ema50: 99.0,
            ema200: 95.0,
            ema50_slope: 0.01,
            volume_pct: 110.0,
            volume_percentile: 60.0,
        }
    }

    #[test]
    fn valid_feature_passes() {
        assert!(ok_feature().is_valid());
    }

    #[test]
    fn percentile_out_of_range_is_invalid() {
        let mut f = ok_feature();
        f.bb_width_percentile = 101.0;
        assert!(!f.is_valid());
        let mut g = ok_feature();
        g.volume_percentile = -1.0;
        assert!(!g.is_valid());
    }

    #[test]
    fn negative_sigma_is_invalid() {
        let mut f = ok_feature();
        f.ewma_sigma = -0.01;
        assert!(!f.is_valid());
    }
}

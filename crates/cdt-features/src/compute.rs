use cdt_indicators::{atr_pct, ema, ewma_variance, log_returns, percentile_rank, ratio_to_median_pct, sigma, sigma_norm, slope_over, vol_pct_5m, width_pct, Ohlc};
use cdt_schemas::{Candle, FeatureVector, Timeframe};

use crate::config::FeatureConfig;

/// Computes the full feature vector from `candles` (oldest-first, the same
/// window the caller loaded via `CandleRepository::load_recent`). Returns
/// `None` when there isn't enough history — the caller silently skips in
/// that case (spec §4.3: "requires ≥205 candles and ≥30 usable log-returns;
/// otherwise silently skips").
pub fn compute_features(candles: &[Candle], config: &FeatureConfig) -> Option<FeatureVector> {
    if candles.len() < config.min_candles {
        return None;
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
    let bars: Vec<Ohlc> = candles
        .iter()
        .map(|c| Ohlc { high: c.high, low: c.low, close: c.close })
        .collect();

    let returns = log_returns(&closes);
    if returns.len() < config.min_log_returns {
        return None;
    }
    let log_return = *returns.last()?;

    let atr_pct_value = atr_pct(&bars, config.atr_period)?;

    let lambda = match candles.last()?.timeframe {
        Timeframe::M5 => config.ewma_lambda_5m,
        Timeframe::M1 => config.ewma_lambda_1m,
    };
    let variances = ewma_variance(&returns, lambda);
    let sigma_series: Vec<f64> = variances.iter().map(|v| sigma(*v)).collect();
    let ewma_sigma = *sigma_series.last()?;
    let sigma_window = last_n(&sigma_series, config.sigma_window);
    let sigma_norm_value = sigma_norm(ewma_sigma, &sigma_window);
    let vol_pct_5m_value = vol_pct_5m(ewma_sigma);

    let bb_widths = rolling_bb_widths(&closes, config.bb_lookback, config.bb_k);
    let bb_width_pct = *bb_widths.last()?;
    let bb_window = last_n(&bb_widths, config.bb_window);
    let bb_width_percentile = percentile_rank(&bb_window, bb_width_pct);

    let (p20, p50, p200) = config.ema_periods;
    let ema20 = *ema(&closes, p20).last()?;
    let ema50_series = ema(&closes, p50);
    let ema50 = *ema50_series.last()?;
    let ema200 = *ema(&closes, p200).last()?;
    let ema50_slope = slope_over(&ema50_series, config.ema50_slope_lag).unwrap_or(0.0);

    let latest_volume = *volumes.last()?;
    let volume_window = last_n(&volumes, config.volume_window);
    let volume_percentile = percentile_rank(&volume_window, latest_volume);
    let volume_pct = ratio_to_median_pct(latest_volume, &volume_window);

    let last_candle = candles.last()?;

    Some(FeatureVector {
        symbol: last_candle.symbol.clone(),
        timeframe: last_candle.timeframe,
        close_time_ms: last_candle.close_time_ms,
        log_return,
        atr_pct: atr_pct_value,
        ewma_sigma,
        sigma_norm: sigma_norm_value,
        vol_pct_5m: vol_pct_5m_value,
        bb_width_pct,
        bb_width_percentile,
        ema20,
        ema50,
        ema200,
        ema50_slope,
        volume_pct,
        volume_percentile,
    })
}

fn last_n(values: &[f64], n: usize) -> Vec<f64> {
    let start = values.len().saturating_sub(n);
    values[start..].to_vec()
}

/// A rolling series of Bollinger width % values, one per index once a full
/// `lookback`-bar window is available (spec §4.3).
fn rolling_bb_widths(closes: &[f64], lookback: usize, k: f64) -> Vec<f64> {
    if closes.len() < lookback {
        return Vec::new();
    }
    (lookback - 1..closes.len())
        .filter_map(|i| width_pct(&closes[i + 1 - lookback..=i], k))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(i: usize, symbol: &str, timeframe: Timeframe) -> Candle {
        let base = 100.0 + (i as f64 * 0.05).sin() * 2.0;
        Candle {
            symbol: symbol.into(),
            timeframe,
            close_time_ms: (i as i64 + 1) * timeframe.interval_ms(),
            open: base,
            high: base + 1.0,
            low: base - 1.0,
            close: base + 0.1,
            volume: 10.0 + (i % 7) as f64,
        }
    }

    fn series(n: usize, timeframe: Timeframe) -> Vec<Candle> {
        (0..n).map(|i| candle(i, "BTCUSDT", timeframe)).collect()
    }

    #[test]
    fn too_few_candles_skips() {
        let config = FeatureConfig::default();
        assert!(compute_features(&series(204, Timeframe::M5), &config).is_none());
    }

    #[test]
    fn enough_history_produces_a_valid_feature() {
        let config = FeatureConfig::default();
        let candles = series(260, Timeframe::M5);
        let feature = compute_features(&candles, &config).unwrap();
        assert!(feature.is_valid());
        assert_eq!(feature.symbol, "BTCUSDT");
        assert_eq!(feature.close_time_ms, candles.last().unwrap().close_time_ms);
    }

    #[test]
    fn uses_1m_lambda_for_1m_timeframe() {
        let config = FeatureConfig::default();
        let candles_1m = series(260, Timeframe::M1);
        let candles_5m = series(260, Timeframe::M5);
        let f1 = compute_features(&candles_1m, &config).unwrap();
        let f5 = compute_features(&candles_5m, &config).unwrap();
        // Same price path, different lambda: sigmas should differ.
        assert_ne!(f1.ewma_sigma, f5.ewma_sigma);
    }
}

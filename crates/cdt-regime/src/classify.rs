use cdt_schemas::Regime;

use crate::config::RegimeConfig;

/// Ordered classification cascade (spec §4.4):
/// 1. compression iff both percentiles ≤ `compression_th`.
/// 2. else expansion-chaos iff both percentiles ≥ `expansion_th`.
/// 3. else trend iff sigma percentile and slope percentile ≥ `trend_th`.
/// 4. else range.
pub fn classify_regime(
    sigma_norm_pct: f64,
    bb_width_pctile: f64,
    slope_abs_pctile: f64,
    config: &RegimeConfig,
) -> Regime {
    if sigma_norm_pct <= config.compression_th && bb_width_pctile <= config.compression_th {
        Regime::Compression
    } else if sigma_norm_pct >= config.expansion_th && bb_width_pctile >= config.expansion_th {
        Regime::ExpansionChaos
    } else if sigma_norm_pct >= config.trend_th && slope_abs_pctile >= config.trend_th {
        Regime::Trend
    } else {
        Regime::Range
    }
}

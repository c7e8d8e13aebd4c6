/// Window sizes and constants for feature computation (spec §4.3). Only
/// `windowSize=100` for the regime engine's ring buffer is given an explicit
/// default in the spec; `sigmaWindow`/`bbWindow`/`volumeWindow` are left
/// unspecified there — this workspace defaults all three to the same `100`
/// (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureConfig {
    pub atr_period: usize,
    pub ewma_lambda_5m: f64,
    pub ewma_lambda_1m: f64,
    pub sigma_window: usize,
    pub bb_lookback: usize,
    pub bb_k: f64,
    pub bb_window: usize,
    pub ema_periods: (usize, usize, usize),
    pub ema50_slope_lag: usize,
    pub volume_window: usize,
    pub min_candles: usize,
    pub min_log_returns: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        FeatureConfig {
            atr_period: 14,
            ewma_lambda_5m: 0.97,
            ewma_lambda_1m: 0.94,
            sigma_window: 100,
            bb_lookback: 20,
            bb_k: 2.0,
            bb_window: 100,
            ema_periods: (20, 50, 200),
            ema50_slope_lag: 5,
            volume_window: 100,
            min_candles: 205,
            min_log_returns: 30,
        }
    }
}

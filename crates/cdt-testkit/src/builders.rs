use cdt_schemas::{Candle, Engine, FeatureVector, Side, Timeframe, TpModel, TradePlan};

/// A valid 1m candle at `close_time_ms` with a flat `100 ± 0.5` body.
/// Override fields on the returned struct for scenario-specific shapes.
pub fn candle(symbol: &str, timeframe: Timeframe, close_time_ms: i64, close: f64) -> Candle {
    Candle {
        symbol: symbol.to_string(),
        timeframe,
        close_time_ms,
        open: close,
        high: close + 0.5,
        low: close - 0.5,
        close,
        volume: 1.0,
    }
}

/// A run of `count` candles spaced one `timeframe` interval apart, starting
/// at `close_time_ms`, each closing at `close`.
pub fn candle_series(symbol: &str, timeframe: Timeframe, close_time_ms: i64, count: usize, close: f64) -> Vec<Candle> {
    let step = timeframe.interval_ms();
    (0..count)
        .map(|i| candle(symbol, timeframe, close_time_ms + (i as i64) * step, close))
        .collect()
}

/// A valid, unremarkable feature vector. Override fields for scenario-
/// specific shapes (regime thresholds, gate values, etc).
pub fn feature_vector(symbol: &str, timeframe: Timeframe, close_time_ms: i64) -> FeatureVector {
    FeatureVector {
        symbol: symbol.to_string(),
        timeframe,
        close_time_ms,
        log_return: 0.0,
        atr_pct: 1.0,
        ewma_sigma: 0.01,
        sigma_norm: 1.0,
        vol_pct_5m: 2.0,
        bb_width_pct: 1.0,
        bb_width_percentile: 50.0,
        ema20: 100.0,
        ema50: 99.0,
        ema200: 95.0,
        ema50_slope: 0.01,
        volume_pct: 100.0,
        volume_percentile: 50.0,
    }
}

/// A valid, unremarkable trade plan. Override fields for scenario-specific
/// shapes.
pub fn trade_plan(symbol: &str, side: Side, engine: Engine, entry_price: f64, expires_at_ms: i64) -> TradePlan {
    TradePlan {
        symbol: symbol.to_string(),
        side,
        engine,
        entry_price,
        stop_pct: 1.0,
        tp_model: TpModel::A,
        leverage: 3.0,
        margin_pct: 2.0,
        expires_at_ms,
        reason: "test_plan".to_string(),
        params_version_id: "v1".to_string(),
        confidence: 0.8,
    }
}

use cdt_db::CandleRepository;
use cdt_indicators::clamp;
use cdt_schemas::{Engine, FeatureVector, Regime, Side, Timeframe, TpModel, TradePlan};

use crate::common::{clamp_leverage, StrategyEngine};

/// Spec §4.5.1. Numeric defaults not pinned by the spec itself
/// (`leverage_base`, `engine_min`/`engine_max`, `exchange_max`,
/// `margin_pct`) are this workspace's own choice — see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakoutConfig {
    pub compression_percentile_max: f64,
    pub volume_percentile_min: f64,
    pub range_lookback_bars: usize,
    pub confirmation_bars: usize,
    pub breakout_buffer_pct: f64,
    pub kb: f64,
    pub leverage_base: f64,
    pub engine_min_leverage: f64,
    pub engine_max_leverage: f64,
    pub exchange_max_leverage: f64,
    pub margin_pct: f64,
    pub expiry_ms: i64,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        BreakoutConfig {
            compression_percentile_max: 35.0,
            volume_percentile_min: 60.0,
            range_lookback_bars: 20,
            confirmation_bars: 2,
            breakout_buffer_pct: 0.02,
            kb: 1.2,
            leverage_base: 6.0,
            engine_min_leverage: 1.0,
            engine_max_leverage: 5.0,
            exchange_max_leverage: 10.0,
            margin_pct: 2.0,
            expiry_ms: 5 * 60_000,
        }
    }
}

pub struct Breakout {
    pub config: BreakoutConfig,
}

impl StrategyEngine for Breakout {
    fn engine(&self) -> Engine {
        Engine::Breakout
    }

    fn owning_regime(&self) -> Regime {
        Regime::Compression
    }

    fn timeframe(&self) -> Timeframe {
        Timeframe::M1
    }

    fn evaluate(&self, feature: &FeatureVector, candles: &dyn CandleRepository, _now_ms: i64) -> Result<TradePlan, String> {
        let cfg = &self.config;

        if feature.bb_width_percentile > cfg.compression_percentile_max {
            return Err("breakout_bb_width_gate".into());
        }
        if feature.volume_percentile < cfg.volume_percentile_min {
            return Err("breakout_volume_gate".into());
        }

        let needed = cfg.range_lookback_bars + cfg.confirmation_bars + 1;
        let history = candles.load_recent(&feature.symbol, Timeframe::M1, feature.close_time_ms, needed);
        if history.len() < needed {
            return Err("breakout_insufficient_history".into());
        }

        let split = history.len() - cfg.confirmation_bars;
        let baseline = &history[..split];
        let recent = &history[split..];

        let upper = baseline.iter().map(|c| c.close).fold(f64::MIN, f64::max) * (1.0 + cfg.breakout_buffer_pct / 100.0);
        let lower = baseline.iter().map(|c| c.close).fold(f64::MAX, f64::min) * (1.0 - cfg.breakout_buffer_pct / 100.0);

        let side = if recent.iter().all(|c| c.close > upper) {
            Side::Long
        } else if recent.iter().all(|c| c.close < lower) {
            Side::Short
        } else {
            return Err("breakout_no_confirmed_breakout".into());
        };

        let entry_price = recent.last().ok_or("breakout_insufficient_history")?.close;
        let stop_pct = cfg.kb * feature.atr_pct;
        let raw_leverage = cfg.leverage_base / feature.sigma_norm.max(1e-8).sqrt();
        let leverage = clamp_leverage(raw_leverage, cfg.engine_min_leverage, cfg.engine_max_leverage, cfg.exchange_max_leverage);
        let confidence = clamp(
            ((feature.volume_percentile - cfg.volume_percentile_min) / (100.0 - cfg.volume_percentile_min)
                + (cfg.compression_percentile_max - feature.bb_width_percentile) / cfg.compression_percentile_max)
                / 2.0,
            0.0,
            1.0,
        );

        Ok(TradePlan {
            symbol: feature.symbol.clone(),
            side,
            engine: Engine::Breakout,
            entry_price,
            stop_pct,
            tp_model: TpModel::A,
            leverage,
            margin_pct: cfg.margin_pct,
            expires_at_ms: feature.close_time_ms + cfg.expiry_ms,
            reason: "breakout_confirmed".into(),
            params_version_id: String::new(),
            confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdt_db::InMemoryCandleRepository;
    use cdt_schemas::Candle;

    fn feature(bb_pct: f64, vol_pct: f64) -> FeatureVector {
        FeatureVector {
            symbol: "BTCUSDT".into(),
            timeframe: Timeframe::M1,
            close_time_ms: 23 * 60_000,
            log_return: 0.0,
            atr_pct: 1.0,
            ewma_sigma: 0.01,
            sigma_norm: 1.0,
            vol_pct_5m: 2.0,
            bb_width_pct: 1.0,
            bb_width_percentile: bb_pct,
            ema20: 100.0,
            ema50: 100.0,
            ema200: 100.0,
            ema50_slope: 0.0,
            volume_pct: 100.0,
            volume_percentile: vol_pct,
        }
    }

    fn candle(i: i64, close: f64) -> Candle {
        Candle {
            symbol: "BTCUSDT".into(),
            timeframe: Timeframe::M1,
            close_time_ms: i * 60_000,
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn width_gate_rejects() {
        let breakout = Breakout { config: BreakoutConfig::default() };
        let repo = InMemoryCandleRepository::new();
        let err = breakout.evaluate(&feature(40.0, 90.0), &repo, 0).unwrap_err();
        assert_eq!(err, "breakout_bb_width_gate");
    }

    #[test]
    fn volume_gate_rejects() {
        let breakout = Breakout { config: BreakoutConfig::default() };
        let repo = InMemoryCandleRepository::new();
        let err = breakout.evaluate(&feature(10.0, 20.0), &repo, 0).unwrap_err();
        assert_eq!(err, "breakout_volume_gate");
    }

    #[test]
    fn confirmed_upward_breakout_produces_a_long_plan() {
        let breakout = Breakout { config: BreakoutConfig::default() };
        let repo = InMemoryCandleRepository::new();
        for i in 1..=21 {
            repo.upsert(candle(i, 100.0));
        }
        repo.upsert(candle(22, 110.0));
        repo.upsert(candle(23, 111.0));

        let plan = breakout.evaluate(&feature(10.0, 90.0), &repo, 0).unwrap();
        assert_eq!(plan.side, Side::Long);
        assert_eq!(plan.tp_model, TpModel::A);
        assert!(plan.is_valid(0));
    }

    #[test]
    fn unconfirmed_range_rejects() {
        let breakout = Breakout { config: BreakoutConfig::default() };
        let repo = InMemoryCandleRepository::new();
        for i in 1..=23 {
            repo.upsert(candle(i, 100.0));
        }
        let err = breakout.evaluate(&feature(10.0, 90.0), &repo, 0).unwrap_err();
        assert_eq!(err, "breakout_no_confirmed_breakout");
    }
}

use cdt_db::CandleRepository;
use cdt_indicators::clamp;
use cdt_schemas::{Engine, FeatureVector, Regime, Side, Timeframe, TpModel, TradePlan};

use crate::common::{clamp_leverage, StrategyEngine};

/// Spec §4.5.3. Leverage/margin numerics not pinned by the spec are this
/// workspace's own defaults — see DESIGN.md. `expiry_ms` is also undecided
/// by the spec for this engine; defaulted to the same 10 minutes as the
/// other 5m engine (Continuation).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReversalConfig {
    pub range_lookback_bars: usize,
    pub touch_pct: f64,
    pub confirmation_body_pct: f64,
    pub ks: f64,
    pub leverage_base: f64,
    pub sigma_min: f64,
    pub sigma_max: f64,
    pub engine_min_leverage: f64,
    pub engine_max_leverage: f64,
    pub exchange_max_leverage: f64,
    pub margin_pct: f64,
    pub expiry_ms: i64,
}

impl Default for ReversalConfig {
    fn default() -> Self {
        ReversalConfig {
            range_lookback_bars: 30,
            touch_pct: 0.05,
            confirmation_body_pct: 0.04,
            ks: 0.8,
            leverage_base: 4.0,
            sigma_min: 0.1,
            sigma_max: 5.0,
            engine_min_leverage: 1.0,
            engine_max_leverage: 3.0,
            exchange_max_leverage: 10.0,
            margin_pct: 2.0,
            expiry_ms: 10 * 60_000,
        }
    }
}

pub struct Reversal {
    pub config: ReversalConfig,
}

impl StrategyEngine for Reversal {
    fn engine(&self) -> Engine {
        Engine::Reversal
    }

    fn owning_regime(&self) -> Regime {
        Regime::Range
    }

    fn timeframe(&self) -> Timeframe {
        Timeframe::M5
    }

    fn evaluate(&self, feature: &FeatureVector, candles: &dyn CandleRepository, _now_ms: i64) -> Result<TradePlan, String> {
        let cfg = &self.config;
        let history = candles.load_recent(&feature.symbol, Timeframe::M5, feature.close_time_ms, cfg.range_lookback_bars);
        if history.len() < cfg.range_lookback_bars {
            return Err("reversal_insufficient_history".into());
        }

        let range_high = history.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let range_low = history.iter().map(|c| c.low).fold(f64::MAX, f64::min);
        let latest = history.last().ok_or("reversal_insufficient_history")?;

        let touched_upper = latest.close >= range_high * (1.0 - cfg.touch_pct / 100.0);
        let touched_lower = latest.close <= range_low * (1.0 + cfg.touch_pct / 100.0);
        if !touched_upper && !touched_lower {
            return Err("reversal_no_range_touch".into());
        }

        let body_pct = (latest.close - latest.open).abs() / latest.open.abs().max(1e-8) * 100.0;
        if body_pct < cfg.confirmation_body_pct {
            return Err("reversal_weak_confirmation_body".into());
        }

        let side = if touched_upper && latest.close < latest.open && latest.high >= range_high {
            Side::Short
        } else if touched_lower && latest.close > latest.open && latest.low <= range_low {
            Side::Long
        } else {
            return Err("reversal_no_confirmed_reversal".into());
        };

        let stop_pct = cfg.ks * feature.atr_pct;
        let sigma_clamped = clamp(feature.sigma_norm, cfg.sigma_min, cfg.sigma_max);
        let raw_leverage = cfg.leverage_base / sigma_clamped.max(1e-8);
        let leverage = clamp_leverage(raw_leverage, cfg.engine_min_leverage, cfg.engine_max_leverage, cfg.exchange_max_leverage);
        let confidence = clamp(body_pct / (cfg.confirmation_body_pct * 5.0), 0.0, 1.0);

        Ok(TradePlan {
            symbol: feature.symbol.clone(),
            side,
            engine: Engine::Reversal,
            entry_price: latest.close,
            stop_pct,
            tp_model: TpModel::B,
            leverage,
            margin_pct: cfg.margin_pct,
            expires_at_ms: feature.close_time_ms + cfg.expiry_ms,
            reason: "reversal_confirmed".into(),
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

    fn feature() -> FeatureVector {
        FeatureVector {
            symbol: "BTCUSDT".into(),
            timeframe: Timeframe::M5,
            close_time_ms: 30 * 300_000,
            log_return: 0.0,
            atr_pct: 1.0,
            ewma_sigma: 0.01,
            sigma_norm: 0.4,
            vol_pct_5m: 2.0,
            bb_width_pct: 1.0,
            bb_width_percentile: 50.0,
            ema20: 100.0,
            ema50: 100.0,
            ema200: 100.0,
            ema50_slope: 0.0,
            volume_pct: 100.0,
            volume_percentile: 50.0,
        }
    }

    fn flat_candle(i: i64) -> Candle {
        Candle {
            symbol: "BTCUSDT".into(),
            timeframe: Timeframe::M5,
            close_time_ms: i * 300_000,
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.0,
            volume: 1.0,
        }
    }

    #[test]
    fn no_touch_rejects() {
        let reversal = Reversal { config: ReversalConfig::default() };
        let repo = InMemoryCandleRepository::new();
        for i in 1..=30 {
            repo.upsert(flat_candle(i));
        }
        let err = reversal.evaluate(&feature(), &repo, 0).unwrap_err();
        assert_eq!(err, "reversal_no_range_touch");
    }

    #[test]
    fn upper_touch_with_bearish_rejection_bar_shorts() {
        let reversal = Reversal { config: ReversalConfig::default() };
        let repo = InMemoryCandleRepository::new();
        for i in 1..=29 {
            repo.upsert(flat_candle(i));
        }
        repo.upsert(Candle {
            symbol: "BTCUSDT".into(),
            timeframe: Timeframe::M5,
            close_time_ms: 30 * 300_000,
            open: 101.0,
            high: 101.0,
            low: 99.6,
            close: 100.95,
            volume: 1.0,
        });

        let plan = reversal.evaluate(&feature(), &repo, 0).unwrap();
        assert_eq!(plan.side, Side::Short);
        assert_eq!(plan.tp_model, TpModel::B);
    }
}

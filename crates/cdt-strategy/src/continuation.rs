use cdt_db::CandleRepository;
use cdt_indicators::clamp;
use cdt_schemas::{Engine, FeatureVector, Regime, Side, Timeframe, TpModel, TradePlan};

use crate::common::StrategyEngine;

/// One rung of the stepwise leverage ladder (spec §4.5.2: "walk
/// `leverageBands` (ascending maxSigmaNorm) and pick first band whose
/// maxSigmaNorm ≥ clamp(sigmaNorm, sigmaMin, sigmaMax)").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeverageBand {
    pub max_sigma_norm: f64,
    pub leverage: f64,
}

/// Spec §4.5.2. The leverage ladder and `sigma_min`/`sigma_max` bounds are
/// not pinned numerically by the spec — this workspace's defaults, see
/// DESIGN.md.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuationConfig {
    pub confirmation_bars: usize,
    pub pullback_zone_pct: f64,
    pub ks: f64,
    pub leverage_bands: Vec<LeverageBand>,
    pub sigma_min: f64,
    pub sigma_max: f64,
    pub margin_pct: f64,
    pub expiry_ms: i64,
}

impl Default for ContinuationConfig {
    fn default() -> Self {
        ContinuationConfig {
            confirmation_bars: 2,
            pullback_zone_pct: 0.25,
            ks: 0.9,
            leverage_bands: vec![
                LeverageBand { max_sigma_norm: 0.5, leverage: 5.0 },
                LeverageBand { max_sigma_norm: 1.0, leverage: 3.0 },
                LeverageBand { max_sigma_norm: 2.0, leverage: 2.0 },
                LeverageBand { max_sigma_norm: f64::INFINITY, leverage: 1.0 },
            ],
            sigma_min: 0.1,
            sigma_max: 5.0,
            margin_pct: 2.0,
            expiry_ms: 10 * 60_000,
        }
    }
}

pub struct Continuation {
    pub config: ContinuationConfig,
}

fn band_leverage(bands: &[LeverageBand], sigma_norm: f64) -> f64 {
    bands
        .iter()
        .find(|b| b.max_sigma_norm >= sigma_norm)
        .map(|b| b.leverage)
        .unwrap_or_else(|| bands.last().map(|b| b.leverage).unwrap_or(1.0))
}

impl StrategyEngine for Continuation {
    fn engine(&self) -> Engine {
        Engine::Continuation
    }

    fn owning_regime(&self) -> Regime {
        Regime::Trend
    }

    fn timeframe(&self) -> Timeframe {
        Timeframe::M5
    }

    fn evaluate(&self, feature: &FeatureVector, candles: &dyn CandleRepository, _now_ms: i64) -> Result<TradePlan, String> {
        let cfg = &self.config;
        let side = if feature.ema50 >= feature.ema200 { Side::Long } else { Side::Short };

        let history = candles.load_recent(&feature.symbol, Timeframe::M5, feature.close_time_ms, cfg.confirmation_bars);
        if history.len() < cfg.confirmation_bars {
            return Err("continuation_insufficient_history".into());
        }
        let latest = history.last().ok_or("continuation_insufficient_history")?;
        let previous = &history[history.len() - 2];

        let zone_lo = feature.ema20.min(feature.ema50) * (1.0 - cfg.pullback_zone_pct / 100.0);
        let zone_hi = feature.ema20.max(feature.ema50) * (1.0 + cfg.pullback_zone_pct / 100.0);
        if !(zone_lo..=zone_hi).contains(&latest.close) {
            return Err("continuation_outside_pullback_zone".into());
        }

        let confirmed = match side {
            Side::Long => latest.close > previous.high && latest.close > feature.ema20,
            Side::Short => latest.close < previous.low && latest.close < feature.ema20,
        };
        if !confirmed {
            return Err("continuation_not_confirmed".into());
        }

        let stop_pct = cfg.ks * feature.atr_pct;
        let sigma_clamped = clamp(feature.sigma_norm, cfg.sigma_min, cfg.sigma_max);
        let leverage = band_leverage(&cfg.leverage_bands, sigma_clamped);
        let confidence = clamp(
            ((latest.close - previous.close).abs() / previous.close.abs().max(1e-8)) * 20.0,
            0.0,
            1.0,
        );

        Ok(TradePlan {
            symbol: feature.symbol.clone(),
            side,
            engine: Engine::Continuation,
            entry_price: latest.close,
            stop_pct,
            tp_model: TpModel::B,
            leverage,
            margin_pct: cfg.margin_pct,
            expires_at_ms: feature.close_time_ms + cfg.expiry_ms,
            reason: "continuation_confirmed".into(),
            params_version_id: String::new(),
            confidence,
        })
    }
}

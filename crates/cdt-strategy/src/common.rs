use cdt_db::CandleRepository;
use cdt_schemas::{Engine, FeatureVector, Regime, Timeframe, TradePlan};

/// One strategy engine (spec §4.5): a pure function of the latest feature
/// vector plus whatever recent candle history it needs. Engines never see a
/// `ParamVersion` registry — `paramsVersionId` is stamped later, by
/// `StrategyPlanner::normalize` alone.
pub trait StrategyEngine {
    fn engine(&self) -> Engine;

    /// The regime this engine owns entries for (spec §4.4 engine mapping).
    fn owning_regime(&self) -> Regime;

    /// The feature timeframe this engine consumes.
    fn timeframe(&self) -> Timeframe;

    /// `Ok(plan)` on trigger; `Err(reason)` on any rejected gate — the
    /// reason becomes the planner's audited rejection string (spec §4.6).
    fn evaluate(&self, feature: &FeatureVector, candles: &dyn CandleRepository, now_ms: i64) -> Result<TradePlan, String>;
}

/// Two ordered clamps: first to the engine's own band, then to the
/// exchange-wide ceiling (spec §4.5.1, §4.5.3: "leverage =
/// clamp(clamp(raw, engineMin, engineMax), engineMin, exchangeMax)").
pub fn clamp_leverage(raw: f64, engine_min: f64, engine_max: f64, exchange_max: f64) -> f64 {
    let banded = cdt_indicators::clamp(raw, engine_min, engine_max);
    cdt_indicators::clamp(banded, engine_min, exchange_max)
}

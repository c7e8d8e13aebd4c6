use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use cdt_bus::{Bus, Event};
use cdt_db::RegimeRepository;
use cdt_indicators::percentile_rank;
use cdt_schemas::{FeatureVector, RegimeDecision, Timeframe};

use crate::classify::classify_regime;
use crate::config::RegimeConfig;

/// Per-symbol ring buffer of 5m features (spec §4.4): "maintains a
/// per-(symbol, timeframe) ring buffer of the last `windowSize` features",
/// but only the 5m timeframe ever reaches classification (spec §2 control
/// flow: "RegimeEngine (5m features only)").
pub struct RegimeEngine<'a> {
    pub regimes: &'a dyn RegimeRepository,
    pub bus: &'a Bus,
    pub config: RegimeConfig,
    rings: Mutex<HashMap<String, VecDeque<FeatureVector>>>,
}

impl<'a> RegimeEngine<'a> {
    pub fn new(regimes: &'a dyn RegimeRepository, bus: &'a Bus, config: RegimeConfig) -> Self {
        RegimeEngine { regimes, bus, config, rings: Mutex::new(HashMap::new()) }
    }

    pub fn on_features_ready(&self, feature: &FeatureVector) {
        if feature.timeframe != Timeframe::M5 {
            return;
        }

        let (sigma_norms, bb_widths, abs_slopes) = {
            let mut rings = self.rings.lock().unwrap();
            let ring = rings.entry(feature.symbol.clone()).or_default();
            ring.push_back(feature.clone());
            while ring.len() > self.config.window_size {
                ring.pop_front();
            }
            let sigma_norms: Vec<f64> = ring.iter().map(|f| f.sigma_norm).collect();
            let bb_widths: Vec<f64> = ring.iter().map(|f| f.bb_width_pct).collect();
            let abs_slopes: Vec<f64> = ring.iter().map(|f| f.ema50_slope.abs()).collect();
            (sigma_norms, bb_widths, abs_slopes)
        };

        let sigma_norm_pct = percentile_rank(&sigma_norms, feature.sigma_norm);
        let bb_width_pctile = percentile_rank(&bb_widths, feature.bb_width_pct);
        let slope_abs_pctile = percentile_rank(&abs_slopes, feature.ema50_slope.abs());

        let regime = classify_regime(sigma_norm_pct, bb_width_pctile, slope_abs_pctile, &self.config);
        let defensive = feature.volume_percentile >= self.config.defensive_th;
        let engine = RegimeDecision::engine_for(regime, defensive);

        let decision = RegimeDecision {
            symbol: feature.symbol.clone(),
            close_time_5m_ms: feature.close_time_ms,
            regime,
            engine,
            defensive,
        };

        self.regimes.upsert(decision.clone());
        self.bus.publish(Event::RegimeUpdated(decision));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdt_bus::{EventName, Mode};
    use cdt_db::InMemoryRegimeRepository;
    use cdt_schemas::{Engine, Regime};
    use std::sync::Arc;

    fn feature(close_time_ms: i64, sigma_norm: f64, bb_width_pct: f64, ema50_slope: f64, volume_percentile: f64) -> FeatureVector {
        FeatureVector {
            symbol: "BTCUSDT".into(),
            timeframe: Timeframe::M5,
            close_time_ms,
            log_return: 0.0,
            atr_pct: 1.0,
            ewma_sigma: 0.01,
            sigma_norm,
            vol_pct_5m: 2.0,
            bb_width_pct,
            bb_width_percentile: 50.0,
            ema20: 100.0,
            ema50: 100.0,
            ema200: 100.0,
            ema50_slope,
            volume_pct: 100.0,
            volume_percentile,
        }
    }

    #[test]
    fn defensive_override_forces_defensive_engine_regardless_of_regime() {
        let repo = InMemoryRegimeRepository::new();
        let bus = Bus::new(Mode::Direct, Arc::new(|| 0));
        let regime_engine = RegimeEngine::new(&repo, &bus, RegimeConfig::default());

        for i in 0..10 {
            let t = i as f64 / 9.0;
            let sigma_norm = 0.80 + (0.89 - 0.80) * t;
            let bb_width_pct = 0.70 + (0.79 - 0.70) * t;
            let ema50_slope = 0.030 + (0.039 - 0.030) * t;
            let volume_percentile = if i == 9 { 95.0 } else { 50.0 };
            regime_engine.on_features_ready(&feature((i + 1) as i64 * 300_000, sigma_norm, bb_width_pct, ema50_slope, volume_percentile));
        }

        let decision = repo.latest_for_symbol("BTCUSDT").unwrap();
        assert!(decision.defensive);
        assert_eq!(decision.engine, Engine::Defensive);
    }

    #[test]
    fn one_minute_features_are_ignored() {
        let repo = InMemoryRegimeRepository::new();
        let bus = Bus::new(Mode::Direct, Arc::new(|| 0));
        let regime_engine = RegimeEngine::new(&repo, &bus, RegimeConfig::default());

        let mut f = feature(60_000, 0.5, 0.5, 0.01, 50.0);
        f.timeframe = Timeframe::M1;
        regime_engine.on_features_ready(&f);

        assert!(repo.latest_for_symbol("BTCUSDT").is_none());
    }

    #[test]
    fn publishes_regime_updated() {
        let repo = InMemoryRegimeRepository::new();
        let bus = Bus::new(Mode::Direct, Arc::new(|| 0));
        let published: Arc<std::sync::Mutex<Vec<Regime>>> = Arc::new(std::sync::Mutex::new(Vec::new()));
        let published_clone = published.clone();
        bus.subscribe(
            EventName::RegimeUpdated,
            Arc::new(move |event| {
                if let Event::RegimeUpdated(d) = event {
                    published_clone.lock().unwrap().push(d.regime);
                }
                Ok(())
            }),
        );
        let regime_engine = RegimeEngine::new(&repo, &bus, RegimeConfig::default());
        regime_engine.on_features_ready(&feature(300_000, 0.5, 0.5, 0.01, 50.0));
        assert_eq!(published.lock().unwrap().len(), 1);
    }
}

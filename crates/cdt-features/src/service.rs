use cdt_bus::{Bus, Event};
use cdt_db::{CandleRepository, FeatureRepository};
use cdt_schemas::{AuditEvent, AuditLevel, Candle};
use serde_json::json;
use uuid::Uuid;

use crate::compute::compute_features;
use crate::config::FeatureConfig;

/// Reacts to `candle.closed` by loading history, computing the feature
/// vector, and publishing `features.ready` (spec §4.3).
pub struct FeatureService<'a> {
    pub candles: &'a dyn CandleRepository,
    pub features: &'a dyn FeatureRepository,
    pub bus: &'a Bus,
    pub config: FeatureConfig,
}

/// Up to 260 candles are loaded at or before `closeTime` (spec §4.3).
const LOOKBACK_LIMIT: usize = 260;

impl<'a> FeatureService<'a> {
    pub fn on_candle_closed(&self, candle: &Candle, now_ms: i64) {
        let history = self.candles.load_recent(
            &candle.symbol,
            candle.timeframe,
            candle.close_time_ms,
            LOOKBACK_LIMIT,
        );

        let Some(feature) = compute_features(&history, &self.config) else {
            return;
        };

        self.features.upsert(feature.clone());
        self.bus.publish(Event::FeaturesReady(feature.clone()));

        let audit = AuditEvent {
            id: Uuid::new_v4().to_string(),
            ts_ms: now_ms,
            step: "features.compute".into(),
            level: AuditLevel::Info,
            message: format!("computed features for {} at {}", feature.symbol, feature.close_time_ms),
            reason: None,
            inputs_hash: cdt_schemas::hash::hash_object(candle),
            outputs_hash: cdt_schemas::hash::hash_object(&feature),
            params_version_id: String::new(),
            metadata: json!({ "symbol": feature.symbol, "timeframe": feature.timeframe.as_str() }),
        };
        self.bus.publish(Event::AuditEvent(audit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdt_bus::{EventName, Mode};
    use cdt_db::{InMemoryCandleRepository, InMemoryFeatureRepository};
    use cdt_schemas::Timeframe;
    use std::sync::{Arc, Mutex};

    fn candle(i: i64, timeframe: Timeframe) -> Candle {
        let base = 100.0 + (i as f64 * 0.05).sin() * 2.0;
        Candle {
            symbol: "BTCUSDT".into(),
            timeframe,
            close_time_ms: (i + 1) * timeframe.interval_ms(),
            open: base,
            high: base + 1.0,
            low: base - 1.0,
            close: base + 0.1,
            volume: 10.0 + (i % 7) as f64,
        }
    }

    #[test]
    fn enough_history_emits_features_ready_and_audit() {
        let candle_repo = InMemoryCandleRepository::new();
        let feature_repo = InMemoryFeatureRepository::new();
        let bus = Bus::new(Mode::Direct, Arc::new(|| 0));
        let ready: Arc<Mutex<usize>> = Arc::new(Mutex::new(0));
        let audits: Arc<Mutex<usize>> = Arc::new(Mutex::new(0));
        let ready_clone = ready.clone();
        let audits_clone = audits.clone();
        bus.subscribe(
            EventName::FeaturesReady,
            Arc::new(move |_| {
                *ready_clone.lock().unwrap() += 1;
                Ok(())
            }),
        );
        bus.subscribe(
            EventName::AuditEvent,
            Arc::new(move |_| {
                *audits_clone.lock().unwrap() += 1;
                Ok(())
            }),
        );

        let mut last = None;
        for i in 0..260 {
            let c = candle(i, Timeframe::M5);
            candle_repo.upsert(c.clone());
            last = Some(c);
        }

        let service = FeatureService {
            candles: &candle_repo,
            features: &feature_repo,
            bus: &bus,
            config: FeatureConfig::default(),
        };
        service.on_candle_closed(&last.unwrap(), 1_000);

        assert_eq!(*ready.lock().unwrap(), 1);
        assert_eq!(*audits.lock().unwrap(), 1);
        assert!(feature_repo.get("BTCUSDT", Timeframe::M5, 260 * 300_000).is_some());
    }

    #[test]
    fn insufficient_history_silently_skips() {
        let candle_repo = InMemoryCandleRepository::new();
        let feature_repo = InMemoryFeatureRepository::new();
        let bus = Bus::new(Mode::Direct, Arc::new(|| 0));
        let ready: Arc<Mutex<usize>> = Arc::new(Mutex::new(0));
        let ready_clone = ready.clone();
        bus.subscribe(
            EventName::FeaturesReady,
            Arc::new(move |_| {
                *ready_clone.lock().unwrap() += 1;
                Ok(())
            }),
        );

        let c = candle(0, Timeframe::M5);
        candle_repo.upsert(c.clone());

        let service = FeatureService {
            candles: &candle_repo,
            features: &feature_repo,
            bus: &bus,
            config: FeatureConfig::default(),
        };
        service.on_candle_closed(&c, 0);

        assert_eq!(*ready.lock().unwrap(), 0);
    }
}

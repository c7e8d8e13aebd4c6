use std::collections::BTreeMap;
use std::sync::Mutex;

use cdt_schemas::{FeatureVector, Timeframe};

/// Unique key: `(symbol, timeframe, computedAt)` (spec §6).
pub trait FeatureRepository: Send + Sync {
    fn upsert(&self, feature: FeatureVector);

    fn get(&self, symbol: &str, timeframe: Timeframe, computed_at_ms: i64) -> Option<FeatureVector>;
}

#[derive(Default)]
pub struct InMemoryFeatureRepository {
    by_key: Mutex<BTreeMap<(String, Timeframe, i64), FeatureVector>>,
}

impl InMemoryFeatureRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeatureRepository for InMemoryFeatureRepository {
    fn upsert(&self, feature: FeatureVector) {
        let key = (feature.symbol.clone(), feature.timeframe, feature.close_time_ms);
        self.by_key.lock().unwrap().insert(key, feature);
    }

    fn get(&self, symbol: &str, timeframe: Timeframe, computed_at_ms: i64) -> Option<FeatureVector> {
        self.by_key
            .lock()
            .unwrap()
            .get(&(symbol.to_string(), timeframe, computed_at_ms))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(close_time_ms: i64) -> FeatureVector {
        FeatureVector {
            symbol: "BTCUSDT".into(),
            timeframe: Timeframe::M5,
            close_time_ms,
            log_return: 0.0,
            atr_pct: 1.0,
            ewma_sigma: 0.01,
            sigma_norm: 1.0,
            vol_pct_5m: 2.0,
            bb_width_pct: 3.0,
            bb_width_percentile: 50.0,
            ema20: 100.0,
            ema50: 99.0,
            ema200: 95.0,
            ema50_slope: 0.0,
            volume_pct: 100.0,
            volume_percentile: 50.0,
        }
    }

    #[test]
    fn upsert_then_get_round_trips() {
        let repo = InMemoryFeatureRepository::new();
        repo.upsert(feature(300_000));
        let found = repo.get("BTCUSDT", Timeframe::M5, 300_000).unwrap();
        assert_eq!(found.close_time_ms, 300_000);
    }

    #[test]
    fn upsert_overwrites_same_key() {
        let repo = InMemoryFeatureRepository::new();
        repo.upsert(feature(300_000));
        let mut updated = feature(300_000);
        updated.atr_pct = 9.0;
        repo.upsert(updated);
        assert_eq!(repo.get("BTCUSDT", Timeframe::M5, 300_000).unwrap().atr_pct, 9.0);
    }

    #[test]
    fn missing_key_is_none() {
        let repo = InMemoryFeatureRepository::new();
        assert!(repo.get("ETHUSDT", Timeframe::M5, 0).is_none());
    }
}

use std::collections::BTreeMap;
use std::sync::Mutex;

use cdt_schemas::{Candle, Timeframe};

/// Finalized-candle persistence (spec §4.2, §6). Unique key:
/// `(symbol, timeframe, closeTime)`.
pub trait CandleRepository: Send + Sync {
    /// Inserts `candle` if its key is new. Returns `true` if it was newly
    /// inserted, `false` if the key already existed (a no-op — spec §8
    /// "persisting a candle whose key already exists is a no-op").
    fn upsert(&self, candle: Candle) -> bool;

    /// Loads up to `limit` candles for `(symbol, timeframe)` with
    /// `close_time_ms <= at_or_before_ms`, oldest first.
    fn load_recent(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        at_or_before_ms: i64,
        limit: usize,
    ) -> Vec<Candle>;
}

#[derive(Default)]
pub struct InMemoryCandleRepository {
    by_key: Mutex<BTreeMap<(String, Timeframe, i64), Candle>>,
}

impl InMemoryCandleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CandleRepository for InMemoryCandleRepository {
    fn upsert(&self, candle: Candle) -> bool {
        let key = (candle.symbol.clone(), candle.timeframe, candle.close_time_ms);
        let mut map = self.by_key.lock().unwrap();
        if map.contains_key(&key) {
            return false;
        }
        map.insert(key, candle);
        true
    }

    fn load_recent(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        at_or_before_ms: i64,
        limit: usize,
    ) -> Vec<Candle> {
        let map = self.by_key.lock().unwrap();
        let mut matching: Vec<&Candle> = map
            .values()
            .filter(|c| c.symbol == symbol && c.timeframe == timeframe && c.close_time_ms <= at_or_before_ms)
            .collect();
        matching.sort_by_key(|c| c.close_time_ms);
        let start = matching.len().saturating_sub(limit);
        matching[start..].iter().map(|c| (*c).clone()).collect()
    }
}

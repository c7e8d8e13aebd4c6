use std::collections::BTreeMap;
use std::sync::Mutex;

use cdt_schemas::RegimeDecision;

/// Unique key: `(symbol, closeTime5m)` (spec §6).
pub trait RegimeRepository: Send + Sync {
    fn upsert(&self, decision: RegimeDecision);

    fn get(&self, symbol: &str, close_time_5m_ms: i64) -> Option<RegimeDecision>;

    /// The most recent decision for `symbol`, used by the strategy planner's
    /// staleness check (spec §4.6).
    fn latest_for_symbol(&self, symbol: &str) -> Option<RegimeDecision>;
}

#[derive(Default)]
pub struct InMemoryRegimeRepository {
    by_key: Mutex<BTreeMap<(String, i64), RegimeDecision>>,
}

impl InMemoryRegimeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegimeRepository for InMemoryRegimeRepository {
    fn upsert(&self, decision: RegimeDecision) {
        let key = (decision.symbol.clone(), decision.close_time_5m_ms);
        self.by_key.lock().unwrap().insert(key, decision);
    }

    fn get(&self, symbol: &str, close_time_5m_ms: i64) -> Option<RegimeDecision> {
        self.by_key
            .lock()
            .unwrap()
            .get(&(symbol.to_string(), close_time_5m_ms))
            .cloned()
    }

    fn latest_for_symbol(&self, symbol: &str) -> Option<RegimeDecision> {
        self.by_key
            .lock()
            .unwrap()
            .iter()
            .filter(|((s, _), _)| s == symbol)
            .max_by_key(|((_, t), _)| *t)
            .map(|(_, d)| d.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdt_schemas::{Engine, Regime};

    fn decision(close_time_5m_ms: i64) -> RegimeDecision {
        RegimeDecision {
            symbol: "BTCUSDT".into(),
            close_time_5m_ms,
            regime: Regime::Trend,
            engine: Engine::Continuation,
            defensive: false,
        }
    }

    #[test]
    fn latest_for_symbol_is_greatest_close_time() {
        let repo = InMemoryRegimeRepository::new();
        repo.upsert(decision(300_000));
        repo.upsert(decision(600_000));
        assert_eq!(repo.latest_for_symbol("BTCUSDT").unwrap().close_time_5m_ms, 600_000);
    }

    #[test]
    fn no_decision_for_unknown_symbol() {
        let repo = InMemoryRegimeRepository::new();
        assert!(repo.latest_for_symbol("ETHUSDT").is_none());
    }
}

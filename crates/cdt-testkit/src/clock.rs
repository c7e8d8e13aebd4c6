use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// A clock that only advances when told to — deterministic timestamps for
/// scenario tests (spec §9: "do not rely on wall-clock jitter").
#[derive(Clone)]
pub struct FixedClock {
    now_ms: Arc<AtomicI64>,
}

impl FixedClock {
    pub fn new(start_ms: i64) -> Self {
        FixedClock { now_ms: Arc::new(AtomicI64::new(start_ms)) }
    }

    pub fn now(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    pub fn advance(&self, delta_ms: i64) -> i64 {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst) + delta_ms
    }

    pub fn set(&self, ms: i64) {
        self.now_ms.store(ms, Ordering::SeqCst);
    }

    /// An owned `Fn() -> i64` suitable for `cdt_bus::Bus::new`.
    pub fn as_fn(&self) -> Arc<dyn Fn() -> i64 + Send + Sync> {
        let clock = self.clone();
        Arc::new(move || clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_now_forward() {
        let clock = FixedClock::new(1_000);
        assert_eq!(clock.now(), 1_000);
        assert_eq!(clock.advance(500), 1_500);
        assert_eq!(clock.now(), 1_500);
    }
}

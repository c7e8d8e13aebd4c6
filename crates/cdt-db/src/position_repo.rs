use std::collections::BTreeMap;
use std::sync::Mutex;

use cdt_schemas::{Position, PositionState};

/// Feeds the risk service's per-symbol/portfolio admission checks (spec
/// §4.7) as well as the position manager's own lookups.
pub trait PositionRepository: Send + Sync {
    fn upsert(&self, position: Position);

    fn get(&self, id: &str) -> Option<Position>;

    fn count_open_for_symbol(&self, symbol: &str) -> usize;

    fn count_open_total(&self) -> usize;

    /// `ts_ms` of the most recent position closed for `symbol`, for the
    /// per-symbol cooldown check (spec §4.7 check 3).
    fn last_closed_at_for_symbol(&self, symbol: &str) -> Option<i64>;
}

fn is_open(state: PositionState) -> bool {
    !matches!(state, PositionState::Neutral | PositionState::Cooldown)
}

#[derive(Default)]
pub struct InMemoryPositionRepository {
    by_id: Mutex<BTreeMap<String, Position>>,
}

impl InMemoryPositionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PositionRepository for InMemoryPositionRepository {
    fn upsert(&self, position: Position) {
        self.by_id.lock().unwrap().insert(position.id.clone(), position);
    }

    fn get(&self, id: &str) -> Option<Position> {
        self.by_id.lock().unwrap().get(id).cloned()
    }

    fn count_open_for_symbol(&self, symbol: &str) -> usize {
        self.by_id
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.symbol == symbol && is_open(p.state))
            .count()
    }

    fn count_open_total(&self) -> usize {
        self.by_id.lock().unwrap().values().filter(|p| is_open(p.state)).count()
    }

    fn last_closed_at_for_symbol(&self, symbol: &str) -> Option<i64> {
        self.by_id
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.symbol == symbol && p.state == PositionState::Cooldown)
            .map(|p| p.updated_at_ms)
            .max()
    }
}

use serde::{Deserialize, Serialize};

use crate::plan::Side;

/// Position lifecycle states and their driving events (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    Neutral,
    Armed,
    Entering,
    InPosition,
    Cooldown,
    Defensive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionEvent {
    SignalArmed,
    OrderSubmitted,
    OrderFilled,
    PositionClosed,
    CooldownExpired,
    DefensiveOn,
    DefensiveOff,
}

impl PositionState {
    /// The total transition table from spec §4.9. Illegal pairs are identity
    /// (no-op), matching the "state machine violations are silently no-op"
    /// error-handling policy in spec §7(e).
    pub fn next(self, event: PositionEvent) -> PositionState {
        use PositionEvent::*;
        use PositionState::*;
        match (self, event) {
            (Neutral, SignalArmed) => Armed,
            (Armed, OrderSubmitted) => Entering,
            (Entering, OrderFilled) => InPosition,
            (InPosition, PositionClosed) => Cooldown,
            (Cooldown, CooldownExpired) => Neutral,
            (_, DefensiveOn) => Defensive,
            (Defensive, DefensiveOff) => Neutral,
            (other, _) => other,
        }
    }
}

/// `id, symbol, side, entryPrice, initialStopPrice, stopPrice, qty,
/// remainingQty, state, realizedR, took1R, took2R, trailingAnchor, atrPct,
/// paramsVersionId, openedAt, updatedAt` (spec §3 "Position").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    pub initial_stop_price: f64,
    pub stop_price: f64,
    pub qty: f64,
    pub remaining_qty: f64,
    pub state: PositionState,
    pub realized_r: f64,
    pub took_1r: bool,
    pub took_2r: bool,
    pub trailing_anchor: f64,
    pub atr_pct: f64,
    pub params_version_id: String,
    pub opened_at_ms: i64,
    pub updated_at_ms: i64,
}

impl Position {
    pub fn risk_per_unit(&self) -> f64 {
        (self.entry_price - self.initial_stop_price).abs().max(1e-8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_transition_table_covers_spec_pairs() {
        use PositionEvent::*;
        use PositionState::*;
        assert_eq!(Neutral.next(SignalArmed), Armed);
        assert_eq!(Armed.next(OrderSubmitted), Entering);
        assert_eq!(Entering.next(OrderFilled), InPosition);
        assert_eq!(InPosition.next(PositionClosed), Cooldown);
        assert_eq!(Cooldown.next(CooldownExpired), Neutral);
        assert_eq!(Defensive.next(DefensiveOff), Neutral);
        for s in [Neutral, Armed, Entering, InPosition, Cooldown, Defensive] {
            assert_eq!(s.next(DefensiveOn), Defensive);
        }
    }

    #[test]
    fn illegal_transitions_are_identity() {
        use PositionEvent::*;
        use PositionState::*;
        assert_eq!(Neutral.next(OrderFilled), Neutral);
        assert_eq!(InPosition.next(SignalArmed), InPosition);
        assert_eq!(Cooldown.next(OrderSubmitted), Cooldown);
    }
}

use cdt_bus::{Bus, Event, PositionClosedPayload};
use cdt_db::{ParamVersionRepository, PositionRepository};
use cdt_schemas::{AuditEvent, AuditLevel, Position, PositionEvent, PositionState, Regime, Side};
use serde_json::json;
use uuid::Uuid;

use crate::config::PositionConfig;

/// `entry ∓ (atrPct/100·entry·k)` (− for Long, + for Short) — spec §4.9
/// `buildInitialStop`.
pub fn build_initial_stop(entry: f64, atr_pct: f64, side: Side, k: f64) -> f64 {
    let distance = (atr_pct / 100.0) * entry * k;
    match side {
        Side::Long => entry - distance,
        Side::Short => entry + distance,
    }
}

/// Owns the price- and regime-driven lifecycle of open positions (spec
/// §4.9). Positions themselves persist through `PositionRepository`; this
/// type holds no state of its own beyond configuration.
pub struct PositionManager<'a> {
    pub positions: &'a dyn PositionRepository,
    pub params: &'a dyn ParamVersionRepository,
    pub bus: &'a Bus,
    pub config: PositionConfig,
}

impl<'a> PositionManager<'a> {
    /// Spec §4.9 `onPrice`: partial exits at +1R/+2R, ATR trailing once
    /// +2R has been taken, and stop-out detection. No-op if the position
    /// isn't `InPosition` or doesn't exist.
    pub fn on_price(&self, position_id: &str, price: f64, high: Option<f64>, low: Option<f64>, now_ms: i64) {
        let Some(mut position) = self.positions.get(position_id) else { return };
        if position.state != PositionState::InPosition {
            return;
        }

        self.warn_on_param_drift(&position, now_ms);

        let risk_per_unit = position.risk_per_unit();
        let pnl_per_unit = match position.side {
            Side::Long => price - position.entry_price,
            Side::Short => position.entry_price - price,
        };
        let r = pnl_per_unit / risk_per_unit;

        if !position.took_1r && r >= 1.0 {
            position.took_1r = true;
            self.positions.upsert(position.clone());
            self.partial_exit(position_id, 0.5, price, "+1R partial", now_ms);
            let Some(refreshed) = self.positions.get(position_id) else { return };
            position = refreshed;
            if position.state != PositionState::InPosition {
                return;
            }
        }

        if !position.took_2r && r >= 2.0 {
            position.took_2r = true;
            self.positions.upsert(position.clone());
            self.partial_exit(position_id, 0.3, price, "+2R partial", now_ms);
            let Some(refreshed) = self.positions.get(position_id) else { return };
            position = refreshed;
            if position.state != PositionState::InPosition {
                return;
            }
        }

        if position.took_2r {
            let distance = (position.atr_pct / 100.0) * position.entry_price * self.config.trailing_atr_multiple;
            match position.side {
                Side::Long => {
                    let anchor = position.trailing_anchor.max(high.unwrap_or(price));
                    let candidate = anchor - distance;
                    position.trailing_anchor = anchor;
                    position.stop_price = position.stop_price.max(candidate);
                }
                Side::Short => {
                    let anchor = position.trailing_anchor.min(low.unwrap_or(price));
                    let candidate = anchor + distance;
                    position.trailing_anchor = anchor;
                    position.stop_price = position.stop_price.min(candidate);
                }
            }
            position.updated_at_ms = now_ms;
            self.positions.upsert(position.clone());
            self.bus.publish(Event::PositionUpdated(position.clone()));
        }

        let stopped_out = match position.side {
            Side::Long => price <= position.stop_price,
            Side::Short => price >= position.stop_price,
        };
        if stopped_out {
            self.close_position(position_id, "stop hit", now_ms);
        }
    }

    /// Spec §4.9 `onRegimeChange`: hard exit on ExpansionChaos (default),
    /// hard exit or risk-reduction partial on Range depending on config.
    pub fn on_regime_change(&self, position_id: &str, regime: Regime, price: f64, now_ms: i64) {
        let Some(position) = self.positions.get(position_id) else { return };
        if position.state != PositionState::InPosition {
            return;
        }
        self.warn_on_param_drift(&position, now_ms);

        match regime {
            Regime::ExpansionChaos if self.config.hard_exit_on_expansion_chaos => {
                self.close_position(position_id, "expansion_chaos_exit", now_ms);
            }
            Regime::Range if self.config.hard_exit_on_range => {
                self.close_position(position_id, "range_exit", now_ms);
            }
            Regime::Range => {
                self.partial_exit(position_id, self.config.reduce_risk_on_range_pct / 100.0, price, "risk reduction on Range", now_ms);
            }
            _ => {}
        }
    }

    fn partial_exit(&self, position_id: &str, fraction: f64, price: f64, reason: &str, now_ms: i64) {
        let Some(mut position) = self.positions.get(position_id) else { return };
        let risk_per_unit = position.risk_per_unit();
        let qty_to_exit = position.remaining_qty.min(fraction * position.qty);
        let pnl_per_unit = match position.side {
            Side::Long => price - position.entry_price,
            Side::Short => position.entry_price - price,
        };

        position.remaining_qty -= qty_to_exit;
        position.realized_r += (pnl_per_unit / risk_per_unit) * (qty_to_exit / position.qty);
        position.updated_at_ms = now_ms;
        self.positions.upsert(position.clone());

        self.audit(&position, "position.partial_exit", AuditLevel::Info, reason, None, now_ms);
        self.bus.publish(Event::PositionUpdated(position.clone()));

        if position.remaining_qty <= 1e-10 {
            self.close_position(position_id, "all partial exits completed", now_ms);
        }
    }

    fn close_position(&self, position_id: &str, reason: &str, now_ms: i64) {
        let Some(mut position) = self.positions.get(position_id) else { return };
        position.state = position.state.next(PositionEvent::PositionClosed);
        position.updated_at_ms = now_ms;
        self.positions.upsert(position.clone());

        self.audit(&position, "position.close", AuditLevel::Info, reason, None, now_ms);
        self.bus.publish(Event::PositionClosed(PositionClosedPayload {
            position_id: position.id.clone(),
            reason: reason.to_string(),
            realized_r: position.realized_r,
        }));
        self.bus.publish(Event::PositionUpdated(position));
    }

    fn warn_on_param_drift(&self, position: &Position, now_ms: i64) {
        let active_id = self.params.active_at(now_ms).map(|v| v.id);
        if active_id.as_deref() != Some(position.params_version_id.as_str()) {
            self.audit(position, "position.paramDrift", AuditLevel::Warn, "params_drift", Some("params_drift".into()), now_ms);
        }
    }

    fn audit(&self, position: &Position, step: &str, level: AuditLevel, message: &str, reason: Option<String>, now_ms: i64) {
        let audit = AuditEvent {
            id: Uuid::new_v4().to_string(),
            ts_ms: now_ms,
            step: step.to_string(),
            level,
            message: message.to_string(),
            reason,
            inputs_hash: cdt_schemas::hash::hash_object(position),
            outputs_hash: cdt_schemas::hash::hash_object(position),
            params_version_id: position.params_version_id.clone(),
            metadata: json!({ "positionId": position.id, "symbol": position.symbol }),
        };
        self.bus.publish(Event::AuditEvent(audit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdt_bus::{EventName, Mode};
    use cdt_db::{InMemoryParamVersionRepository, InMemoryPositionRepository};
    use std::sync::{Arc, Mutex};

    fn position() -> Position {
        Position {
            id: "p1".into(),
            symbol: "BTCUSDT".into(),
            side: Side::Long,
            entry_price: 100.0,
            initial_stop_price: 99.0,
            stop_price: 99.0,
            qty: 1.0,
            remaining_qty: 1.0,
            state: PositionState::InPosition,
            realized_r: 0.0,
            took_1r: false,
            took_2r: false,
            trailing_anchor: 100.0,
            atr_pct: 1.0,
            params_version_id: "v1".into(),
            opened_at_ms: 0,
            updated_at_ms: 0,
        }
    }

    #[test]
    fn build_initial_stop_matches_spec_formula() {
        assert_eq!(build_initial_stop(100.0, 1.0, Side::Long, 1.0), 99.0);
        assert_eq!(build_initial_stop(100.0, 1.0, Side::Short, 1.0), 101.0);
    }

    #[test]
    fn trailing_scenario_matches_spec_example() {
        let positions = InMemoryPositionRepository::new();
        positions.upsert(position());
        let params = InMemoryParamVersionRepository::new(vec![]);
        let bus = Bus::new(Mode::Direct, Arc::new(|| 0));
        let manager = PositionManager { positions: &positions, params: &params, bus: &bus, config: PositionConfig::default() };

        manager.on_price("p1", 101.0, None, None, 1);
        let after_1r = positions.get("p1").unwrap();
        assert!(after_1r.took_1r);
        assert_eq!(after_1r.remaining_qty, 0.5);

        manager.on_price("p1", 102.0, None, None, 2);
        let after_2r = positions.get("p1").unwrap();
        assert!(after_2r.took_2r);
        assert_eq!(after_2r.remaining_qty, 0.2);

        manager.on_price("p1", 103.0, Some(103.5), None, 3);
        let after_trail = positions.get("p1").unwrap();
        assert_eq!(after_trail.stop_price, 102.5);
    }

    #[test]
    fn stop_out_closes_the_position() {
        let positions = InMemoryPositionRepository::new();
        let mut p = position();
        p.stop_price = 99.0;
        positions.upsert(p);
        let params = InMemoryParamVersionRepository::new(vec![]);
        let bus = Bus::new(Mode::Direct, Arc::new(|| 0));
        let manager = PositionManager { positions: &positions, params: &params, bus: &bus, config: PositionConfig::default() };

        let closed: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let closed_clone = closed.clone();
        bus.subscribe(
            EventName::PositionClosed,
            Arc::new(move |event| {
                if let Event::PositionClosed(p) = event {
                    closed_clone.lock().unwrap().push(p.reason.clone());
                }
                Ok(())
            }),
        );

        manager.on_price("p1", 98.0, None, None, 1);
        assert_eq!(*closed.lock().unwrap(), vec!["stop hit".to_string()]);
        assert_eq!(positions.get("p1").unwrap().state, PositionState::Cooldown);
    }

    #[test]
    fn expansion_chaos_hard_exits_by_default() {
        let positions = InMemoryPositionRepository::new();
        positions.upsert(position());
        let params = InMemoryParamVersionRepository::new(vec![]);
        let bus = Bus::new(Mode::Direct, Arc::new(|| 0));
        let manager = PositionManager { positions: &positions, params: &params, bus: &bus, config: PositionConfig::default() };

        manager.on_regime_change("p1", Regime::ExpansionChaos, 100.0, 1);
        assert_eq!(positions.get("p1").unwrap().state, PositionState::Cooldown);
    }

    #[test]
    fn range_without_hard_exit_applies_partial_risk_reduction() {
        let positions = InMemoryPositionRepository::new();
        positions.upsert(position());
        let params = InMemoryParamVersionRepository::new(vec![]);
        let bus = Bus::new(Mode::Direct, Arc::new(|| 0));
        let manager = PositionManager { positions: &positions, params: &params, bus: &bus, config: PositionConfig::default() };

        manager.on_regime_change("p1", Regime::Range, 100.0, 1);
        let after = positions.get("p1").unwrap();
        assert_eq!(after.remaining_qty, 0.5);
        assert_eq!(after.state, PositionState::InPosition);
    }
}

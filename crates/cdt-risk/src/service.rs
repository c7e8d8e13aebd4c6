use std::collections::HashMap;
use std::sync::Mutex;

use cdt_bus::{Bus, Event, RiskApprovedPayload, RiskRejectedPayload};
use cdt_db::{ParamVersionRepository, PositionRepository};
use cdt_schemas::{AuditEvent, AuditLevel, Engine, RegimeDecision, TradePlan};
use serde_json::json;
use uuid::Uuid;

use crate::config::RiskConfig;

/// Outcome of one admission check (spec §4.7).
#[derive(Debug, Clone, PartialEq)]
pub enum RiskOutcome {
    Approved { qty: f64, final_leverage: f64 },
    Rejected { reason: String },
}

/// Ordered gate cascade over a `TradePlan` (spec §4.7). Per-engine cooldown
/// state lives here, not in a repository: it's the only piece of risk state
/// the spec's fixed repository list (§4.11) doesn't name.
pub struct RiskService<'a> {
    pub positions: &'a dyn PositionRepository,
    pub params: &'a dyn ParamVersionRepository,
    pub bus: &'a Bus,
    pub config: RiskConfig,
    last_approved_by_engine: Mutex<HashMap<Engine, i64>>,
}

impl<'a> RiskService<'a> {
    pub fn new(positions: &'a dyn PositionRepository, params: &'a dyn ParamVersionRepository, bus: &'a Bus, config: RiskConfig) -> Self {
        RiskService { positions, params, bus, config, last_approved_by_engine: Mutex::new(HashMap::new()) }
    }

    pub fn evaluate(&self, plan: &TradePlan, regime: &RegimeDecision, now_ms: i64) -> RiskOutcome {
        let outcome = self.check(plan, regime, now_ms);
        self.audit_and_publish(plan, &outcome, now_ms);
        if let RiskOutcome::Approved { .. } = &outcome {
            self.last_approved_by_engine.lock().unwrap().insert(plan.engine, now_ms);
        }
        outcome
    }

    fn check(&self, plan: &TradePlan, regime: &RegimeDecision, now_ms: i64) -> RiskOutcome {
        let cfg = &self.config;

        if self.positions.count_open_for_symbol(&plan.symbol) >= 1 {
            return RiskOutcome::Rejected { reason: "max 1 open position per symbol exceeded".into() };
        }

        let (max_open, max_open_defensive) = self.portfolio_caps(now_ms);
        let cap = if regime.defensive { max_open_defensive } else { max_open };
        if self.positions.count_open_total() as u64 >= cap {
            return RiskOutcome::Rejected { reason: "max open positions exceeded".into() };
        }

        if let Some(last_closed) = self.positions.last_closed_at_for_symbol(&plan.symbol) {
            if now_ms - last_closed < cfg.per_symbol_cooldown_ms {
                return RiskOutcome::Rejected { reason: "symbol cooldown active".into() };
            }
        }

        if let Some(&last_approved) = self.last_approved_by_engine.lock().unwrap().get(&plan.engine) {
            if now_ms - last_approved < cfg.per_engine_cooldown_ms {
                return RiskOutcome::Rejected { reason: "engine cooldown active".into() };
            }
        }

        let final_leverage = if regime.defensive { plan.leverage.min(cfg.max_leverage_defensive) } else { plan.leverage };

        let qty_raw = cfg.equity * (plan.margin_pct / 100.0) * final_leverage / plan.entry_price.max(1e-8);
        let qty = (qty_raw / cfg.qty_step).floor() * cfg.qty_step;
        if qty < cfg.min_qty {
            return RiskOutcome::Rejected { reason: "computed qty below minQty".into() };
        }

        RiskOutcome::Approved { qty, final_leverage }
    }

    fn portfolio_caps(&self, now_ms: i64) -> (u64, u64) {
        let cfg = &self.config;
        let Some(version) = self.params.active_at(now_ms) else {
            return (cfg.default_max_open, cfg.default_max_open_defensive);
        };
        let max = version.portfolio_caps.get("max").and_then(|v| v.as_u64()).unwrap_or(cfg.default_max_open);
        let max_defensive = version
            .portfolio_caps
            .get("maxDefensive")
            .and_then(|v| v.as_u64())
            .unwrap_or(cfg.default_max_open_defensive);
        (max, max_defensive)
    }

    fn audit_and_publish(&self, plan: &TradePlan, outcome: &RiskOutcome, now_ms: i64) {
        let (level, message, reason) = match outcome {
            RiskOutcome::Approved { qty, final_leverage } => {
                (AuditLevel::Info, format!("approved qty={qty} leverage={final_leverage}"), None)
            }
            RiskOutcome::Rejected { reason } => (AuditLevel::Warn, reason.clone(), Some(reason.clone())),
        };

        let audit = AuditEvent {
            id: Uuid::new_v4().to_string(),
            ts_ms: now_ms,
            step: "risk.evaluate".into(),
            level,
            message,
            reason,
            inputs_hash: cdt_schemas::hash::hash_object(plan),
            outputs_hash: cdt_schemas::hash::hash_object(&format!("{outcome:?}")),
            params_version_id: plan.params_version_id.clone(),
            metadata: json!({ "engine": plan.engine.to_string(), "symbol": plan.symbol }),
        };
        self.bus.publish(Event::AuditEvent(audit));

        match outcome {
            RiskOutcome::Approved { qty, final_leverage } => {
                self.bus.publish(Event::RiskApproved(RiskApprovedPayload {
                    plan: plan.clone(),
                    qty: *qty,
                    final_leverage: *final_leverage,
                }));
            }
            RiskOutcome::Rejected { reason } => {
                self.bus.publish(Event::RiskRejected(RiskRejectedPayload { plan: plan.clone(), reason: reason.clone() }));
            }
        }
    }
}

use cdt_bus::{Bus, Event};
use cdt_db::{CandleRepository, ParamVersionRepository, RegimeRepository};
use cdt_indicators::clamp;
use cdt_schemas::{AuditEvent, AuditLevel, FeatureVector, Regime, Timeframe};
use serde_json::json;
use uuid::Uuid;

use crate::breakout::Breakout;
use crate::common::StrategyEngine;
use crate::continuation::Continuation;
use crate::reversal::Reversal;

/// Routes `features.ready` to exactly one strategy engine, normalizes the
/// resulting plan, and publishes `signal.generated` or a rejection audit
/// (spec §4.6).
pub struct StrategyPlanner<'a> {
    pub regimes: &'a dyn RegimeRepository,
    pub params: &'a dyn ParamVersionRepository,
    pub candles: &'a dyn CandleRepository,
    pub bus: &'a Bus,
    pub breakout: Breakout,
    pub continuation: Continuation,
    pub reversal: Reversal,
}

impl<'a> StrategyPlanner<'a> {
    pub fn on_features_ready(&self, feature: &FeatureVector, now_ms: i64) {
        if let Err(reason) = self.route(feature, now_ms) {
            self.audit_rejection(feature, &reason, now_ms);
        }
    }

    fn route(&self, feature: &FeatureVector, now_ms: i64) -> Result<(), String> {
        let decision = self
            .regimes
            .latest_for_symbol(&feature.symbol)
            .ok_or_else(|| "no_regime_for_symbol".to_string())?;

        if decision.defensive {
            return Err("defensive_mode".to_string());
        }

        if feature.timeframe == Timeframe::M5 && decision.close_time_5m_ms != feature.close_time_ms {
            return Err("stale_regime_for_feature".to_string());
        }

        let plan_result = match decision.regime {
            Regime::Compression => {
                if feature.timeframe != Timeframe::M1 {
                    return Err("compression_requires_1m_feature".to_string());
                }
                self.breakout.evaluate(feature, self.candles, now_ms)
            }
            Regime::Trend => {
                if feature.timeframe != Timeframe::M5 {
                    return Err("trend_requires_5m_feature".to_string());
                }
                self.continuation.evaluate(feature, self.candles, now_ms)
            }
            Regime::Range => {
                if feature.timeframe != Timeframe::M5 {
                    return Err("range_requires_5m_feature".to_string());
                }
                self.reversal.evaluate(feature, self.candles, now_ms)
            }
            Regime::ExpansionChaos => return Err("expansion_chaos_no_entry_engine".to_string()),
        };

        let mut plan = plan_result?;

        plan.confidence = clamp(plan.confidence, 0.0, 1.0);
        plan.expires_at_ms = plan.expires_at_ms.max(now_ms);
        plan.params_version_id = self
            .params
            .active_at(now_ms)
            .map(|v| v.id)
            .unwrap_or_default();

        let audit = AuditEvent {
            id: Uuid::new_v4().to_string(),
            ts_ms: now_ms,
            step: "strategy.plan".into(),
            level: AuditLevel::Info,
            message: format!("{} plan generated for {}", plan.engine, plan.symbol),
            reason: None,
            inputs_hash: cdt_schemas::hash::hash_object(feature),
            outputs_hash: cdt_schemas::hash::hash_object(&plan),
            params_version_id: plan.params_version_id.clone(),
            metadata: json!({ "engine": plan.engine.to_string(), "symbol": plan.symbol }),
        };
        self.bus.publish(Event::AuditEvent(audit));
        self.bus.publish(Event::SignalGenerated(plan));
        Ok(())
    }

    fn audit_rejection(&self, feature: &FeatureVector, reason: &str, now_ms: i64) {
        let audit = AuditEvent {
            id: Uuid::new_v4().to_string(),
            ts_ms: now_ms,
            step: "strategy.plan".into(),
            level: AuditLevel::Warn,
            message: reason.to_string(),
            reason: Some(reason.to_string()),
            inputs_hash: cdt_schemas::hash::hash_object(feature),
            outputs_hash: String::new(),
            params_version_id: String::new(),
            metadata: json!({ "symbol": feature.symbol }),
        };
        self.bus.publish(Event::AuditEvent(audit));
    }
}

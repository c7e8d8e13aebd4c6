use std::time::Duration;

use cdt_bus::{Bus, Event, OrderCanceledPayload, OrderFilledPayload};
use cdt_db::{FillRepository, OrderRepository, PositionRepository};
use cdt_schemas::{
    AuditEvent, AuditLevel, ExecutionOutcome, Fill, Order, OrderStatus, OrderType, Position,
    PositionState, Side, TradePlan,
};
use serde_json::json;
use uuid::Uuid;

use crate::broker::{BrokerClient, BrokerError};

/// What happens when a limit order isn't filled within `limit_timeout_ms`
/// and `confirmation()` says the signal is still valid (spec §4.8 step 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackMode {
    Market,
    ReplaceLimit,
}

/// Defaults not pinned numerically by the spec (`limit_timeout_ms` has a
/// stated default of 2s; `fallback` mode and `replacement_offset_pct` are
/// this workspace's own choice — see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionConfig {
    pub limit_timeout_ms: u64,
    pub fallback: FallbackMode,
    pub replacement_offset_pct: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig { limit_timeout_ms: 2_000, fallback: FallbackMode::Market, replacement_offset_pct: 0.1 }
    }
}

/// Idempotent limit-first order placement with a timeout/confirmation/
/// fallback ladder (spec §4.8). The single choke-point to the broker.
pub struct ExecutionEngine<'a> {
    pub broker: &'a dyn BrokerClient,
    pub orders: &'a dyn OrderRepository,
    pub fills: &'a dyn FillRepository,
    pub positions: &'a dyn PositionRepository,
    pub bus: &'a Bus,
    pub config: ExecutionConfig,
}

/// `exec-` + stable hash of the plan-defining fields. Same plan ⇒ same key
/// on every retry, which is what makes idempotency work via the orders
/// table's unique constraint on `externalId` (spec §9).
pub fn idempotency_key(plan: &TradePlan) -> String {
    let fields = json!({
        "symbol": plan.symbol,
        "side": plan.side,
        "entryPrice": plan.entry_price,
        "expiresAt": plan.expires_at_ms,
        "engine": plan.engine,
    });
    format!("exec-{}", cdt_schemas::hash::hash_value(&fields))
}

impl<'a> ExecutionEngine<'a> {
    pub async fn execute(
        &self,
        plan: &TradePlan,
        qty: f64,
        confirmation: impl Fn() -> bool + Send,
        now_ms: i64,
    ) -> ExecutionOutcome {
        let key = idempotency_key(plan);

        if self.orders.find_by_external_id(&key).is_some() {
            self.audit(plan, &key, "execution.skip", AuditLevel::Info, "idempotency key already exists", None, now_ms);
            return ExecutionOutcome::Skipped;
        }

        let ack = match self.broker.place_limit(&plan.symbol, plan.side, qty, plan.entry_price, &key).await {
            Ok(ack) => ack,
            Err(err) => return self.broker_error(plan, &key, &err, now_ms),
        };
        self.persist_order(&key, plan, qty, OrderType::Limit, plan.entry_price, ack.status, now_ms);
        self.bus.publish(Event::OrderSubmitted(self.orders.find_by_external_id(&key).expect("just inserted")));

        if ack.status == OrderStatus::Filled {
            return self.finalize_fill(plan, &key, qty, ack.avg_fill_price.unwrap_or(plan.entry_price), now_ms);
        }

        tokio::time::sleep(Duration::from_millis(self.config.limit_timeout_ms)).await;

        let status = match self.broker.get_order_status(&key).await {
            Ok(ack) => ack,
            Err(err) => return self.broker_error(plan, &key, &err, now_ms),
        };

        if status.status == OrderStatus::Filled {
            let _ = self.orders.update_status(&key, OrderStatus::Filled);
            return self.finalize_fill(plan, &key, qty, status.avg_fill_price.unwrap_or(plan.entry_price), now_ms);
        }

        if !confirmation() {
            let _ = self.broker.cancel_order(&key).await;
            return self.cancel(plan, &key, "signal no longer valid", now_ms);
        }

        match self.config.fallback {
            FallbackMode::Market => self.fallback_market(plan, &key, qty, now_ms).await,
            FallbackMode::ReplaceLimit => self.fallback_replace_limit(plan, &key, qty, now_ms).await,
        }
    }

    async fn fallback_market(&self, plan: &TradePlan, key: &str, qty: f64, now_ms: i64) -> ExecutionOutcome {
        let mkt_key = format!("{key}-mkt");
        match self.broker.place_market(&plan.symbol, plan.side, qty, &mkt_key).await {
            Ok(ack) => {
                let fill_price = ack.avg_fill_price.unwrap_or(plan.entry_price);
                self.persist_order(&mkt_key, plan, qty, OrderType::Market, fill_price, OrderStatus::Filled, now_ms);
                self.finalize_fill(plan, &mkt_key, qty, fill_price, now_ms)
            }
            Err(err) => self.broker_error(plan, &mkt_key, &err, now_ms),
        }
    }

    async fn fallback_replace_limit(&self, plan: &TradePlan, key: &str, qty: f64, now_ms: i64) -> ExecutionOutcome {
        let repl_key = format!("{key}-repl");
        let offset = self.config.replacement_offset_pct / 100.0;
        let repl_price = match plan.side {
            Side::Long => plan.entry_price * (1.0 + offset),
            Side::Short => plan.entry_price * (1.0 - offset),
        };

        match self.broker.place_limit(&plan.symbol, plan.side, qty, repl_price, &repl_key).await {
            Ok(ack) if ack.status == OrderStatus::Filled => {
                self.persist_order(&repl_key, plan, qty, OrderType::Limit, repl_price, OrderStatus::Filled, now_ms);
                self.finalize_fill(plan, &repl_key, qty, ack.avg_fill_price.unwrap_or(repl_price), now_ms)
            }
            Ok(ack) => {
                self.persist_order(&repl_key, plan, qty, OrderType::Limit, repl_price, ack.status, now_ms);
                let _ = self.broker.cancel_order(&repl_key).await;
                self.cancel(plan, &repl_key, "replacement limit not filled", now_ms)
            }
            Err(err) => self.broker_error(plan, &repl_key, &err, now_ms),
        }
    }

    fn finalize_fill(&self, plan: &TradePlan, external_id: &str, qty: f64, fill_price: f64, now_ms: i64) -> ExecutionOutcome {
        let fill = Fill { order_external_id: external_id.to_string(), price: fill_price, qty, fee: 0.0, ts_ms: now_ms };
        self.fills.insert(fill.clone());

        let stop_price = match plan.side {
            Side::Long => plan.entry_price - (plan.stop_pct / 100.0) * plan.entry_price,
            Side::Short => plan.entry_price + (plan.stop_pct / 100.0) * plan.entry_price,
        };
        let position = Position {
            id: Uuid::new_v4().to_string(),
            symbol: plan.symbol.clone(),
            side: plan.side,
            entry_price: fill_price,
            initial_stop_price: stop_price,
            stop_price,
            qty,
            remaining_qty: qty,
            state: PositionState::InPosition,
            realized_r: 0.0,
            took_1r: false,
            took_2r: false,
            trailing_anchor: fill_price,
            atr_pct: plan.stop_pct,
            params_version_id: plan.params_version_id.clone(),
            opened_at_ms: now_ms,
            updated_at_ms: now_ms,
        };
        self.positions.upsert(position.clone());

        let order = self.orders.find_by_external_id(external_id).expect("order persisted before fill");
        self.audit(
            plan,
            external_id,
            "execution.fill",
            AuditLevel::Info,
            &format!("filled at {fill_price}"),
            None,
            now_ms,
        );
        self.bus.publish(Event::OrderFilled(OrderFilledPayload { order, fill }));
        self.bus.publish(Event::PositionUpdated(position));

        ExecutionOutcome::Filled { order_external_id: external_id.to_string(), fill_price }
    }

    fn cancel(&self, plan: &TradePlan, external_id: &str, reason: &str, now_ms: i64) -> ExecutionOutcome {
        let _ = self.orders.update_status(external_id, OrderStatus::Canceled);
        self.audit(plan, external_id, "execution.execution_cancel", AuditLevel::Warn, reason, Some(reason.to_string()), now_ms);
        if let Some(order) = self.orders.find_by_external_id(external_id) {
            self.bus.publish(Event::OrderCanceled(OrderCanceledPayload { order, reason: reason.to_string() }));
        }
        ExecutionOutcome::Canceled { reason: reason.to_string() }
    }

    fn broker_error(&self, plan: &TradePlan, external_id: &str, err: &BrokerError, now_ms: i64) -> ExecutionOutcome {
        let reason = err.to_string();
        self.audit(plan, external_id, "execution.broker_error", AuditLevel::Error, &reason, Some(reason.clone()), now_ms);
        ExecutionOutcome::Canceled { reason }
    }

    fn persist_order(&self, external_id: &str, plan: &TradePlan, qty: f64, order_type: OrderType, price: f64, status: OrderStatus, now_ms: i64) {
        let order = Order {
            external_id: external_id.to_string(),
            client_order_id: external_id.to_string(),
            symbol: plan.symbol.clone(),
            side: plan.side,
            engine: plan.engine,
            order_type,
            price,
            qty,
            status,
            created_at_ms: now_ms,
        };
        let _ = self.orders.insert(order);
    }

    fn audit(&self, plan: &TradePlan, external_id: &str, step: &str, level: AuditLevel, message: &str, reason: Option<String>, now_ms: i64) {
        let audit = AuditEvent {
            id: Uuid::new_v4().to_string(),
            ts_ms: now_ms,
            step: step.to_string(),
            level,
            message: message.to_string(),
            reason,
            inputs_hash: cdt_schemas::hash::hash_object(plan),
            outputs_hash: cdt_schemas::hash::hash_value(&json!({ "externalId": external_id })),
            params_version_id: plan.params_version_id.clone(),
            metadata: json!({ "engine": plan.engine.to_string(), "symbol": plan.symbol }),
        };
        self.bus.publish(Event::AuditEvent(audit));
    }
}

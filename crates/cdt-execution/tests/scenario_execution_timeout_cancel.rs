//! Execution timeout: placeLimit -> OPEN, sleep, getOrderStatus -> OPEN,
//! confirmation() -> false => CANCELED, cancelOrder called exactly once
//! (spec §8 scenario 3).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cdt_bus::{Bus, Mode};
use cdt_db::{InMemoryFillRepository, InMemoryOrderRepository, InMemoryPositionRepository};
use cdt_execution::{BrokerAck, BrokerClient, BrokerError, ExecutionConfig, ExecutionEngine};
use cdt_schemas::{Engine, ExecutionOutcome, OrderStatus, Side, TpModel, TradePlan};

struct NeverFillsBroker {
    cancel_calls: AtomicUsize,
}

#[async_trait]
impl BrokerClient for NeverFillsBroker {
    async fn place_limit(&self, _symbol: &str, _side: Side, _qty: f64, _price: f64, client_order_id: &str) -> Result<BrokerAck, BrokerError> {
        Ok(BrokerAck { external_id: client_order_id.to_string(), status: OrderStatus::Open, avg_fill_price: None })
    }

    async fn place_market(&self, _symbol: &str, _side: Side, _qty: f64, client_order_id: &str) -> Result<BrokerAck, BrokerError> {
        Ok(BrokerAck { external_id: client_order_id.to_string(), status: OrderStatus::Filled, avg_fill_price: Some(100.0) })
    }

    async fn get_order_status(&self, external_id: &str) -> Result<BrokerAck, BrokerError> {
        Ok(BrokerAck { external_id: external_id.to_string(), status: OrderStatus::Open, avg_fill_price: None })
    }

    async fn cancel_order(&self, _external_id: &str) -> Result<(), BrokerError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn plan() -> TradePlan {
    TradePlan {
        symbol: "BTCUSDT".into(),
        side: Side::Long,
        engine: Engine::Breakout,
        entry_price: 100.0,
        stop_pct: 1.0,
        tp_model: TpModel::A,
        leverage: 3.0,
        margin_pct: 2.0,
        expires_at_ms: 600_000,
        reason: "breakout_confirmed".into(),
        params_version_id: "v1".into(),
        confidence: 0.8,
    }
}

#[tokio::test]
async fn timeout_then_invalid_confirmation_cancels_exactly_once() {
    let broker = NeverFillsBroker { cancel_calls: AtomicUsize::new(0) };
    let orders = InMemoryOrderRepository::new();
    let fills = InMemoryFillRepository::new();
    let positions = InMemoryPositionRepository::new();
    let bus = Bus::new(Mode::Direct, Arc::new(|| 0));
    let engine = ExecutionEngine {
        broker: &broker,
        orders: &orders,
        fills: &fills,
        positions: &positions,
        bus: &bus,
        config: ExecutionConfig { limit_timeout_ms: 1, ..Default::default() },
    };

    let outcome = engine.execute(&plan(), 0.01, || false, 0).await;

    match outcome {
        ExecutionOutcome::Canceled { reason } => assert_eq!(reason, "signal no longer valid"),
        other => panic!("expected Canceled, got {other:?}"),
    }
    assert_eq!(broker.cancel_calls.load(Ordering::SeqCst), 1);
}

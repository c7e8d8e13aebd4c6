use serde::{Deserialize, Serialize};

use crate::plan::{Side, TradePlan};
use crate::regime::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Limit,
    Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    Filled,
    Canceled,
    Rejected,
}

/// `plan + qty + type + timeoutMs + cancelIfInvalid` (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub plan: TradePlan,
    pub qty: f64,
    pub order_type: OrderType,
    pub timeout_ms: i64,
    pub cancel_if_invalid: bool,
}

/// An `OrderIntent` plus exchange identity and status (spec §3 "Order").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub external_id: String,
    pub client_order_id: String,
    pub symbol: String,
    pub side: Side,
    pub engine: Engine,
    pub order_type: OrderType,
    pub price: f64,
    pub qty: f64,
    pub status: OrderStatus,
    pub created_at_ms: i64,
}

/// Links to an order with price, qty, fee, timestamp (spec §3 "Fill").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_external_id: String,
    pub price: f64,
    pub qty: f64,
    pub fee: f64,
    pub ts_ms: i64,
}

/// Outcome of an `ExecutionEngine::execute` call (spec §4.8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionOutcome {
    Filled { order_external_id: String, fill_price: f64 },
    Canceled { reason: String },
    Skipped,
}

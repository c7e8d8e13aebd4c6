use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use cdt_execution::{BrokerAck, BrokerClient, BrokerError};
use cdt_schemas::{OrderStatus, Side};

/// A scripted broker: immediately fills every limit and market order at the
/// requested price, and reports every cancel as successful. Call counters
/// let scenario tests assert how many times each broker method was invoked
/// (spec §8 scenarios 3-4: idempotence and timeout/cancel paths).
pub struct ScriptedBroker {
    pub fill_on_limit: bool,
    place_limit_calls: AtomicUsize,
    place_market_calls: AtomicUsize,
    get_status_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
    status_on_poll: Mutex<OrderStatus>,
}

impl ScriptedBroker {
    pub fn new(fill_on_limit: bool) -> Self {
        ScriptedBroker {
            fill_on_limit,
            place_limit_calls: AtomicUsize::new(0),
            place_market_calls: AtomicUsize::new(0),
            get_status_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
            status_on_poll: Mutex::new(OrderStatus::Open),
        }
    }

    /// What `get_order_status` reports after the limit order doesn't fill
    /// immediately (defaults to `Open`, i.e. still unfilled at poll time).
    pub fn set_status_on_poll(&self, status: OrderStatus) {
        *self.status_on_poll.lock().unwrap() = status;
    }

    pub fn place_limit_calls(&self) -> usize {
        self.place_limit_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrokerClient for ScriptedBroker {
    async fn place_limit(&self, _symbol: &str, _side: Side, _qty: f64, price: f64, client_order_id: &str) -> Result<BrokerAck, BrokerError> {
        self.place_limit_calls.fetch_add(1, Ordering::SeqCst);
        let status = if self.fill_on_limit { OrderStatus::Filled } else { OrderStatus::Open };
        let avg_fill_price = if self.fill_on_limit { Some(price) } else { None };
        Ok(BrokerAck { external_id: client_order_id.to_string(), status, avg_fill_price })
    }

    async fn place_market(&self, _symbol: &str, _side: Side, _qty: f64, client_order_id: &str) -> Result<BrokerAck, BrokerError> {
        self.place_market_calls.fetch_add(1, Ordering::SeqCst);
        Ok(BrokerAck { external_id: client_order_id.to_string(), status: OrderStatus::Filled, avg_fill_price: None })
    }

    async fn get_order_status(&self, external_id: &str) -> Result<BrokerAck, BrokerError> {
        self.get_status_calls.fetch_add(1, Ordering::SeqCst);
        Ok(BrokerAck { external_id: external_id.to_string(), status: *self.status_on_poll.lock().unwrap(), avg_fill_price: None })
    }

    async fn cancel_order(&self, _external_id: &str) -> Result<(), BrokerError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

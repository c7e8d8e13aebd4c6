use async_trait::async_trait;
use cdt_schemas::{OrderStatus, Side};

/// Acknowledgement returned by every broker call that creates or queries an
/// order (spec §4.8: "persist order row (status=returned status)").
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerAck {
    pub external_id: String,
    pub status: OrderStatus,
    pub avg_fill_price: Option<f64>,
}

/// Errors surfaced by the broker boundary. Transient transport errors are
/// expected to be retried with backoff inside the implementation; only
/// non-retryable failures reach here (same boundary posture as
/// `cdt_md::ExchangeError`).
#[derive(Debug, Clone)]
pub enum BrokerError {
    Transport(String),
    Api { code: String, message: String },
}

impl std::fmt::Display for BrokerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrokerError::Transport(msg) => write!(f, "transport error: {msg}"),
            BrokerError::Api { code, message } => write!(f, "api error {code}: {message}"),
        }
    }
}

impl std::error::Error for BrokerError {}

/// The only exchange surface the execution engine needs (spec §4.8): place a
/// limit or market order, poll status, cancel. Signing, rate limiting, and
/// retry live entirely behind the implementation.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    async fn place_limit(
        &self,
        symbol: &str,
        side: Side,
        qty: f64,
        price: f64,
        client_order_id: &str,
    ) -> Result<BrokerAck, BrokerError>;

    async fn place_market(
        &self,
        symbol: &str,
        side: Side,
        qty: f64,
        client_order_id: &str,
    ) -> Result<BrokerAck, BrokerError>;

    async fn get_order_status(&self, external_id: &str) -> Result<BrokerAck, BrokerError>;

    async fn cancel_order(&self, external_id: &str) -> Result<(), BrokerError>;
}

use async_trait::async_trait;
use cdt_schemas::Timeframe;

/// A single kline as returned by the exchange, before it becomes a
/// [`cdt_schemas::Candle`] (spec §6 "getKlines").
#[derive(Debug, Clone, PartialEq)]
pub struct RawKline {
    pub open_time_ms: i64,
    pub close_time_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Errors surfaced by the exchange client boundary (spec §7: transient
/// transport errors are retried with backoff *inside* the client; only
/// non-retryable failures reach here).
#[derive(Debug, Clone)]
pub enum ExchangeError {
    Transport(String),
    Api { code: String, message: String },
    Decode(String),
}

impl std::fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExchangeError::Transport(msg) => write!(f, "transport error: {msg}"),
            ExchangeError::Api { code, message } => write!(f, "api error {code}: {message}"),
            ExchangeError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for ExchangeError {}

/// The only surface of the exchange client this workspace specifies (spec
/// §1: "only its public getKlines surface is used here" — signing, rate
/// limiting and retry live entirely behind the implementation).
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    async fn get_klines(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<RawKline>, ExchangeError>;
}

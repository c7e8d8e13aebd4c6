use serde::{Deserialize, Serialize};

/// Canonical timeframe strings this workspace understands (spec §4.3-§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
        }
    }

    /// Expected bar-to-bar step in milliseconds.
    pub fn interval_ms(&self) -> i64 {
        match self {
            Timeframe::M1 => 60_000,
            Timeframe::M5 => 300_000,
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single finalized-or-not OHLCV bar (spec §3 "Candle").
///
/// Uniquely keyed by `(symbol, timeframe, close_time_ms)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub close_time_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// `low <= open,close <= high` and `volume >= 0`.
    pub fn is_valid(&self) -> bool {
        self.low <= self.open
            && self.open <= self.high
            && self.low <= self.close
            && self.close <= self.high
            && self.volume >= 0.0
    }

    /// A candle is "closed" once its close time has passed `now_ms`.
    pub fn is_closed(&self, now_ms: i64) -> bool {
        self.close_time_ms <= now_ms
    }

    pub fn key(&self) -> CandleKey {
        CandleKey {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe,
            close_time_ms: self.close_time_ms,
        }
    }
}

/// Unique identity of a candle: `(symbol, timeframe, close_time_ms)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandleKey {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub close_time_ms: i64,
}

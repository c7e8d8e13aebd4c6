use serde::{Deserialize, Serialize};

use crate::regime::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TpModel {
    A,
    B,
}

/// Immutable once produced (spec §3 "TradePlan"). `expires_at_ms` must be
/// monotonically in the future at emit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePlan {
    pub symbol: String,
    pub side: Side,
    pub engine: Engine,
    pub entry_price: f64,
    pub stop_pct: f64,
    pub tp_model: TpModel,
    pub leverage: f64,
    pub margin_pct: f64,
    pub expires_at_ms: i64,
    pub reason: String,
    pub params_version_id: String,
    /// In `[0, 1]`.
    pub confidence: f64,
}

impl TradePlan {
    pub fn is_valid(&self, now_ms: i64) -> bool {
        (0.0..=1.0).contains(&self.confidence) && self.expires_at_ms > now_ms
    }
}

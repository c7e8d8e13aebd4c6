//! Domain value types and canonical hashing shared by every crate in this
//! workspace (spec §3 "DATA MODEL", §4.0 in SPEC_FULL.md).

pub mod audit;
pub mod candle;
pub mod feature;
pub mod hash;
pub mod order;
pub mod param_version;
pub mod plan;
pub mod position;
pub mod regime;

pub use audit::{AuditEvent, AuditLevel};
pub use candle::{Candle, CandleKey, Timeframe};
pub use feature::FeatureVector;
pub use order::{ExecutionOutcome, Fill, Order, OrderIntent, OrderStatus, OrderType};
pub use param_version::{active_at, ParamVersion};
pub use plan::{Side, TpModel, TradePlan};
pub use position::{Position, PositionEvent, PositionState};
pub use regime::{Engine, Regime, RegimeDecision};

//! Deterministic test fixtures shared across this workspace's crates:
//! value builders, a fixed clock, and scripted exchange/broker doubles.

pub mod broker;
pub mod builders;
pub mod clock;
pub mod exchange;

pub use broker::ScriptedBroker;
pub use builders::{candle, candle_series, feature_vector, trade_plan};
pub use clock::FixedClock;
pub use exchange::ScriptedExchangeClient;

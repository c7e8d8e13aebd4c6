//! Idempotent limit-first order placement with a timeout/confirmation/
//! fallback ladder, and the broker client boundary it drives (spec §4.8).

pub mod broker;
pub mod engine;

pub use broker::{BrokerAck, BrokerClient, BrokerError};
pub use engine::{idempotency_key, ExecutionConfig, ExecutionEngine, FallbackMode};

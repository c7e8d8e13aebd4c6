//! Position-admission gate between `signal.generated` and order execution
//! (spec §4.7): ordered cap/cooldown checks, leverage clamp, qty sizing.

pub mod config;
pub mod service;

pub use config::RiskConfig;
pub use service::{RiskOutcome, RiskService};

//! Strategy engines: Breakout, Continuation, Reversal (spec §4.5). Each is a
//! pure function of the latest feature vector plus recent candle history;
//! routing and plan normalization live in `cdt-strategy::common` callers
//! (the planner itself is composed in `cdt-cli`).

pub mod breakout;
pub mod common;
pub mod continuation;
pub mod planner;
pub mod reversal;

pub use breakout::{Breakout, BreakoutConfig};
pub use common::StrategyEngine;
pub use continuation::{Continuation, ContinuationConfig, LeverageBand};
pub use planner::StrategyPlanner;
pub use reversal::{Reversal, ReversalConfig};

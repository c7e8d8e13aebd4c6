//! Feature Service: derives the full feature vector from closed-candle
//! history and publishes `features.ready` (spec §4.3).

pub mod compute;
pub mod config;
pub mod service;

pub use compute::compute_features;
pub use config::FeatureConfig;
pub use service::FeatureService;

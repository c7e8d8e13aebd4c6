//! Pure numeric routines: log-returns, EMA, EMA-slope, ATR, EWMA
//! variance/sigma, sigma-norm, Bollinger width %, percentile rank
//! (spec §4.3, glossary). Every function here is total and allocation-light;
//! none of it touches I/O, matching spec §5's "indicators ... are pure and
//! non-blocking".

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod ewma;
pub mod returns;
pub mod stats;

pub use atr::{atr, atr_pct, Ohlc};
pub use bollinger::{ratio_to_median_pct, width_pct};
pub use ema::{ema, slope_over};
pub use ewma::{ewma_variance, sigma, sigma_norm, vol_pct_5m};
pub use returns::log_returns;
pub use stats::{median, percentile_rank};

/// Shared sizing helper used by every strategy engine (spec §4.5).
pub fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

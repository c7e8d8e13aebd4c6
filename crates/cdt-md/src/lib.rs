//! Exchange client boundary plus candle ingest with integrity validation
//! (spec §4.2, §1 — only the `getKlines` surface of the exchange is
//! specified here; signing/rate-limiting/retry are out of scope).

pub mod exchange;
pub mod ingest;

pub use exchange::{ExchangeClient, ExchangeError, RawKline};
pub use ingest::{poll_and_ingest, IngestOutcome};

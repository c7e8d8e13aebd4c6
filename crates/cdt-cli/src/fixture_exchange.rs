//! A file-backed [`ExchangeClient`]: the HTTP exchange implementation is out
//! of scope (spec §1 — only the `getKlines` surface is specified), so the
//! `run` subcommand reads a JSON array of klines from disk instead, the way
//! `cdt-testkit::ScriptedExchangeClient` serves pre-loaded responses in
//! tests but sourced from an operator-supplied fixture file rather than a
//! literal in the test body.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use cdt_md::{ExchangeClient, ExchangeError, RawKline};
use cdt_schemas::Timeframe;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct KlineFixture {
    open_time_ms: i64,
    close_time_ms: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl From<KlineFixture> for RawKline {
    fn from(k: KlineFixture) -> Self {
        RawKline {
            open_time_ms: k.open_time_ms,
            close_time_ms: k.close_time_ms,
            open: k.open,
            high: k.high,
            low: k.low,
            close: k.close,
            volume: k.volume,
        }
    }
}

pub struct FileExchangeClient {
    klines: Vec<RawKline>,
}

impl FileExchangeClient {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        let fixtures: Vec<KlineFixture> = serde_json::from_str(&raw)?;
        Ok(FileExchangeClient {
            klines: fixtures.into_iter().map(RawKline::from).collect(),
        })
    }
}

#[async_trait]
impl ExchangeClient for FileExchangeClient {
    async fn get_klines(
        &self,
        _symbol: &str,
        _timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<RawKline>, ExchangeError> {
        let take = self.klines.len().min(limit);
        Ok(self.klines[..take].to_vec())
    }
}

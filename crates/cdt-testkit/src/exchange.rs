use std::sync::Mutex;

use async_trait::async_trait;
use cdt_md::{ExchangeClient, ExchangeError, RawKline};
use cdt_schemas::Timeframe;

/// A scripted exchange client: returns a pre-loaded, deterministic response
/// on every `get_klines` call regardless of arguments. No randomness, no
/// network I/O (same posture as the teacher's `PaperBroker`).
pub struct ScriptedExchangeClient {
    response: Mutex<Result<Vec<RawKline>, ExchangeError>>,
    calls: Mutex<usize>,
}

impl ScriptedExchangeClient {
    pub fn returning(klines: Vec<RawKline>) -> Self {
        ScriptedExchangeClient { response: Mutex::new(Ok(klines)), calls: Mutex::new(0) }
    }

    pub fn failing(err: ExchangeError) -> Self {
        ScriptedExchangeClient { response: Mutex::new(Err(err)), calls: Mutex::new(0) }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ExchangeClient for ScriptedExchangeClient {
    async fn get_klines(&self, _symbol: &str, _timeframe: Timeframe, _limit: usize) -> Result<Vec<RawKline>, ExchangeError> {
        *self.calls.lock().unwrap() += 1;
        self.response.lock().unwrap().clone()
    }
}

use std::collections::BTreeSet;

use cdt_bus::{Bus, Event};
use cdt_db::CandleRepository;
use cdt_schemas::{AuditEvent, AuditLevel, Candle, Timeframe};
use serde_json::json;
use uuid::Uuid;

use crate::exchange::{ExchangeClient, ExchangeError, RawKline};

/// Result of one ingest poll (spec §4.2).
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// `inserted` is the count of newly-persisted candles (duplicates are
    /// no-ops); `finalized` is how many of those were closed and therefore
    /// published as `candle.closed`.
    Persisted { inserted: usize, finalized: usize },
    /// Integrity validation failed; nothing was persisted. Carries the
    /// reason that was also audited.
    IntegrityFailure(String),
}

/// Polls `exchange` for the last `limit` candles of `(symbol, timeframe)`,
/// validates integrity, and persists/publishes on success (spec §4.2).
pub async fn poll_and_ingest(
    exchange: &dyn ExchangeClient,
    candles: &dyn CandleRepository,
    bus: &Bus,
    symbol: &str,
    timeframe: Timeframe,
    limit: usize,
    now_ms: i64,
) -> Result<IngestOutcome, ExchangeError> {
    let klines = exchange.get_klines(symbol, timeframe, limit).await?;

    if let Some(reason) = integrity_issue(&klines, timeframe) {
        audit_integrity_failure(bus, symbol, timeframe, now_ms, &klines, &reason);
        return Ok(IngestOutcome::IntegrityFailure(reason));
    }

    let mut inserted = 0;
    let mut finalized = 0;
    for k in &klines {
        let candle = Candle {
            symbol: symbol.to_string(),
            timeframe,
            close_time_ms: k.close_time_ms,
            open: k.open,
            high: k.high,
            low: k.low,
            close: k.close,
            volume: k.volume,
        };
        if candles.upsert(candle.clone()) {
            inserted += 1;
            if candle.is_closed(now_ms) {
                finalized += 1;
                bus.publish(Event::CandleClosed(candle));
            }
        }
    }

    Ok(IngestOutcome::Persisted { inserted, finalized })
}

/// Duplicate closeTime ⇒ fail; non-monotonic closeTime ⇒ fail; gap
/// (Δt > interval) ⇒ fail (spec §4.2, in that order).
fn integrity_issue(klines: &[RawKline], timeframe: Timeframe) -> Option<String> {
    let step = timeframe.interval_ms();
    let mut seen = BTreeSet::new();
    let mut prev: Option<i64> = None;

    for k in klines {
        if !seen.insert(k.close_time_ms) {
            return Some(format!("Duplicate closeTime {} for {timeframe}", k.close_time_ms));
        }
        if let Some(p) = prev {
            if k.close_time_ms <= p {
                return Some(format!(
                    "Non-monotonic closeTime: {} follows {p}",
                    k.close_time_ms
                ));
            }
            let gap = k.close_time_ms - p;
            if gap > step {
                return Some(format!(
                    "Gap detected: {gap}ms between closeTime {p} and {} exceeds the {step}ms interval",
                    k.close_time_ms
                ));
            }
        }
        prev = Some(k.close_time_ms);
    }
    None
}

fn audit_integrity_failure(
    bus: &Bus,
    symbol: &str,
    timeframe: Timeframe,
    now_ms: i64,
    klines: &[RawKline],
    reason: &str,
) {
    let close_times: Vec<i64> = klines.iter().map(|k| k.close_time_ms).collect();
    let audit = AuditEvent {
        id: Uuid::new_v4().to_string(),
        ts_ms: now_ms,
        step: "md.ingest".into(),
        level: AuditLevel::Error,
        message: reason.to_string(),
        reason: Some(reason.to_string()),
        inputs_hash: cdt_schemas::hash::hash_value(&json!({
            "symbol": symbol,
            "timeframe": timeframe.as_str(),
            "closeTimes": close_times,
        })),
        outputs_hash: String::new(),
        params_version_id: String::new(),
        metadata: json!({
            "category": "market_data_integrity",
            "symbol": symbol,
            "timeframe": timeframe.as_str(),
        }),
    };
    bus.publish(Event::AuditEvent(audit));
}

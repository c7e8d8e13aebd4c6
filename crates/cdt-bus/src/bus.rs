use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use cdt_schemas::{AuditEvent, AuditLevel};
use serde_json::json;
use uuid::Uuid;

use crate::event::{Event, EventName};

pub type Handler = Arc<dyn Fn(&Event) -> Result<(), String> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(Uuid);

/// The bus's two delivery modes (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `publish` dispatches synchronously to all handlers in subscription order.
    Direct,
    /// `publish` enqueues; a single flusher drains the queue FIFO. Re-entrant
    /// publishes inside a handler are appended and drained by the same
    /// flusher — no recursion.
    QueuedFifo,
}

#[derive(Clone)]
struct Subscriber {
    id: Uuid,
    handler: Handler,
}

/// Typed publish/subscribe bus over the fixed [`EventName`] set (spec §4.1).
/// `now_ms` supplies timestamps for synthesized quarantine audit events —
/// pass a real clock in production, a fixed one in tests (`cdt-testkit`'s
/// `FixedClock`).
pub struct Bus {
    mode: Mode,
    subscribers: Mutex<HashMap<EventName, Vec<Subscriber>>>,
    queue: Mutex<VecDeque<Event>>,
    flushing: Mutex<bool>,
    now_ms: Arc<dyn Fn() -> i64 + Send + Sync>,
}

impl Bus {
    pub fn new(mode: Mode, now_ms: Arc<dyn Fn() -> i64 + Send + Sync>) -> Self {
        Bus {
            mode,
            subscribers: Mutex::new(HashMap::new()),
            queue: Mutex::new(VecDeque::new()),
            flushing: Mutex::new(false),
            now_ms,
        }
    }

    pub fn subscribe(&self, name: EventName, handler: Handler) -> SubscriptionId {
        let id = Uuid::new_v4();
        self.subscribers
            .lock()
            .unwrap()
            .entry(name)
            .or_default()
            .push(Subscriber { id, handler });
        SubscriptionId(id)
    }

    pub fn unsubscribe(&self, name: EventName, subscription: SubscriptionId) {
        if let Some(subs) = self.subscribers.lock().unwrap().get_mut(&name) {
            subs.retain(|s| s.id != subscription.0);
        }
    }

    /// Number of events still waiting in the queued-FIFO buffer. Always `0`
    /// in [`Mode::Direct`].
    pub fn pending_count(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn publish(&self, event: Event) {
        match self.mode {
            Mode::Direct => self.dispatch(&event),
            Mode::QueuedFifo => {
                self.queue.lock().unwrap().push_back(event);
                self.drain_queue();
            }
        }
    }

    /// Single-flusher drain: if a flush is already in progress (this call is
    /// re-entrant, from inside a handler), the event just pushed is picked up
    /// by the outer loop and this call returns immediately.
    fn drain_queue(&self) {
        {
            let mut flushing = self.flushing.lock().unwrap();
            if *flushing {
                return;
            }
            *flushing = true;
        }
        loop {
            let next = self.queue.lock().unwrap().pop_front();
            match next {
                Some(event) => self.dispatch(&event),
                None => break,
            }
        }
        *self.flushing.lock().unwrap() = false;
    }

    fn dispatch(&self, event: &Event) {
        let name = event.name();
        let handlers: Vec<Subscriber> = self
            .subscribers
            .lock()
            .unwrap()
            .get(&name)
            .cloned()
            .unwrap_or_default();

        for sub in handlers {
            if let Err(message) = (sub.handler)(event) {
                self.quarantine(name, event, &message);
            }
        }
    }

    /// A handler failure must not abort delivery to other handlers (spec
    /// §4.1, §7(e)): the error is caught here and turned into an
    /// `audit.event` instead of propagating.
    fn quarantine(&self, name: EventName, event: &Event, message: &str) {
        let audit = AuditEvent {
            id: Uuid::new_v4().to_string(),
            ts_ms: (self.now_ms)(),
            step: format!("events.handler.{name}"),
            level: AuditLevel::Error,
            message: message.to_string(),
            reason: Some(message.to_string()),
            inputs_hash: event.content_hash(),
            outputs_hash: String::new(),
            params_version_id: String::new(),
            metadata: json!({ "eventName": name.as_str() }),
        };
        self.publish(Event::AuditEvent(audit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdt_schemas::{Candle, Timeframe};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn candle_event() -> Event {
        Event::CandleClosed(Candle {
            symbol: "BTCUSDT".into(),
            timeframe: Timeframe::M1,
            close_time_ms: 60_000,
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.5,
            volume: 10.0,
        })
    }

    fn fixed_clock() -> Arc<dyn Fn() -> i64 + Send + Sync> {
        Arc::new(|| 0)
    }

    #[test]
    fn direct_mode_dispatches_synchronously_in_order() {
        let bus = Bus::new(Mode::Direct, fixed_clock());
        let order = Arc::new(Mutex::new(Vec::new()));

        let o1 = order.clone();
        bus.subscribe(
            EventName::CandleClosed,
            Arc::new(move |_| {
                o1.lock().unwrap().push(1);
                Ok(())
            }),
        );
        let o2 = order.clone();
        bus.subscribe(
            EventName::CandleClosed,
            Arc::new(move |_| {
                o2.lock().unwrap().push(2);
                Ok(())
            }),
        );

        bus.publish(candle_event());
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn handler_failure_does_not_block_other_handlers() {
        let bus = Bus::new(Mode::Direct, fixed_clock());
        let hit = Arc::new(AtomicUsize::new(0));

        bus.subscribe(
            EventName::CandleClosed,
            Arc::new(|_| Err("boom".to_string())),
        );
        let hit2 = hit.clone();
        bus.subscribe(
            EventName::CandleClosed,
            Arc::new(move |_| {
                hit2.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );

        bus.publish(candle_event());
        assert_eq!(hit.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_failure_synthesizes_audit_event() {
        let bus = Bus::new(Mode::Direct, fixed_clock());
        let audits = Arc::new(Mutex::new(Vec::new()));

        bus.subscribe(
            EventName::CandleClosed,
            Arc::new(|_| Err("bad candle".to_string())),
        );
        let a = audits.clone();
        bus.subscribe(
            EventName::AuditEvent,
            Arc::new(move |event| {
                if let Event::AuditEvent(audit) = event {
                    a.lock().unwrap().push(audit.clone());
                }
                Ok(())
            }),
        );

        bus.publish(candle_event());
        let recorded = audits.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].step, "events.handler.candle.closed");
        assert!(matches!(recorded[0].level, AuditLevel::Error));
    }

    #[test]
    fn queued_mode_preserves_fifo_order_for_reentrant_publish() {
        let bus = Arc::new(Bus::new(Mode::QueuedFifo, fixed_clock()));
        let order = Arc::new(Mutex::new(Vec::new()));
        let republished = Arc::new(AtomicUsize::new(0));

        let bus_inner = bus.clone();
        let order1 = order.clone();
        bus.subscribe(
            EventName::CandleClosed,
            Arc::new(move |_| {
                order1.lock().unwrap().push("handled");
                // Re-entrant publish: exactly one extra event, to prove it is
                // appended to the same drain rather than recursed into.
                if republished.fetch_add(1, Ordering::SeqCst) == 0 {
                    bus_inner.publish(candle_event());
                }
                Ok(())
            }),
        );

        bus.publish(candle_event());
        assert_eq!(bus.pending_count(), 0);
        assert_eq!(order.lock().unwrap().as_slice(), &["handled", "handled"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = Bus::new(Mode::Direct, fixed_clock());
        let hit = Arc::new(AtomicUsize::new(0));
        let hit2 = hit.clone();
        let sub = bus.subscribe(
            EventName::CandleClosed,
            Arc::new(move |_| {
                hit2.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );
        bus.unsubscribe(EventName::CandleClosed, sub);
        bus.publish(candle_event());
        assert_eq!(hit.load(Ordering::SeqCst), 0);
    }
}

use cdt_schemas::{AuditEvent, Candle, FeatureVector, Fill, Order, Position, RegimeDecision, TradePlan};

/// The fixed set of internal event names (spec §6 "Event names").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    CandleClosed,
    FeaturesReady,
    RegimeUpdated,
    SignalGenerated,
    RiskApproved,
    RiskRejected,
    OrderSubmitted,
    OrderFilled,
    OrderCanceled,
    PositionUpdated,
    PositionClosed,
    AuditEvent,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::CandleClosed => "candle.closed",
            EventName::FeaturesReady => "features.ready",
            EventName::RegimeUpdated => "regime.updated",
            EventName::SignalGenerated => "signal.generated",
            EventName::RiskApproved => "risk.approved",
            EventName::RiskRejected => "risk.rejected",
            EventName::OrderSubmitted => "order.submitted",
            EventName::OrderFilled => "order.filled",
            EventName::OrderCanceled => "order.canceled",
            EventName::PositionUpdated => "position.updated",
            EventName::PositionClosed => "position.closed",
            EventName::AuditEvent => "audit.event",
        }
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct RiskApprovedPayload {
    pub plan: TradePlan,
    pub qty: f64,
    pub final_leverage: f64,
}

#[derive(Debug, Clone)]
pub struct RiskRejectedPayload {
    pub plan: TradePlan,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct OrderFilledPayload {
    pub order: Order,
    pub fill: Fill,
}

#[derive(Debug, Clone)]
pub struct OrderCanceledPayload {
    pub order: Order,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct PositionClosedPayload {
    pub position_id: String,
    pub reason: String,
    pub realized_r: f64,
}

/// Payload shapes follow spec §3; this is the typed union dispatched by
/// [`crate::bus::Bus`].
#[derive(Debug, Clone)]
pub enum Event {
    CandleClosed(Candle),
    FeaturesReady(FeatureVector),
    RegimeUpdated(RegimeDecision),
    SignalGenerated(TradePlan),
    RiskApproved(RiskApprovedPayload),
    RiskRejected(RiskRejectedPayload),
    OrderSubmitted(Order),
    OrderFilled(OrderFilledPayload),
    OrderCanceled(OrderCanceledPayload),
    PositionUpdated(Position),
    PositionClosed(PositionClosedPayload),
    AuditEvent(AuditEvent),
}

impl Event {
    pub fn name(&self) -> EventName {
        match self {
            Event::CandleClosed(_) => EventName::CandleClosed,
            Event::FeaturesReady(_) => EventName::FeaturesReady,
            Event::RegimeUpdated(_) => EventName::RegimeUpdated,
            Event::SignalGenerated(_) => EventName::SignalGenerated,
            Event::RiskApproved(_) => EventName::RiskApproved,
            Event::RiskRejected(_) => EventName::RiskRejected,
            Event::OrderSubmitted(_) => EventName::OrderSubmitted,
            Event::OrderFilled(_) => EventName::OrderFilled,
            Event::OrderCanceled(_) => EventName::OrderCanceled,
            Event::PositionUpdated(_) => EventName::PositionUpdated,
            Event::PositionClosed(_) => EventName::PositionClosed,
            Event::AuditEvent(_) => EventName::AuditEvent,
        }
    }

    /// Canonical hash of whatever payload this event carries, used both for
    /// idempotency-adjacent bookkeeping and for the quarantine audit event's
    /// `inputs_hash` (spec §4.1).
    pub fn content_hash(&self) -> String {
        match self {
            Event::CandleClosed(v) => cdt_schemas::hash::hash_object(v),
            Event::FeaturesReady(v) => cdt_schemas::hash::hash_object(v),
            Event::RegimeUpdated(v) => cdt_schemas::hash::hash_object(v),
            Event::SignalGenerated(v) => cdt_schemas::hash::hash_object(v),
            Event::RiskApproved(v) => cdt_schemas::hash::hash_object(&v.plan),
            Event::RiskRejected(v) => cdt_schemas::hash::hash_object(&v.plan),
            Event::OrderSubmitted(v) => cdt_schemas::hash::hash_object(v),
            Event::OrderFilled(v) => cdt_schemas::hash::hash_object(&v.order),
            Event::OrderCanceled(v) => cdt_schemas::hash::hash_object(&v.order),
            Event::PositionUpdated(v) => cdt_schemas::hash::hash_object(v),
            Event::PositionClosed(v) => cdt_schemas::hash::hash_object(&v.position_id),
            Event::AuditEvent(v) => cdt_schemas::hash::hash_object(v),
        }
    }
}

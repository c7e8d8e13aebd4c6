//! Typed publish/subscribe event bus with optional FIFO queued-emit mode and
//! handler-error quarantine (spec §4.1, §5, §9 "Typed pub/sub over
//! inheritance").

pub mod bus;
pub mod event;

pub use bus::{Bus, Handler, Mode, SubscriptionId};
pub use event::{
    Event, EventName, OrderCanceledPayload, OrderFilledPayload, PositionClosedPayload,
    RiskApprovedPayload, RiskRejectedPayload,
};

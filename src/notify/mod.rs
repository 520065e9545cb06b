//! Change notification for UI bindings.
//!
//! The client broadcasts [`ClientEvent`]s on an [`EventBus`]; a presentation
//! layer subscribes with a filter and re-renders on receipt. Buffers are
//! bounded and slow subscribers are dropped rather than blocking delivery.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::{
    ClientEvent, DropReason, EventFilter, EventHandle, EventSubscriptionId, EventsConfig,
};

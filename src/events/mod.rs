//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the lane registry, the drain loops,
//! the handler wrappers and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Lanes` (admission), `LaneRegistry`, drain loops,
//!   `Guarded`, `Server`, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the listener spawned by `LanesBuilder::build`, which fans
//!   events out to the `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};

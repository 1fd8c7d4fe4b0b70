//! # Event subscribers for the lane runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   drain loop ── publish(Event) ──► Bus ──► bus listener ──► SubscriberSet::emit(&Event)
//!                                                              │
//!                                                    ┌─────────┼─────────┐
//!                                                    ▼         ▼         ▼
//!                                                LogWriter  Metrics   Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use keylane::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct OverloadCounter;
//!
//! #[async_trait]
//! impl Subscribe for OverloadCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::LaneOverflow {
//!             // increment counter
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "overload-counter" }
//! }
//! ```

mod embedded;
mod subscriber;
mod subscriber_set;

pub use embedded::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
pub(crate) use subscriber_set::panic_message;

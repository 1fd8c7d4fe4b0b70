//! # Subscriber extension point.
//!
//! Implement [`Subscribe`] to receive every [`Event`] published by the lanes,
//! the handler wrappers and the server. Each subscriber is driven by its own
//! worker with a bounded queue (see [`SubscriberSet`](crate::SubscriberSet)),
//! so a slow or panicking subscriber never stalls a lane.
//!
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use async_trait::async_trait;
//! use keylane::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct RejectionCounter(AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for RejectionCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::LaneOverflow {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "rejections" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receiver of runtime events.
///
/// Events for one subscriber arrive in publication order. When its queue is
/// full the event is dropped for this subscriber and `SubscriberOverflow` is
/// published; a panic in [`on_event`](Self::on_event) is caught and reported
/// as `SubscriberPanicked`.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    async fn on_event(&self, event: &Event);

    /// Name used in overflow/panic events. Defaults to the type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue capacity for this subscriber's worker (at least 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}

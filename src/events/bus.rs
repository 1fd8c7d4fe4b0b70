//! # Event bus.
//!
//! [`Bus`] wraps a `tokio::sync::broadcast` sender. Publishers (admission,
//! drain loops, `Guarded`, subscriber workers) call [`Bus::publish`], which
//! never blocks; the listener spawned by `LanesBuilder::build` is the usual
//! receiver and forwards events to the subscribers.
//!
//! ```text
//! Lanes::submit ─┐
//! drain loops   ─┼─► Bus (ring of `capacity` events) ─► listener ─► SubscriberSet
//! Guarded       ─┘
//! ```
//!
//! Events published while nobody is subscribed are dropped. A receiver that
//! falls more than `capacity` events behind skips the oldest ones
//! (`RecvError::Lagged`).

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable handle for publishing and subscribing to runtime events.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus holding up to `capacity` undelivered events (at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, ev: Event) {
        // no receivers is not an error
        let _ = self.tx.send(ev);
    }

    /// Receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receiver_sees_events_published_after_subscribe() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::LaneCreated).with_key("lost"));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::LaneCreated).with_key("u1"));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::LaneCreated);
        assert_eq!(ev.key.as_deref(), Some("u1"));
    }
}

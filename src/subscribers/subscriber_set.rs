//! # Fan-out of events to subscriber workers.
//!
//! [`SubscriberSet`] owns one bounded queue and one worker task per
//! [`Subscribe`] implementation. The bus listener hands it every event;
//! handing off never waits, so lanes are never slowed by observers.
//!
//! ```text
//! emit(ev) ─┬─► queue "LogWriter" ─► worker ─► on_event(ev)
//!           └─► queue "metrics"   ─► worker ─► on_event(ev)   (panic → SubscriberPanicked)
//!
//! queue full / worker gone ─► event dropped for that subscriber ─► SubscriberOverflow
//! ```
//!
//! Each subscriber sees its events in order; there is no ordering between
//! subscribers. Workers stop when the set is dropped and their queue is empty.

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

struct Worker {
    name: &'static str,
    queue: mpsc::Sender<Arc<Event>>,
}

/// Subscribers of one [`Lanes`](crate::Lanes) runtime.
pub struct SubscriberSet {
    workers: Vec<Worker>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns a worker per subscriber. Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let workers = subs
            .into_iter()
            .map(|sub| Worker {
                name: sub.name(),
                queue: spawn_worker(sub, bus.clone()),
            })
            .collect();
        Self { workers, bus }
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Queues `event` for every subscriber.
    pub fn emit(&self, event: &Event) {
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Queues a shared event for every subscriber.
    ///
    /// A dropped `SubscriberOverflow` is not reported again.
    pub fn emit_arc(&self, event: Arc<Event>) {
        for worker in &self.workers {
            let reason = match worker.queue.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(TrySendError::Full(_)) => "full",
                Err(TrySendError::Closed(_)) => "closed",
            };
            if !event.is_subscriber_overflow() {
                self.bus.publish(Event::subscriber_overflow(worker.name, reason));
            }
        }
    }
}

fn spawn_worker(sub: Arc<dyn Subscribe>, bus: Bus) -> mpsc::Sender<Arc<Event>> {
    let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
    tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            let delivered = std::panic::AssertUnwindSafe(sub.on_event(&ev))
                .catch_unwind()
                .await;
            if let Err(payload) = delivered {
                bus.publish(Event::subscriber_panicked(sub.name(), panic_message(payload.as_ref())));
            }
        }
    });
    tx
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use tokio::sync::mpsc::UnboundedSender;

    struct Forward(UnboundedSender<EventKind>);

    #[async_trait]
    impl Subscribe for Forward {
        async fn on_event(&self, ev: &Event) {
            let _ = self.0.send(ev.kind);
        }
        fn name(&self) -> &'static str {
            "forward"
        }
    }

    struct Explode;

    #[async_trait]
    impl Subscribe for Explode {
        async fn on_event(&self, _ev: &Event) {
            panic!("subscriber blew up");
        }
        fn name(&self) -> &'static str {
            "explode"
        }
    }

    #[tokio::test]
    async fn delivers_events_in_order() {
        let bus = Bus::new(16);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let set = SubscriberSet::new(vec![Arc::new(Forward(tx))], bus);

        set.emit(&Event::new(EventKind::TaskQueued));
        set.emit(&Event::new(EventKind::TaskStarting));

        assert_eq!(rx.recv().await, Some(EventKind::TaskQueued));
        assert_eq!(rx.recv().await, Some(EventKind::TaskStarting));
    }

    #[tokio::test]
    async fn panic_is_reported_on_bus() {
        let bus = Bus::new(16);
        let mut bus_rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Explode)], bus.clone());

        set.emit(&Event::new(EventKind::TaskQueued));

        let ev = bus_rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert_eq!(ev.key.as_deref(), Some("explode"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber blew up"));
    }
}

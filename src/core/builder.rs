use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use super::{config::Config, lanes::Lanes};
use crate::{
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing [`Lanes`] with optional subscribers.
pub struct LanesBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl LanesBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (lane overflow, task failures, etc.)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds a single subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the runtime.
    ///
    /// Initializes the event bus, the subscriber workers and the bus listener
    /// that feeds them. Must be called from within a tokio runtime.
    pub fn build(self) -> Arc<Lanes> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let runtime_token = CancellationToken::new();

        if !self.subscribers.is_empty() {
            let subs = SubscriberSet::new(self.subscribers, bus.clone());
            spawn_listener(&bus, subs, runtime_token.clone());
        }

        Arc::new(Lanes::new_internal(self.cfg, bus, runtime_token))
    }
}

/// Forwards bus events to the subscriber set until the runtime is cancelled.
///
/// The listener owns the set; its workers stop once the listener exits.
///
/// Events already buffered when cancellation is observed are still delivered.
fn spawn_listener(bus: &Bus, subs: SubscriberSet, token: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => subs.emit(&ev),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => return,
                }
            }
        }
        while let Ok(ev) = rx.try_recv() {
            subs.emit(&ev);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, EventKind};
    use crate::error::LaneError;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    struct Forward(mpsc::UnboundedSender<EventKind>);

    #[async_trait]
    impl Subscribe for Forward {
        async fn on_event(&self, ev: &Event) {
            let _ = self.0.send(ev.kind);
        }
    }

    #[tokio::test]
    async fn listener_keeps_subscribers_alive() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let lanes = LanesBuilder::new(Config::default())
            .with_subscriber(Arc::new(Forward(tx)))
            .build();

        lanes
            .submit("u1", || async { Ok::<_, LaneError>(()) })
            .await
            .unwrap();

        assert_eq!(rx.recv().await, Some(EventKind::LaneCreated));
        assert_eq!(rx.recv().await, Some(EventKind::TaskQueued));
    }
}

//! # Server-status guard.
//!
//! [`Guarded`] consults a [`StatusProvider`] before every call and skips the
//! wrapped handler entirely while the server is closing, returning `Ok(None)`.
//! It has no queueing semantics and composes with [`Queued`](crate::Queued)
//! in either order.

use async_trait::async_trait;

use super::handler::{Args, Handler};
use crate::events::{Bus, Event, EventKind};
use crate::server::{ServerStatus, StatusProvider};

/// Handler wrapper that no-ops while the server is closing.
pub struct Guarded<H, S> {
    status: S,
    inner: H,
    bus: Option<Bus>,
}

impl<H: Handler, S: StatusProvider> Guarded<H, S> {
    /// Wraps `inner`, consulting `status` on every call.
    pub fn new(status: S, inner: H) -> Self {
        Self {
            status,
            inner,
            bus: None,
        }
    }

    /// Publishes `CallSkipped` on `bus` whenever a call is skipped.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }
}

#[async_trait]
impl<H, S> Handler for Guarded<H, S>
where
    H: Handler,
    S: StatusProvider,
{
    type Output = Option<H::Output>;
    type Error = H::Error;

    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn call(&self, args: Args) -> Result<Option<H::Output>, H::Error> {
        if self.status.current_status() == ServerStatus::Closing {
            if let Some(bus) = &self.bus {
                bus.publish(Event::new(EventKind::CallSkipped).with_key(self.inner.name()));
            }
            return Ok(None);
        }
        self.inner.call(args).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HandlerFn, StatusFlag};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn closing_skips_inner_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let inner = HandlerFn::new("count", move |_args: Args| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok::<_, ()>(n) }
        });

        let status = StatusFlag::running();
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let guarded = Guarded::new(status.clone(), inner).with_bus(bus);

        assert_eq!(guarded.call(vec![]).await, Ok(Some(1)));

        status.set(ServerStatus::Closing);
        assert_eq!(guarded.call(vec![]).await, Ok(None));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::CallSkipped);
        assert_eq!(ev.key.as_deref(), Some("count"));
    }

    #[tokio::test]
    async fn starting_does_not_block_calls() {
        let inner = HandlerFn::new("ok", |_args: Args| async { Ok::<_, ()>(()) });
        let guarded = Guarded::new(StatusFlag::default(), inner);
        assert_eq!(guarded.call(vec![]).await, Ok(Some(())));
    }
}

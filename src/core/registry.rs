//! # Lane registry with admission control.
//!
//! Maps keys to [`Lane`]s. Lanes are created lazily on first use and are never
//! removed; an overflow reset swaps the entry for a fresh lane in place.
//!
//! ## Architecture
//! ```text
//! admit(key, job)
//!   └─► lock lanes
//!         ├─► resolve(key)            (create + LaneCreated if absent)
//!         ├─► depth >= max_queue_size?
//!         │     ├─ yes ─► LaneOverflow, replace lane (LaneReset), Err(TooBusy)
//!         │     └─ no  ─► lane.push(job), TaskQueued, Ok(depth)
//!   └─► unlock
//! ```
//!
//! ## Rules
//! - Resolve, depth check and append happen under **one** lock with no await in
//!   between, so two submissions for the same key can never both pass the check.
//! - The rejected submission never occupies a slot.
//! - After a reset the key's depth is `0`; the old lane's jobs are abandoned by
//!   its drain loop.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use super::lane::Lane;
use crate::error::LaneError;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::Job;

/// Process-wide key → lane mapping.
pub(crate) struct LaneRegistry {
    lanes: Mutex<HashMap<Arc<str>, Lane>>,
    max_queue_size: usize,
    bus: Bus,
    idle: Arc<Notify>,
    runtime_token: CancellationToken,
    accepting: CancellationToken,
}

impl LaneRegistry {
    /// Creates an empty registry.
    pub(crate) fn new(max_queue_size: usize, bus: Bus, runtime_token: CancellationToken) -> Self {
        Self {
            lanes: Mutex::new(HashMap::new()),
            max_queue_size: max_queue_size.max(1),
            bus,
            idle: Arc::new(Notify::new()),
            accepting: runtime_token.child_token(),
            runtime_token,
        }
    }

    /// Resolves the lane for `key`, checks its depth and appends `job`.
    ///
    /// Returns the lane depth including the new job.
    pub(crate) fn admit(&self, key: &Arc<str>, job: Job) -> Result<usize, LaneError> {
        if self.accepting.is_cancelled() {
            return Err(LaneError::Closed);
        }

        let mut lanes = self.lanes.lock();
        let lane = self.resolve(&mut lanes, key);

        let depth = lane.depth();
        if depth >= self.max_queue_size {
            self.bus.publish(
                Event::new(EventKind::LaneOverflow)
                    .with_key(Arc::clone(key))
                    .with_depth(depth),
            );
            *lane = self.fresh_lane(key);
            self.bus.publish(
                Event::new(EventKind::LaneReset)
                    .with_key(Arc::clone(key))
                    .with_depth(depth),
            );
            self.idle.notify_waiters();
            return Err(LaneError::TooBusy {
                key: key.to_string(),
            });
        }

        match lane.push(job) {
            Ok(depth) => {
                self.bus.publish(
                    Event::new(EventKind::TaskQueued)
                        .with_key(Arc::clone(key))
                        .with_depth(depth),
                );
                Ok(depth)
            }
            Err(_job) => Err(LaneError::Closed),
        }
    }

    /// Idempotent lookup-or-create. Must be called with the lock held.
    fn resolve<'a>(&self, lanes: &'a mut HashMap<Arc<str>, Lane>, key: &Arc<str>) -> &'a mut Lane {
        lanes.entry(Arc::clone(key)).or_insert_with(|| {
            self.bus
                .publish(Event::new(EventKind::LaneCreated).with_key(Arc::clone(key)));
            self.fresh_lane(key)
        })
    }

    fn fresh_lane(&self, key: &Arc<str>) -> Lane {
        Lane::spawn(
            Arc::clone(key),
            self.bus.clone(),
            Arc::clone(&self.idle),
            &self.runtime_token,
        )
    }

    /// Pending depth for `key` (`0` if the key has no lane).
    pub(crate) fn depth(&self, key: &str) -> usize {
        self.lanes.lock().get(key).map(Lane::depth).unwrap_or(0)
    }

    /// Returns sorted list of lane keys.
    pub(crate) fn keys(&self) -> Vec<String> {
        let lanes = self.lanes.lock();
        let mut keys: Vec<String> = lanes.keys().map(|k| k.to_string()).collect();
        keys.sort_unstable();
        keys
    }

    /// Returns sorted list of keys whose lanes still hold work.
    pub(crate) fn busy(&self) -> Vec<String> {
        let lanes = self.lanes.lock();
        let mut keys: Vec<String> = lanes
            .iter()
            .filter(|(_, lane)| lane.depth() > 0)
            .map(|(k, _)| k.to_string())
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Number of lanes.
    pub(crate) fn len(&self) -> usize {
        self.lanes.lock().len()
    }

    /// Stops admission; lanes keep draining what they already hold.
    pub(crate) fn stop_accepting(&self) {
        self.accepting.cancel();
    }

    /// Waits until no lane holds work.
    pub(crate) async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.busy().is_empty() {
                return;
            }
            notified.await;
        }
    }

    /// Cancels every drain loop; everything still pending is abandoned.
    pub(crate) fn cancel_all(&self) {
        self.accepting.cancel();
        self.runtime_token.cancel();
        self.idle.notify_waiters();
    }
}

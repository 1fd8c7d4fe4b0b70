//! # Lanes: per-key serialized execution with admission control.
//!
//! [`Lanes`] is the public entry point of the runtime. It owns the event bus
//! and the lane registry; the [`SubscriberSet`](crate::SubscriberSet) lives in
//! the bus listener spawned by the builder.
//!
//! ## High-level architecture
//! ```text
//! submit(key, op)
//!   └─► LaneRegistry::admit(key, Job{op, oneshot tx})
//!         ├─ Ok(depth)    ──► Submission::pending(rx)   (settled by the drain loop)
//!         └─ Err(TooBusy) ──► Submission::rejected      (ready immediately)
//!
//! drain loop (one per key):
//!   job 1 ──► settle ──► job 2 ──► settle ──► ...
//!
//! Event flow:
//!   registry / drain loops ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit
//!
//! Shutdown path:
//!   shutdown(grace)
//!     └─► ShutdownRequested, stop admission
//!     └─► wait until every lane is idle, at most `grace`:
//!            ├─ Ok      → AllDrainedWithin
//!            └─ Timeout → GraceExceeded, RuntimeError::GraceExceeded { stuck }
//!     └─► cancel all drain loops
//! ```
//!
//! ## Example
//! ```rust
//! use keylane::{Config, LaneError, Lanes};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let lanes = Lanes::builder(Config::default()).build();
//!
//!     let first = lanes.submit("u1", || async { Ok::<_, LaneError>(1) });
//!     let second = lanes.submit("u1", || async { Ok::<_, LaneError>(2) });
//!
//!     assert_eq!(first.await, Ok(1));
//!     assert_eq!(second.await, Ok(2));
//! }
//! ```

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::{builder::LanesBuilder, config::Config, registry::LaneRegistry};
use crate::error::{LaneError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::tasks::{Job, Submission};

/// Coordinates per-key lanes, event delivery and graceful shutdown.
pub struct Lanes {
    cfg: Config,
    bus: Bus,
    registry: LaneRegistry,
    runtime_token: CancellationToken,
}

impl Lanes {
    /// Returns a builder for configuring subscribers.
    pub fn builder(cfg: Config) -> LanesBuilder {
        LanesBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        runtime_token: CancellationToken,
    ) -> Self {
        let registry = LaneRegistry::new(
            cfg.max_queue_size_clamped(),
            bus.clone(),
            runtime_token.clone(),
        );
        Self {
            cfg,
            bus,
            registry,
            runtime_token,
        }
    }

    /// Queues `op` on the lane for `key`.
    ///
    /// The depth check and the append happen synchronously, before this
    /// method returns. The returned [`Submission`] resolves to:
    /// - the operation's own result, once every earlier task for `key` has settled;
    /// - `LaneError::TooBusy` right away if the lane already held
    ///   `max_queue_size` tasks (the lane is reset and its tasks abandoned).
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit<F, Fut, T, E>(&self, key: impl Into<Arc<str>>, op: F) -> Submission<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: From<LaneError> + Display + Send + 'static,
    {
        let key: Arc<str> = key.into();
        let (tx, rx) = oneshot::channel();
        let job = Job::new(Arc::clone(&key), op, tx);

        match self.registry.admit(&key, job) {
            Ok(_depth) => Submission::pending(key, rx),
            Err(err) => Submission::rejected(key, err),
        }
    }

    /// Number of tasks queued or running for `key` (`0` for unknown keys).
    pub fn depth(&self, key: &str) -> usize {
        self.registry.depth(key)
    }

    /// Returns sorted list of keys that have a lane.
    pub fn keys(&self) -> Vec<String> {
        self.registry.keys()
    }

    /// Number of lanes created so far.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Returns `true` if no lane was ever created.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Returns the event bus (subscribe for raw events or publish your own).
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Stops admission, waits up to `grace` for lanes to drain, then cancels the rest.
    ///
    /// Tasks still pending when the grace period ends settle with
    /// `LaneError::Abandoned`; their keys are reported in
    /// [`RuntimeError::GraceExceeded`].
    pub async fn shutdown(&self, grace: Duration) -> Result<(), RuntimeError> {
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.registry.stop_accepting();

        let res = match tokio::time::timeout(grace, self.registry.wait_idle()).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllDrainedWithin));
                Ok(())
            }
            Err(_elapsed) => {
                let stuck = self.registry.busy();
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded).with_reason(stuck.join(",")),
                );
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        };
        self.registry.cancel_all();
        res
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has completed or the lanes were dropped.
    pub fn is_closed(&self) -> bool {
        self.runtime_token.is_cancelled()
    }
}

impl Drop for Lanes {
    fn drop(&mut self) {
        self.runtime_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use tokio::time::{Instant, sleep};

    #[derive(Debug, PartialEq, Eq, thiserror::Error)]
    enum TestError {
        #[error("business failure: {0}")]
        Business(&'static str),
        #[error(transparent)]
        Lane(#[from] LaneError),
    }

    fn lanes(max_queue_size: usize) -> Arc<Lanes> {
        Lanes::builder(Config {
            max_queue_size,
            ..Config::default()
        })
        .build()
    }

    #[tokio::test(start_paused = true)]
    async fn same_key_runs_in_submission_order_without_overlap() {
        let lanes = lanes(20);
        let log = Arc::new(Mutex::new(Vec::new()));
        let running = Arc::new(AtomicUsize::new(0));

        let mut subs = Vec::new();
        for i in 0..10u64 {
            let log = Arc::clone(&log);
            let running = Arc::clone(&running);
            subs.push(lanes.submit("u1", move || async move {
                assert_eq!(running.fetch_add(1, Ordering::SeqCst), 0, "overlap detected");
                // later tasks are shorter: only serialization keeps them ordered
                sleep(Duration::from_millis(100 - i * 10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                log.lock().push(i);
                Ok::<_, LaneError>(i)
            }));
        }

        for (i, sub) in subs.into_iter().enumerate() {
            assert_eq!(sub.await, Ok(i as u64));
        }
        assert_eq!(*log.lock(), (0..10).collect::<Vec<_>>());
        assert_eq!(lanes.depth("u1"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_keys_run_concurrently() {
        let lanes = lanes(20);
        let started = Instant::now();

        let a = lanes.submit("a", || async {
            sleep(Duration::from_secs(1)).await;
            Ok::<_, LaneError>("a")
        });
        let b = lanes.submit("b", || async {
            sleep(Duration::from_secs(1)).await;
            Ok::<_, LaneError>("b")
        });

        let (a, b) = tokio::join!(a, b);
        assert_eq!((a, b), (Ok("a"), Ok("b")));
        assert!(started.elapsed() < Duration::from_millis(1500));
        assert_eq!(lanes.keys(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn same_key_order_holds_on_multi_thread_runtime() {
        let lanes = lanes(20);
        let log = Arc::new(Mutex::new(Vec::new()));
        let running = Arc::new(AtomicUsize::new(0));

        let mut subs = Vec::new();
        for i in 0..20u64 {
            let log = Arc::clone(&log);
            let running = Arc::clone(&running);
            subs.push(lanes.submit("u1", move || async move {
                assert_eq!(running.fetch_add(1, Ordering::SeqCst), 0, "overlap detected");
                tokio::task::yield_now().await;
                sleep(Duration::from_micros(200 * (20 - i))).await;
                running.fetch_sub(1, Ordering::SeqCst);
                log.lock().push(i);
                Ok::<_, LaneError>(i)
            }));
        }

        for (i, sub) in subs.into_iter().enumerate() {
            assert_eq!(sub.await, Ok(i as u64));
        }
        assert_eq!(*log.lock(), (0..20).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn sequential_caller_is_never_rejected() {
        let lanes = lanes(1);
        for i in 0..5_000u32 {
            let res = lanes.submit("u1", move || async move { Ok::<_, LaneError>(i) }).await;
            assert_eq!(res, Ok(i), "submission {i} rejected");
        }
        assert_eq!(lanes.depth("u1"), 0);
    }

    #[tokio::test]
    async fn backlog_never_exceeds_limit() {
        let lanes = lanes(20);
        let mut subs = Vec::new();
        for n in 1..=20 {
            subs.push(lanes.submit("u1", || std::future::pending::<Result<(), LaneError>>()));
            assert_eq!(lanes.depth("u1"), n);
        }
        assert!(subs.iter().all(|s| !s.is_rejected()));
    }

    #[tokio::test]
    async fn overflow_rejects_and_resets_lane() {
        let lanes = lanes(20);
        let mut bus = lanes.bus().subscribe();

        let mut pending = Vec::new();
        for _ in 0..20 {
            pending.push(lanes.submit("K", || std::future::pending::<Result<(), TestError>>()));
        }
        assert_eq!(lanes.depth("K"), 20);

        let rejected = lanes.submit("K", || async { Ok::<_, TestError>(()) });
        assert!(rejected.is_rejected());
        assert_eq!(lanes.depth("K"), 0);
        assert_eq!(
            rejected.await,
            Err(TestError::Lane(LaneError::TooBusy { key: "K".into() }))
        );

        // discarded tasks are settled, never left hanging
        for sub in pending {
            assert_eq!(
                sub.await,
                Err(TestError::Lane(LaneError::Abandoned { key: "K".into() }))
            );
        }

        let mut kinds = Vec::new();
        while let Ok(ev) = bus.try_recv() {
            kinds.push(ev.kind);
        }
        let overflow = kinds.iter().position(|k| *k == EventKind::LaneOverflow).unwrap();
        assert_eq!(kinds[overflow + 1], EventKind::LaneReset);
        assert_eq!(
            kinds.iter().filter(|k| **k == EventKind::TaskAbandoned).count(),
            20
        );
    }

    #[tokio::test]
    async fn lane_is_usable_after_reset() {
        let lanes = lanes(2);
        let _a = lanes.submit("K", || std::future::pending::<Result<(), LaneError>>());
        let _b = lanes.submit("K", || std::future::pending::<Result<(), LaneError>>());
        assert!(lanes.submit("K", || async { Ok::<_, LaneError>(()) }).is_rejected());

        let fresh = lanes.submit("K", || async { Ok::<_, LaneError>("fresh") });
        assert!(!fresh.is_rejected());
        assert_eq!(fresh.await, Ok("fresh"));
        assert_eq!(lanes.len(), 1);
    }

    #[tokio::test]
    async fn failure_passes_through_and_lane_continues() {
        let lanes = lanes(20);
        let failed = lanes.submit("u1", || async { Err::<u8, _>(TestError::Business("boom")) });
        let next = lanes.submit("u1", || async { Ok::<_, TestError>(2u8) });

        assert_eq!(failed.await, Err(TestError::Business("boom")));
        assert_eq!(next.await, Ok(2));
    }

    #[tokio::test]
    async fn panic_settles_caller_and_lane_continues() {
        async fn explode() -> Result<u8, LaneError> {
            panic!("handler bug")
        }

        let lanes = lanes(20);
        let bad = lanes.submit("u1", explode);
        let good = lanes.submit("u1", || async { Ok::<_, LaneError>(1u8) });

        assert_eq!(
            bad.await,
            Err(LaneError::Panicked {
                key: "u1".into(),
                info: "handler bug".into()
            })
        );
        assert_eq!(good.await, Ok(1));
    }

    #[tokio::test]
    async fn anyhow_errors_flow_through() {
        let lanes = lanes(1);
        let _stuck = lanes.submit("u1", || std::future::pending::<anyhow::Result<()>>());
        let err = lanes
            .submit("u1", || async { Ok::<_, anyhow::Error>(()) })
            .await
            .unwrap_err();

        let lane_err = err.downcast_ref::<LaneError>().unwrap();
        assert!(lane_err.is_overload());
    }

    #[tokio::test(start_paused = true)]
    async fn end_to_end_burst_of_twenty_five() {
        let lanes = lanes(20);
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut subs = Vec::new();
        for i in 1..=25usize {
            let order = Arc::clone(&order);
            subs.push(lanes.submit("u1", move || async move {
                sleep(Duration::from_millis(50)).await;
                order.lock().push(i);
                Ok::<_, LaneError>(i)
            }));
        }

        let mut results = Vec::new();
        for sub in subs {
            results.push(sub.await);
        }

        // 1..=20 were discarded by the reset, 21 was rejected, 22..=25 form a new lane
        for r in &results[..20] {
            assert_eq!(*r, Err(LaneError::Abandoned { key: "u1".into() }));
        }
        assert_eq!(results[20], Err(LaneError::TooBusy { key: "u1".into() }));
        assert_eq!(&results[21..], &[Ok(22), Ok(23), Ok(24), Ok(25)]);
        assert_eq!(*order.lock(), vec![22, 23, 24, 25]);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_waits_for_drain() {
        let lanes = lanes(20);
        let done = lanes.submit("u1", || async {
            sleep(Duration::from_millis(200)).await;
            Ok::<_, LaneError>(())
        });

        lanes.shutdown(Duration::from_secs(1)).await.unwrap();
        assert_eq!(done.await, Ok(()));
        assert!(lanes.is_closed());
        assert_eq!(
            lanes.submit("u1", || async { Ok::<_, LaneError>(()) }).await,
            Err(LaneError::Closed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_reports_stuck_lanes() {
        let lanes = lanes(20);
        let stuck = lanes.submit("slow", || std::future::pending::<Result<(), LaneError>>());
        let _quick = lanes.submit("quick", || async { Ok::<_, LaneError>(()) });

        let err = lanes.shutdown(Duration::from_millis(100)).await.unwrap_err();
        match err {
            RuntimeError::GraceExceeded { stuck, .. } => assert_eq!(stuck, vec!["slow".to_string()]),
        }
        assert_eq!(stuck.await, Err(LaneError::Abandoned { key: "slow".into() }));
    }
}

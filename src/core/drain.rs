//! # Lane drain loop.
//!
//! One drain loop is spawned per [`Lane`](super::lane::Lane). It pulls jobs off
//! the lane's channel and runs them strictly one after another.
//!
//! ## Architecture
//! ```text
//! Lane::push(job) ──► [unbounded mpsc] ──► drain()
//!
//! loop {
//!   ├─► recv next job (cancellable)
//!   ├─► publish TaskStarting
//!   ├─► job.run() (cancellable)
//!   ├─► depth -= 1
//!   ├─► settle caller
//!   │       ├─ Completed ─► publish TaskCompleted
//!   │       ├─ Failed    ─► publish TaskFailed (lane keeps going)
//!   │       └─ Panicked  ─► publish TaskFailed (lane keeps going)
//!   └─► notify idle waiters
//! }
//!
//! on cancel:
//!   ├─► drop the running job (caller sees Abandoned) ─► TaskAbandoned
//!   └─► drop every queued job                        ─► TaskAbandoned each
//! ```
//!
//! ## Rules
//! - At most **one** job of a lane runs at any instant.
//! - The next job starts only after the previous one fully resolved.
//! - A job leaves the depth count before its caller is settled, so a caller
//!   that resubmits on wake-up is never rejected on account of its own task.
//! - Failures never stop the loop; only cancellation or a closed channel does.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};
use crate::tasks::{Job, Outcome};

/// Everything a drain loop needs, moved into its spawned task.
pub(crate) struct DrainCtx {
    pub key: Arc<str>,
    pub rx: mpsc::UnboundedReceiver<Job>,
    pub depth: Arc<AtomicUsize>,
    pub idle: Arc<Notify>,
    pub token: CancellationToken,
    pub bus: Bus,
}

/// Runs jobs until the lane is cancelled or its sender side is dropped.
pub(crate) async fn drain(ctx: DrainCtx) {
    let DrainCtx {
        key,
        mut rx,
        depth,
        idle,
        token,
        bus,
    } = ctx;

    loop {
        let job = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            next = rx.recv() => match next {
                Some(job) => job,
                None => return,
            },
        };

        bus.publish(
            Event::new(EventKind::TaskStarting)
                .with_key(Arc::clone(&key))
                .with_depth(depth.load(Ordering::Acquire)),
        );

        let finished = tokio::select! {
            biased;
            _ = token.cancelled() => {
                publish_abandoned(&bus, &key);
                break;
            }
            finished = job.run() => finished,
        };

        // release the slot before the caller can observe the result
        let remaining = depth.fetch_sub(1, Ordering::AcqRel).saturating_sub(1);
        let outcome = finished.settle();
        publish_outcome(&bus, &key, remaining, outcome);
        idle.notify_waiters();
    }

    rx.close();
    while let Ok(job) = rx.try_recv() {
        drop(job);
        publish_abandoned(&bus, &key);
    }
    idle.notify_waiters();
}

fn publish_outcome(bus: &Bus, key: &Arc<str>, remaining: usize, outcome: Outcome) {
    let ev = match outcome {
        Outcome::Completed => Event::new(EventKind::TaskCompleted),
        Outcome::Failed(reason) => Event::new(EventKind::TaskFailed).with_reason(reason),
        Outcome::Panicked(info) => {
            Event::new(EventKind::TaskFailed).with_reason(format!("panicked: {info}"))
        }
    };
    bus.publish(ev.with_key(Arc::clone(key)).with_depth(remaining));
}

fn publish_abandoned(bus: &Bus, key: &Arc<str>) {
    bus.publish(Event::new(EventKind::TaskAbandoned).with_key(Arc::clone(key)));
}

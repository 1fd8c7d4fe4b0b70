//! # LogWriter — events as `tracing` records
//!
//! A minimal subscriber that forwards incoming [`Event`]s to `tracing`.
//! Install any `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! ## Levels
//! - `debug`: lane created, task queued/starting/completed
//! - `info`: shutdown progress, calls skipped by the status guard
//! - `warn`: task failed, task abandoned, lane overflow/reset, subscriber overflow
//! - `error`: grace exceeded, subscriber panicked

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let key = e.key.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::LaneCreated => debug!(seq = e.seq, key, "lane created"),
            EventKind::TaskQueued => debug!(seq = e.seq, key, depth = ?e.depth, "task queued"),
            EventKind::TaskStarting => {
                debug!(seq = e.seq, key, depth = ?e.depth, "task starting")
            }
            EventKind::TaskCompleted => {
                debug!(seq = e.seq, key, depth = ?e.depth, "task completed")
            }
            EventKind::TaskFailed => {
                warn!(seq = e.seq, key, depth = ?e.depth, err = reason, "task failed")
            }
            EventKind::TaskAbandoned => warn!(seq = e.seq, key, "task abandoned"),
            EventKind::LaneOverflow => {
                warn!(seq = e.seq, key, depth = ?e.depth, "lane overflow, rejecting submission")
            }
            EventKind::LaneReset => {
                warn!(seq = e.seq, key, discarded = ?e.depth, "lane reset")
            }
            EventKind::CallSkipped => info!(seq = e.seq, handler = key, "call skipped, server closing"),
            EventKind::ShutdownRequested => info!(seq = e.seq, "shutdown requested"),
            EventKind::AllDrainedWithin => info!(seq = e.seq, "all lanes drained within grace"),
            EventKind::GraceExceeded => error!(seq = e.seq, stuck = reason, "grace exceeded"),
            EventKind::SubscriberOverflow => {
                warn!(seq = e.seq, subscriber = key, reason, "subscriber overflow")
            }
            EventKind::SubscriberPanicked => {
                error!(seq = e.seq, subscriber = key, info = reason, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

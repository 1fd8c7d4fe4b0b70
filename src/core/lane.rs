//! # Lane: per-key FIFO with a dedicated drain loop.
//!
//! A [`Lane`] is the sending half of a job channel plus a shared pending
//! counter. The receiving half lives inside the lane's drain loop
//! (see [`drain`](super::drain)). Dropping a lane cancels its drain loop,
//! which abandons every job it still holds.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;

use super::drain::{DrainCtx, drain};
use crate::events::Bus;
use crate::tasks::Job;

/// Per-key serialization unit.
pub(crate) struct Lane {
    tx: mpsc::UnboundedSender<Job>,
    depth: Arc<AtomicUsize>,
    token: CancellationToken,
}

impl Lane {
    /// Creates an empty lane and spawns its drain loop.
    ///
    /// The loop is bound to a child of `parent`, so cancelling the runtime
    /// token tears every lane down.
    pub(crate) fn spawn(
        key: Arc<str>,
        bus: Bus,
        idle: Arc<Notify>,
        parent: &CancellationToken,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let depth = Arc::new(AtomicUsize::new(0));
        let token = parent.child_token();

        tokio::spawn(drain(DrainCtx {
            key,
            rx,
            depth: Arc::clone(&depth),
            idle,
            token: token.clone(),
            bus,
        }));

        Self { tx, depth, token }
    }

    /// Number of tasks queued or running.
    pub(crate) fn depth(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }

    /// Appends a job; returns the depth including it.
    ///
    /// Fails (handing the job back) only if the drain loop is gone.
    pub(crate) fn push(&self, job: Job) -> Result<usize, Job> {
        let depth = self.depth.fetch_add(1, Ordering::AcqRel) + 1;
        match self.tx.send(job) {
            Ok(()) => Ok(depth),
            Err(mpsc::error::SendError(job)) => {
                self.depth.fetch_sub(1, Ordering::AcqRel);
                Err(job)
            }
        }
    }
}

impl Drop for Lane {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

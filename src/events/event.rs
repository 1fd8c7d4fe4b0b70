//! # Runtime events emitted by lanes, wrappers and the server.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Lane events**: lane creation, overflow and reset
//! - **Task events**: queued, starting, completed, failed, abandoned
//! - **Runtime events**: status guard skips and shutdown progress
//! - **Subscriber events**: overflow and panic of subscriber workers
//!
//! The [`Event`] struct carries additional metadata such as the lane key,
//! the lane depth observed when the event was produced, and a reason.
//!
//! ## Ordering
//! Subscribers may see events from different lanes interleaved arbitrarily;
//! `seq` is a process-wide counter that restores publication order.
//!
//! ## Example
//! ```rust
//! use keylane::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_key("u1")
//!     .with_depth(3)
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.key.as_deref(), Some("u1"));
//! assert_eq!(ev.depth, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
///
/// Notes in parentheses list the optional [`Event`] fields each kind sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Lane created for a key seen for the first time. (`key`)
    LaneCreated,
    /// Submission rejected because its lane was full. (`key`, `depth` at rejection)
    LaneOverflow,
    /// Lane replaced by an empty one; always follows `LaneOverflow`.
    /// (`key`, `depth` = tasks discarded)
    LaneReset,

    /// Task appended to a lane. (`key`, `depth` including it)
    TaskQueued,
    /// Drain loop picked the task up. (`key`, `depth` including it)
    TaskStarting,
    /// Operation returned `Ok`. (`key`, `depth` after removal)
    TaskCompleted,
    /// Operation returned `Err` or panicked. (`key`, `depth`, `reason`)
    TaskFailed,
    /// Task discarded by a reset or shutdown; its caller got `Abandoned`. (`key`)
    TaskAbandoned,

    /// Status guard skipped a call while the server was closing. (`key` = handler name)
    CallSkipped,
    ShutdownRequested,
    AllDrainedWithin,
    /// Grace period ran out; remaining lanes were cancelled. (`reason` = stuck keys)
    GraceExceeded,

    /// Subscriber panicked in `on_event`. (`key` = subscriber, `reason` = panic message)
    SubscriberPanicked,
    /// Subscriber queue was full or closed; the event was dropped for it only.
    /// (`key` = subscriber, `reason`)
    SubscriberOverflow,
}

/// One runtime event. Optional fields depend on [`EventKind`].
#[derive(Clone, Debug)]
pub struct Event {
    /// Process-wide publication order.
    pub seq: u64,
    pub at: SystemTime,
    pub kind: EventKind,
    /// Lane key (or subscriber/handler name), if applicable.
    pub key: Option<Arc<str>>,
    /// Pending depth of the lane when the event was produced.
    pub depth: Option<usize>,
    /// Failure text, overflow detail or stuck keys.
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Stamps a new event with the next sequence number and the current time.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            key: None,
            depth: None,
            reason: None,
        }
    }

    /// Attaches a lane key.
    #[inline]
    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attaches the observed lane depth.
    #[inline]
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_key(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_key(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

//! # keylane
//!
//! **Keylane** serializes asynchronous work per key and sheds load when a key
//! falls too far behind.
//!
//! Every key (typically a user id) owns a *lane*: a FIFO of pending tasks
//! drained by a single worker, so tasks for one key never overlap while tasks
//! for different keys run concurrently. A lane holds at most
//! [`Config::max_queue_size`] pending tasks; a submission arriving at a full
//! lane resets the lane and is rejected with [`LaneError::TooBusy`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   request ──► Guarded (skip while Closing) ──► Queued (derive key) ──┐
//!                                                                      ▼
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  Lanes (public API)                                                  │
//! │  - LaneRegistry (key → Lane, admission, overflow reset)              │
//! │  - Bus (broadcast events)                                            │
//! │  - SubscriberSet (fans out to user subscribers)                      │
//! └──────┬──────────────────┬──────────────────┬─────────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌──────────┐       ┌──────────┐       ┌──────────┐
//!   │ lane "u1"│       │ lane "u2"│       │lane "sys"│
//!   │  drain   │       │  drain   │       │  drain   │
//!   └────┬─────┘       └────┬─────┘       └────┬─────┘
//!        │ TaskStarting     │ TaskCompleted    │ TaskAbandoned
//!        ▼                  ▼                  ▼
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                      Bus (broadcast channel)                         │
//! └─────────────────────────────────┬────────────────────────────────────┘
//!                                   ▼
//!                            bus listener ──► SubscriberSet ──► LogWriter, ...
//! ```
//!
//! ### Admission
//! ```text
//! Lanes::submit(key, op)
//!   ├─ lanes closed        ─► Err(Closed)
//!   ├─ depth(key) < max    ─► enqueue, depth += 1, publish TaskQueued
//!   └─ depth(key) >= max   ─► publish LaneOverflow
//!                             replace lane (pending tasks settle Abandoned)
//!                             publish LaneReset
//!                             Err(TooBusy)   (the rejected op never runs)
//! ```
//!
//! ## Features
//! | Area              | Description                                                | Key types / traits                      |
//! |-------------------|------------------------------------------------------------|-----------------------------------------|
//! | **Lanes**         | Per-key FIFO execution with bounded backlog.               | [`Lanes`], [`Submission`]               |
//! | **Handlers**      | Wrap request handlers with queueing and status guards.     | [`Handler`], [`Queued`], [`Guarded`]    |
//! | **Subscriber API**| Observe lane lifecycle events (logging, metrics, ...).     | [`Subscribe`], [`LogWriter`]            |
//! | **Server**        | Config loading, database lifecycle, graceful shutdown.     | [`Server`], [`ConfigLoader`], [`Driver`]|
//! | **Errors**        | Typed errors with stable labels.                           | [`LaneError`], [`RuntimeError`]         |
//! | **Configuration** | Centralize runtime settings.                               | [`Config`]                              |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use keylane::{Config, LaneError, Lanes, LogWriter, Subscribe};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let lanes = Lanes::builder(Config::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let first = lanes.submit("u1", || async { Ok::<_, LaneError>("first") });
//!     let second = lanes.submit("u1", || async { Ok::<_, LaneError>("second") });
//!
//!     assert_eq!(first.await?, "first");
//!     assert_eq!(second.await?, "second");
//!
//!     lanes.shutdown(Config::default().grace).await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod handlers;
mod server;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use core::{Config, DEFAULT_MAX_QUEUE_SIZE, Lanes, LanesBuilder, Signal};
pub use error::{BadCode, ConfigError, DbError, LaneError, RuntimeError, StartupError};
pub use events::{Bus, Event, EventKind};
pub use handlers::{Args, Guarded, Handler, HandlerFn, KeyExtractor, Queued, SENTINEL_KEY, UidKey, derive_key};
pub use server::{
    ConfigLoader, Connecting, Connection, ConnectionEvent, Databases, DbConfig, Driver, SYS_CONFIG_FILE, Server,
    ServerInfo, ServerStatus, StatusFlag, StatusProvider, SysConfig,
};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use tasks::Submission;

//! Runtime core: lanes, admission and lifecycle.
//!
//! The public API from this module is [`Lanes`] (with [`LanesBuilder`] and
//! [`Config`]).
//!
//! Internal modules:
//! - [`registry`]: key → lane mapping, admission control and overflow reset;
//! - [`lane`]: one lane (job channel + pending counter);
//! - [`drain`]: the per-lane single-concurrency execution loop;
//! - [`lanes`]: public submission API and graceful shutdown;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod config;
mod drain;
mod lane;
mod lanes;
mod registry;
pub(crate) mod shutdown;

pub use builder::LanesBuilder;
pub use config::{Config, DEFAULT_MAX_QUEUE_SIZE};
pub use lanes::Lanes;
pub use shutdown::Signal;

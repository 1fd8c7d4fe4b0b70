//! # Deferred work and its settlement.
//!
//! - [`Job`] - type-erased unit of work queued on a lane (operation + settlement slot)
//! - [`Submission`] - caller-visible future settled exactly once by the lane

mod job;
mod submission;

pub(crate) use job::{Job, Outcome};
pub use submission::Submission;

//! # Type-erased lane job.
//!
//! A [`Job`] owns the caller's operation together with the sending half of a
//! `oneshot` channel. Running the job awaits the operation and yields a
//! [`Finished`] holding the erased [`Outcome`]; the caller is settled only
//! when the drain loop calls [`Finished::settle`].
//!
//! Dropping a job without running it (or mid-run) drops the sender, which the
//! caller's [`Submission`](crate::Submission) observes as `LaneError::Abandoned`.

use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::oneshot;

use crate::error::LaneError;
use crate::subscribers::panic_message;

/// What happened to a job, as seen by the drain loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Operation returned `Ok`.
    Completed,
    /// Operation returned `Err`; the error was handed to the caller untouched.
    Failed(String),
    /// Operation panicked; the caller got `LaneError::Panicked`.
    Panicked(String),
}

/// Operation that has run but whose caller is not yet settled.
///
/// The drain loop releases the lane slot first and only then calls
/// [`settle`](Self::settle), so a caller woken by the result never observes
/// the finished task still counted in the lane depth.
pub(crate) struct Finished {
    outcome: Outcome,
    settle: Box<dyn FnOnce() + Send>,
}

impl Finished {
    /// Hands the result to the caller.
    pub(crate) fn settle(self) -> Outcome {
        (self.settle)();
        self.outcome
    }
}

/// Unit of deferred work bound to one settlement slot.
pub(crate) struct Job {
    run: Box<dyn FnOnce() -> BoxFuture<'static, Finished> + Send>,
}

impl Job {
    /// Wraps `op` so that its result settles `settle`.
    pub(crate) fn new<F, Fut, T, E>(
        key: Arc<str>,
        op: F,
        settle: oneshot::Sender<Result<T, E>>,
    ) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: From<LaneError> + Display + Send + 'static,
    {
        let run = move || {
            async move {
                let res = AssertUnwindSafe(async move { op().await })
                    .catch_unwind()
                    .await;
                let (outcome, result) = match res {
                    Ok(Ok(value)) => (Outcome::Completed, Ok(value)),
                    Ok(Err(err)) => (Outcome::Failed(err.to_string()), Err(err)),
                    Err(payload) => {
                        let info = panic_message(payload.as_ref());
                        let err = LaneError::Panicked {
                            key: key.to_string(),
                            info: info.clone(),
                        };
                        (Outcome::Panicked(info), Err(E::from(err)))
                    }
                };
                Finished {
                    outcome,
                    settle: Box::new(move || {
                        let _ = settle.send(result);
                    }),
                }
            }
            .boxed()
        };
        Self { run: Box::new(run) }
    }

    /// Runs the operation. The caller is settled by [`Finished::settle`].
    pub(crate) fn run(self) -> BoxFuture<'static, Finished> {
        (self.run)()
    }
}

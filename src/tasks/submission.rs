//! # Caller-visible settlement future.
//!
//! [`Submission`] is returned by [`Lanes::submit`](crate::Lanes::submit). It
//! resolves exactly once, to one of:
//! - the operation's own `Ok`/`Err` (passed through untouched),
//! - `LaneError::TooBusy` if admission rejected the call (ready immediately),
//! - `LaneError::Abandoned` if the task was discarded by a reset or shutdown,
//! - `LaneError::Panicked` if the operation panicked,
//! - `LaneError::Closed` if the lanes no longer accept work.
//!
//! Lane errors reach the caller through `E: From<LaneError>`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::LaneError;

enum State<T, E> {
    Pending(oneshot::Receiver<Result<T, E>>),
    Rejected(Option<LaneError>),
}

/// Future settled by the lane that accepted (or rejected) a submission.
#[must_use = "a submission does nothing for the caller unless awaited"]
pub struct Submission<T, E> {
    key: Arc<str>,
    state: State<T, E>,
}

impl<T, E> Submission<T, E> {
    pub(crate) fn pending(key: Arc<str>, rx: oneshot::Receiver<Result<T, E>>) -> Self {
        Self {
            key,
            state: State::Pending(rx),
        }
    }

    pub(crate) fn rejected(key: Arc<str>, err: LaneError) -> Self {
        Self {
            key,
            state: State::Rejected(Some(err)),
        }
    }

    /// Key of the lane this submission was routed to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns `true` if admission rejected the call before it was queued.
    pub fn is_rejected(&self) -> bool {
        matches!(self.state, State::Rejected(_))
    }
}

impl<T, E> Future for Submission<T, E>
where
    E: From<LaneError>,
{
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.state {
            State::Pending(rx) => match Pin::new(rx).poll(cx) {
                Poll::Ready(Ok(res)) => Poll::Ready(res),
                Poll::Ready(Err(_closed)) => Poll::Ready(Err(E::from(LaneError::Abandoned {
                    key: this.key.to_string(),
                }))),
                Poll::Pending => Poll::Pending,
            },
            State::Rejected(err) => {
                let err = err.take().unwrap_or(LaneError::Closed);
                Poll::Ready(Err(E::from(err)))
            }
        }
    }
}

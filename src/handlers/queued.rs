//! # Queue-by-key handler wrapper.
//!
//! [`Queued`] routes every call of the wrapped handler through
//! [`Lanes::submit`], keyed by a [`KeyExtractor`]. Calls sharing a key run one
//! at a time in arrival order; calls with different keys run independently.
//!
//! ```text
//! call(args)
//!   ├─► key = extractor.key(&args)
//!   └─► lanes.submit(key, || inner.call(args))
//!         ├─ admitted ─► settled when the lane reaches it
//!         └─ too busy ─► Err(E::from(LaneError::TooBusy))
//! ```
//!
//! The key is derived and the task queued synchronously on the first poll,
//! so admission for a key is never interleaved with another call. Lane order
//! is therefore first-poll order, not creation order; use
//! [`Queued::enqueue`] to fix the position at the moment of the call.

use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;

use super::handler::{Args, Handler};
use super::key::{KeyExtractor, UidKey};
use crate::Lanes;
use crate::error::LaneError;
use crate::tasks::Submission;

/// Handler wrapper serializing calls per key.
pub struct Queued<H, K = UidKey> {
    lanes: Arc<Lanes>,
    inner: Arc<H>,
    extractor: K,
}

impl<H: Handler> Queued<H, UidKey> {
    /// Wraps `inner` using the default [`UidKey`] policy.
    pub fn new(lanes: Arc<Lanes>, inner: H) -> Self {
        Self {
            lanes,
            inner: Arc::new(inner),
            extractor: UidKey,
        }
    }
}

impl<H: Handler, K: KeyExtractor> Queued<H, K> {
    /// Replaces the key extractor.
    pub fn with_extractor<K2: KeyExtractor>(self, extractor: K2) -> Queued<H, K2> {
        Queued {
            lanes: self.lanes,
            inner: self.inner,
            extractor,
        }
    }

    /// Key the given arguments would be queued under.
    pub fn key_for(&self, args: &[serde_json::Value]) -> String {
        self.extractor.key(args)
    }

    /// Queues the call immediately and returns its settlement future.
    ///
    /// Unlike [`Handler::call`], the lane position is taken here, before the
    /// returned future is first polled.
    pub fn enqueue(&self, args: Args) -> Submission<H::Output, H::Error>
    where
        H::Error: From<LaneError> + Display,
    {
        let key = self.extractor.key(&args);
        let inner = Arc::clone(&self.inner);
        self.lanes
            .submit(key, move || async move { inner.call(args).await })
    }
}

#[async_trait]
impl<H, K> Handler for Queued<H, K>
where
    H: Handler,
    H::Error: From<LaneError> + Display,
    K: KeyExtractor,
{
    type Output = H::Output;
    type Error = H::Error;

    fn name(&self) -> &str {
        self.inner.name()
    }

    /// Queues the call on its lane and waits for the result.
    ///
    /// Admission happens when the returned future is **first polled**, not when
    /// `call` is invoked. Two calls combined with `join!`/`select!` take lane
    /// positions in the order they are polled; use [`Queued::enqueue`] when the
    /// order of invocation must be kept.
    async fn call(&self, args: Args) -> Result<H::Output, H::Error> {
        self.enqueue(args).await
    }
}

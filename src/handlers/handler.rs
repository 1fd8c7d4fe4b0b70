//! # Request handler abstraction and closure-backed implementation.
//!
//! A [`Handler`] receives positional arguments ([`Args`]) and produces a result.
//! Wrappers such as [`Queued`](crate::Queued) and [`Guarded`](crate::Guarded)
//! are handlers themselves, so they compose at registration time:
//!
//! ```rust
//! use std::sync::Arc;
//! use keylane::{Args, Config, Guarded, Handler, HandlerFn, LaneError, Lanes, Queued, StatusFlag};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let lanes = Lanes::builder(Config::default()).build();
//! let status = StatusFlag::running();
//!
//! let echo = HandlerFn::arc("echo", |args: Args| async move {
//!     Ok::<_, LaneError>(args.len())
//! });
//! let handler = Guarded::new(status, Queued::new(Arc::clone(&lanes), echo));
//!
//! let out = handler.call(vec![serde_json::json!({ "uid": "u1" })]).await;
//! assert_eq!(out, Ok(Some(1)));
//! # }
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

/// Positional call arguments, forwarded unchanged to the wrapped handler.
pub type Args = Vec<serde_json::Value>;

/// # Asynchronous request handler.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Success value returned to the caller.
    type Output: Send + 'static;
    /// Failure returned to the caller.
    type Error: Send + 'static;

    /// Returns a stable, human-readable handler name.
    fn name(&self) -> &str;

    /// Handles one call.
    async fn call(&self, args: Args) -> Result<Self::Output, Self::Error>;
}

#[async_trait]
impl<H: Handler> Handler for Arc<H> {
    type Output = H::Output;
    type Error = H::Error;

    fn name(&self) -> &str {
        self.as_ref().name()
    }

    async fn call(&self, args: Args) -> Result<Self::Output, Self::Error> {
        self.as_ref().call(args).await
    }
}

/// Function-backed handler.
///
/// Wraps a closure that creates a new future per call.
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler behind an `Arc`.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut, T, E> Handler for HandlerFn<F>
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Error = E;

    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, args: Args) -> Result<T, E> {
        (self.f)(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn closure_receives_arguments_unchanged() {
        let h = HandlerFn::arc("concat", |args: Args| async move {
            Ok::<_, ()>(args.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(","))
        });

        assert_eq!(h.name(), "concat");
        assert_eq!(h.call(vec![json!("a"), json!(2)]).await, Ok(r#""a",2"#.to_string()));
    }
}

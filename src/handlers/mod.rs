//! # Handler wrapping.
//!
//! - [`Handler`] / [`HandlerFn`] - request handlers taking positional [`Args`]
//! - [`KeyExtractor`] / [`UidKey`] - lane key derivation
//! - [`Queued`] - serializes calls per key through [`Lanes`](crate::Lanes)
//! - [`Guarded`] - skips calls while the server is closing

mod guard;
mod handler;
mod key;
mod queued;

pub use guard::Guarded;
pub use handler::{Args, Handler, HandlerFn};
pub use key::{KeyExtractor, SENTINEL_KEY, UidKey, derive_key};
pub use queued::Queued;

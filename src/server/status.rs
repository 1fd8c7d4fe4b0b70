//! # Process-wide server status.
//!
//! [`StatusProvider`] is the query interface injected into
//! [`Guarded`](crate::Guarded); [`StatusFlag`] is the shared, atomic
//! implementation owned by the [`Server`](crate::Server).

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle status of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ServerStatus {
    /// Configuration and connections are being set up.
    Starting = 0,
    /// Serving requests.
    Running = 1,
    /// Shutting down; guarded handlers no longer run.
    Closing = 2,
}

impl ServerStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ServerStatus::Starting,
            1 => ServerStatus::Running,
            _ => ServerStatus::Closing,
        }
    }

    /// Returns the lowercase status name.
    pub fn as_str(self) -> &'static str {
        match self {
            ServerStatus::Starting => "starting",
            ServerStatus::Running => "running",
            ServerStatus::Closing => "closing",
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of the current server status.
pub trait StatusProvider: Send + Sync + 'static {
    fn current_status(&self) -> ServerStatus;
}

impl<P: StatusProvider> StatusProvider for Arc<P> {
    fn current_status(&self) -> ServerStatus {
        self.as_ref().current_status()
    }
}

/// Shared atomic status flag. Clones observe the same value.
#[derive(Debug, Clone)]
pub struct StatusFlag {
    inner: Arc<AtomicU8>,
}

impl StatusFlag {
    /// Creates a flag in the given state.
    pub fn new(status: ServerStatus) -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(status as u8)),
        }
    }

    /// Creates a flag already in [`ServerStatus::Running`].
    pub fn running() -> Self {
        Self::new(ServerStatus::Running)
    }

    /// Updates the status; returns the previous one.
    pub fn set(&self, status: ServerStatus) -> ServerStatus {
        ServerStatus::from_u8(self.inner.swap(status as u8, Ordering::AcqRel))
    }

    /// Returns `true` once the server is closing.
    pub fn is_closing(&self) -> bool {
        self.current_status() == ServerStatus::Closing
    }
}

impl Default for StatusFlag {
    fn default() -> Self {
        Self::new(ServerStatus::Starting)
    }
}

impl StatusProvider for StatusFlag {
    fn current_status(&self) -> ServerStatus {
        ServerStatus::from_u8(self.inner.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let flag = StatusFlag::default();
        let view = flag.clone();
        assert_eq!(view.current_status(), ServerStatus::Starting);

        assert_eq!(flag.set(ServerStatus::Closing), ServerStatus::Starting);
        assert!(view.is_closing());
        assert_eq!(view.current_status().to_string(), "closing");
    }
}

//! Error types used by the lane runtime and the server boundary.
//!
//! - [`LaneError`] — errors raised by admission control and the drain loop.
//! - [`RuntimeError`] — errors raised while shutting the runtime down.
//! - [`ConfigError`], [`DbError`], [`StartupError`] — errors at the server boundary.
//!
//! Like the rest of the crate, the enums expose `as_label` (stable snake_case
//! label for logs/metrics) and, where useful, `as_message`.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Numeric classification codes surfaced to the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum BadCode {
    /// Admission rejected the call because its lane is saturated.
    TooBusy = 1001,
}

impl BadCode {
    /// Returns the numeric wire value.
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }
}

/// # Errors produced by lanes.
///
/// Only [`LaneError::TooBusy`] is an admission decision; the other variants
/// describe work that was accepted but could not be settled with the
/// operation's own result.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaneError {
    /// Lane for `key` already holds the maximum number of pending tasks.
    ///
    /// The lane has been reset; the rejected call never occupied a slot.
    #[error("TooBusy Now:{}", BadCode::TooBusy.code())]
    TooBusy {
        /// Key whose lane overflowed.
        key: String,
    },

    /// Task was discarded before it could finish (overflow reset or shutdown).
    #[error("task abandoned: lane '{key}' was reset")]
    Abandoned {
        /// Key of the lane that dropped the task.
        key: String,
    },

    /// Operation panicked while running on the lane.
    #[error("operation panicked on lane '{key}': {info}")]
    Panicked {
        /// Key of the lane that ran the operation.
        key: String,
        /// Panic payload rendered as text.
        info: String,
    },

    /// Lanes have been shut down and no longer accept work.
    #[error("lanes are closed")]
    Closed,
}

impl LaneError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use keylane::LaneError;
    ///
    /// let err = LaneError::TooBusy { key: "u1".into() };
    /// assert_eq!(err.as_label(), "lane_too_busy");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LaneError::TooBusy { .. } => "lane_too_busy",
            LaneError::Abandoned { .. } => "lane_task_abandoned",
            LaneError::Panicked { .. } => "lane_task_panicked",
            LaneError::Closed => "lane_closed",
        }
    }

    /// Returns the classification code, if this error carries one.
    ///
    /// # Example
    /// ```
    /// use keylane::{BadCode, LaneError};
    ///
    /// assert_eq!(LaneError::TooBusy { key: "u1".into() }.code(), Some(BadCode::TooBusy));
    /// assert_eq!(LaneError::Closed.code(), None);
    /// ```
    pub fn code(&self) -> Option<BadCode> {
        match self {
            LaneError::TooBusy { .. } => Some(BadCode::TooBusy),
            _ => None,
        }
    }

    /// Returns `true` for admission rejections.
    pub fn is_overload(&self) -> bool {
        matches!(self, LaneError::TooBusy { .. })
    }
}

/// # Errors produced by the runtime itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; lanes that still had work were force-reset.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Keys of lanes that still had pending tasks.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck lanes={stuck:?}")
            }
        }
    }
}

/// # Errors produced while loading JSON configuration.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content is not valid JSON for the requested type.
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// `db_server_map` has no entry for the configured server id.
    #[error("server config not found for server id '{server_id}'")]
    MissingServer { server_id: String },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "config_read",
            ConfigError::Parse { .. } => "config_parse",
            ConfigError::MissingServer { .. } => "config_missing_server",
        }
    }
}

/// # Errors produced by the database lifecycle boundary.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DbError {
    /// Driver reported an error before the connection was established.
    #[error("connection to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    /// Event stream ended before the driver reported `Connected`.
    #[error("connection to {url} closed before it was established")]
    ClosedBeforeConnect { url: String },

    /// Explicit stop failed.
    #[error("failed to stop connection: {reason}")]
    Stop { reason: String },
}

impl DbError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DbError::Connect { .. } => "db_connect",
            DbError::ClosedBeforeConnect { .. } => "db_closed_before_connect",
            DbError::Stop { .. } => "db_stop",
        }
    }
}

/// # Fatal startup errors.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Db(#[from] DbError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_busy_carries_fixed_code() {
        let err = LaneError::TooBusy { key: "u1".into() };
        assert_eq!(err.to_string(), "TooBusy Now:1001");
        assert_eq!(err.code().map(BadCode::code), Some(1001));
        assert!(err.is_overload());
    }

    #[test]
    fn non_overload_errors_have_no_code() {
        let err = LaneError::Abandoned { key: "u1".into() };
        assert!(!err.is_overload());
        assert_eq!(err.code(), None);
        assert_eq!(err.as_label(), "lane_task_abandoned");
    }

    #[test]
    fn startup_error_is_transparent() {
        let err: StartupError = DbError::Connect {
            url: "mongodb://h:1/db".into(),
            reason: "refused".into(),
        }
        .into();
        assert_eq!(err.to_string(), "connection to mongodb://h:1/db failed: refused");
    }
}

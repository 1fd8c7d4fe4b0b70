//! # Lane runtime configuration.
//!
//! Provides [`Config`], the centralized settings for [`Lanes`](crate::Lanes).
//!
//! ## Sentinel values
//! - `max_queue_size = 0` → clamped to 1 (a lane always admits one task)
//! - `bus_capacity = 0` → clamped to 1
//! - `grace = 0s` → shutdown does not wait, remaining work is abandoned immediately
//!
//! ## JSON form
//! ```json
//! { "max_queue_size": 20, "bus_capacity": 1024, "grace_ms": 30000 }
//! ```
//! Every field is optional; missing fields take their default.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Default maximum pending depth per lane.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 20;

/// Global configuration for the lane runtime.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of pending tasks (including the running one) per lane.
    ///
    /// A submission that finds the lane at this depth triggers an overflow
    /// reset and is rejected with `LaneError::TooBusy`.
    pub max_queue_size: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Maximum time [`Lanes::shutdown`](crate::Lanes::shutdown) waits for lanes to drain.
    #[serde(rename = "grace_ms", deserialize_with = "millis")]
    pub grace: Duration,
}

impl Config {
    /// Returns the admission limit clamped to a minimum of 1.
    #[inline]
    pub fn max_queue_size_clamped(&self) -> usize {
        self.max_queue_size.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max_queue_size = 20`
    /// - `bus_capacity = 1024`
    /// - `grace = 30s`
    fn default() -> Self {
        Self {
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            bus_capacity: 1024,
            grace: Duration::from_secs(30),
        }
    }
}

fn millis<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    u64::deserialize(d).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "grace_ms": 250 }"#).unwrap();
        assert_eq!(cfg.grace, Duration::from_millis(250));
        assert_eq!(cfg.max_queue_size, DEFAULT_MAX_QUEUE_SIZE);
        assert_eq!(cfg.bus_capacity, 1024);
    }

    #[test]
    fn zero_limits_are_clamped() {
        let cfg = Config {
            max_queue_size: 0,
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.max_queue_size_clamped(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}

//! Server boundary: status, JSON configuration, database lifecycle and the
//! process runtime that ties them to [`Lanes`](crate::Lanes).
//!
//! - [`status`]: [`ServerStatus`], [`StatusProvider`] and the shared [`StatusFlag`];
//! - [`settings`]: [`ConfigLoader`] and the `sys.json` model;
//! - [`database`]: [`Driver`]/[`Connection`] seams and [`Databases`] startup;
//! - [`runtime`]: [`Server`] startup and graceful shutdown.

mod database;
mod runtime;
mod settings;
mod status;

pub use database::{Connecting, Connection, ConnectionEvent, Databases, Driver};
pub use runtime::Server;
pub use settings::{ConfigLoader, DbConfig, ServerInfo, SYS_CONFIG_FILE, SysConfig};
pub use status::{ServerStatus, StatusFlag, StatusProvider};

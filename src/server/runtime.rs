//! # Server runtime: startup and graceful shutdown.
//!
//! [`Server`] wires the pieces a request-serving process needs:
//!
//! ```text
//! Server::start(loader, driver, subscribers)
//!   ├─► load sys.json                  (ConfigError is fatal)
//!   ├─► build Lanes from sys.lanes
//!   ├─► Databases::start               (DbError is fatal)
//!   └─► status = Running
//!
//! Server::shutdown()
//!   ├─► status = Closing               (guarded handlers stop running)
//!   ├─► Lanes::shutdown(grace)         (drain, or abandon after grace)
//!   └─► Databases::stop
//! ```

use std::sync::Arc;

use tracing::{error, info};

use super::database::{Databases, Driver};
use super::settings::{ConfigLoader, SysConfig};
use super::status::{ServerStatus, StatusFlag};
use crate::core::{Lanes, Signal, shutdown};
use crate::error::{RuntimeError, StartupError};
use crate::subscribers::Subscribe;

/// Running server: configuration, lanes, connections and status.
pub struct Server<C> {
    sys: SysConfig,
    lanes: Arc<Lanes>,
    status: StatusFlag,
    databases: Databases<C>,
}

impl<C: super::database::Connection> Server<C> {
    /// Loads configuration, connects databases and marks the server running.
    pub async fn start<D>(
        loader: &ConfigLoader,
        driver: &D,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Result<Self, StartupError>
    where
        D: Driver<Conn = C>,
    {
        let sys = loader.load_sys()?;
        Self::start_with(sys, driver, subscribers).await
    }

    /// Same as [`start`](Self::start) with an already loaded configuration.
    pub async fn start_with<D>(
        sys: SysConfig,
        driver: &D,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Result<Self, StartupError>
    where
        D: Driver<Conn = C>,
    {
        let status = StatusFlag::default();
        let lanes = Lanes::builder(sys.lanes.clone())
            .with_subscribers(subscribers)
            .build();

        let databases = Databases::start(driver, &sys).await?;

        status.set(ServerStatus::Running);
        info!(server_id = %sys.server.server_id, "server running");
        Ok(Self {
            sys,
            lanes,
            status,
            databases,
        })
    }

    pub fn lanes(&self) -> &Arc<Lanes> {
        &self.lanes
    }

    /// Shared status flag; hand clones to [`Guarded`](crate::Guarded) wrappers.
    pub fn status(&self) -> &StatusFlag {
        &self.status
    }

    pub fn databases(&self) -> &Databases<C> {
        &self.databases
    }

    pub fn config(&self) -> &SysConfig {
        &self.sys
    }

    /// Closes the server: stop guarded handlers, drain lanes, stop connections.
    ///
    /// Connections are stopped even when lanes exceed their grace period.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.status.set(ServerStatus::Closing);
        info!("server closing");

        let drained = self.lanes.shutdown(self.sys.lanes.grace).await;
        if let Err(e) = &drained {
            error!(err = %e, label = e.as_label(), "lanes did not drain");
        }
        if let Err(e) = self.databases.stop().await {
            error!(err = %e, label = e.as_label(), "database stop failed");
        }
        drained
    }

    /// Waits for a termination signal, then shuts down.
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        match shutdown::wait_for_signal().await {
            Ok(sig) => info!(signal = %sig, "termination signal received"),
            Err(e) => error!(err = %e, "signal handlers unavailable, shutting down"),
        }
        self.shutdown().await
    }

    /// Shuts down when `signal` resolves instead of waiting for an OS signal.
    pub async fn run_until<F>(&self, signal: F) -> Result<(), RuntimeError>
    where
        F: std::future::Future<Output = Signal>,
    {
        let sig = signal.await;
        info!(signal = %sig, "shutdown triggered");
        self.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::database::testing::FakeDriver;
    use crate::server::StatusProvider;
    use crate::{Args, Guarded, Handler, HandlerFn, LaneError, Queued};
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn sys() -> SysConfig {
        serde_json::from_str(
            r#"{
                "db_server_map": { "s1": { "host": "h", "port": 2, "db": "server" } },
                "server": { "serverId": "s1" },
                "lanes": { "grace_ms": 500 }
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn start_marks_running_and_shutdown_closes_everything() {
        let driver = FakeDriver::default();
        let server = Server::start_with(sys(), &driver, Vec::new()).await.unwrap();
        assert_eq!(server.status().current_status(), ServerStatus::Running);

        let handler = Guarded::new(
            server.status().clone(),
            Queued::new(
                Arc::clone(server.lanes()),
                HandlerFn::new("hello", |args: Args| async move {
                    Ok::<_, LaneError>(format!("hello {}", args[0]["uid"]))
                }),
            ),
        );
        assert_eq!(
            handler.call(vec![json!({ "uid": "u1" })]).await,
            Ok(Some(r#"hello "u1""#.to_string()))
        );

        server
            .run_until(async { Signal::Terminate })
            .await
            .unwrap();
        assert_eq!(server.status().current_status(), ServerStatus::Closing);
        assert!(server.lanes().is_closed());
        assert!(server.databases().server().stopped.load(Ordering::SeqCst));
        assert_eq!(handler.call(vec![json!({ "uid": "u1" })]).await, Ok(None));
    }

    #[tokio::test]
    async fn failed_connection_aborts_start() {
        let driver = FakeDriver {
            failing: vec!["mongodb://h:2/server".into()],
            ..FakeDriver::default()
        };
        let res = Server::start_with(sys(), &driver, Vec::new()).await;
        assert!(matches!(res, Err(StartupError::Db(_))));
    }
}

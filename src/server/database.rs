//! # Database lifecycle boundary.
//!
//! The crate does not talk to a database itself. A [`Driver`] opens a
//! connection for a URL and returns the handle together with a stream of
//! [`ConnectionEvent`]s; [`Databases`] sequences startup on top of it.
//!
//! ## Startup sequence
//! ```text
//! Databases::start(driver, sys)
//!   ├─► db_global (optional) ─► open ─► await Connected
//!   ├─► server db (required) ─► open ─► await Connected
//!   └─► for zone in zoneIdList ─► open ─► await Connected
//!
//! await Connected:
//!   ├─ Connected     ─► spawn watcher (logs Disconnected / Error), continue
//!   ├─ Error(e)      ─► DbError::Connect (fatal)
//!   ├─ Disconnected  ─► keep waiting
//!   └─ stream closed ─► DbError::ClosedBeforeConnect (fatal)
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::settings::{DbConfig, SysConfig};
use crate::error::{DbError, StartupError};

/// Notification emitted by a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    Error(String),
    Disconnected,
}

/// Open connection handle.
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    /// Closes the connection.
    async fn stop(&self) -> Result<(), DbError>;
}

/// Connection being established: the handle plus its event stream.
pub struct Connecting<C> {
    pub handle: C,
    pub events: mpsc::Receiver<ConnectionEvent>,
}

/// Database driver.
pub trait Driver: Send + Sync + 'static {
    type Conn: Connection;

    /// Starts connecting to `url`. Progress is reported on the event stream.
    fn open(&self, url: &str) -> Connecting<Self::Conn>;
}

/// Connections established at startup.
pub struct Databases<C> {
    global: Option<C>,
    server: C,
    zones: BTreeMap<String, C>,
}

impl<C: Connection> Databases<C> {
    /// Connects every database named by `sys`; the first failure aborts startup.
    pub async fn start<D>(driver: &D, sys: &SysConfig) -> Result<Self, StartupError>
    where
        D: Driver<Conn = C>,
    {
        let global = match &sys.db_global {
            Some(cfg) => Some(connect(driver, cfg, "global").await?),
            None => None,
        };

        let server = connect(driver, sys.server_db()?, "server").await?;

        let mut zones = BTreeMap::new();
        for zone in &sys.server.zone_id_list {
            let conn = connect(driver, sys.zone_db(zone)?, zone).await?;
            zones.insert(zone.clone(), conn);
        }

        Ok(Self {
            global,
            server,
            zones,
        })
    }

    pub fn global(&self) -> Option<&C> {
        self.global.as_ref()
    }

    pub fn server(&self) -> &C {
        &self.server
    }

    pub fn zone(&self, zone: &str) -> Option<&C> {
        self.zones.get(zone)
    }

    /// Stops every connection; returns the first failure after trying all.
    pub async fn stop(&self) -> Result<(), DbError> {
        let mut first_err = None;
        let all = self
            .global
            .iter()
            .chain(std::iter::once(&self.server))
            .chain(self.zones.values());

        for conn in all {
            if let Err(e) = conn.stop().await {
                error!(err = %e, "failed to stop connection");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Opens one connection and waits for it to be established.
async fn connect<D: Driver>(driver: &D, cfg: &DbConfig, label: &str) -> Result<D::Conn, DbError> {
    let url = cfg.url();
    debug!(db = label, %url, "connecting");

    let Connecting { handle, mut events } = driver.open(&url);
    loop {
        match events.recv().await {
            Some(ConnectionEvent::Connected) => break,
            Some(ConnectionEvent::Error(reason)) => {
                error!(db = label, %url, %reason, "connection error");
                return Err(DbError::Connect { url, reason });
            }
            Some(ConnectionEvent::Disconnected) => {
                debug!(db = label, %url, "disconnected while connecting");
            }
            None => return Err(DbError::ClosedBeforeConnect { url }),
        }
    }
    info!(db = label, %url, "connected");

    let label = label.to_string();
    tokio::spawn(async move {
        while let Some(ev) = events.recv().await {
            match ev {
                ConnectionEvent::Disconnected => debug!(db = %label, %url, "connection disconnected"),
                ConnectionEvent::Error(reason) => warn!(db = %label, %url, %reason, "connection error"),
                ConnectionEvent::Connected => debug!(db = %label, %url, "connection re-established"),
            }
        }
    });

    Ok(handle)
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory driver used by server tests.

    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Clone, Default)]
    pub struct FakeConn {
        pub url: String,
        pub stopped: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Connection for FakeConn {
        async fn stop(&self) -> Result<(), DbError> {
            self.stopped.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Connects every URL, except those listed in `failing`.
    #[derive(Default)]
    pub struct FakeDriver {
        pub failing: Vec<String>,
        pub opened: Mutex<Vec<FakeConn>>,
    }

    impl Driver for FakeDriver {
        type Conn = FakeConn;

        fn open(&self, url: &str) -> Connecting<FakeConn> {
            let (tx, events) = mpsc::channel(4);
            let event = if self.failing.iter().any(|f| f == url) {
                ConnectionEvent::Error("refused".into())
            } else {
                ConnectionEvent::Connected
            };
            let _ = tx.try_send(ConnectionEvent::Disconnected);
            let _ = tx.try_send(event);

            let handle = FakeConn {
                url: url.to_string(),
                stopped: Arc::default(),
            };
            self.opened.lock().push(handle.clone());
            Connecting { handle, events }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeDriver;
    use super::*;
    use std::sync::atomic::Ordering;

    fn sys(json: &str) -> SysConfig {
        serde_json::from_str(json).unwrap()
    }

    const SYS: &str = r#"{
        "db_global": { "host": "g", "port": 1, "db": "global" },
        "db_server_map": { "s1": { "host": "h", "port": 2, "db": "server" } },
        "server": { "serverId": "s1", "zoneIdList": ["z1"] }
    }"#;

    #[tokio::test]
    async fn connects_global_server_and_zones_in_order() {
        let driver = FakeDriver::default();
        let dbs = Databases::start(&driver, &sys(SYS)).await.unwrap();

        assert_eq!(dbs.global().unwrap().url, "mongodb://g:1/global");
        assert_eq!(dbs.server().url, "mongodb://h:2/server");
        assert_eq!(dbs.zone("z1").unwrap().url, "mongodb://h:2/server");

        let opened: Vec<String> = driver.opened.lock().iter().map(|c| c.url.clone()).collect();
        assert_eq!(
            opened,
            vec!["mongodb://g:1/global", "mongodb://h:2/server", "mongodb://h:2/server"]
        );

        dbs.stop().await.unwrap();
        assert!(driver.opened.lock().iter().all(|c| c.stopped.load(Ordering::SeqCst)));
    }

    #[tokio::test]
    async fn connection_error_is_fatal() {
        let driver = FakeDriver {
            failing: vec!["mongodb://h:2/server".into()],
            ..FakeDriver::default()
        };
        let err = Databases::start(&driver, &sys(SYS)).await.err().unwrap();
        assert!(matches!(err, StartupError::Db(DbError::Connect { .. })));
    }

    #[tokio::test]
    async fn missing_server_entry_is_fatal() {
        let driver = FakeDriver::default();
        let err = Databases::start(&driver, &sys(r#"{ "server": { "serverId": "nope" } }"#))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StartupError::Config(_)));
    }
}

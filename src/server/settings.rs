//! # JSON configuration loading.
//!
//! [`ConfigLoader`] resolves configuration files under an environment- and
//! provider-specific directory:
//!
//! ```text
//! <root>/<environment>/<provider>/<filename>
//! ```
//!
//! [`ConfigLoader::from_env`] reads the three components from
//! `SERVER_CONFIG_ROOT` (default `config`), `SERVER_ENVIRONMENT` (default `dev`)
//! and `SERVER_PROVIDER` (default `local`).
//!
//! Loading never panics: failures are logged and returned as [`ConfigError`].

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::core::Config;
use crate::error::ConfigError;

/// Name of the server configuration file.
pub const SYS_CONFIG_FILE: &str = "sys.json";

/// Connection settings for one database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub db: String,
}

impl DbConfig {
    /// Connection URL handed to the driver.
    pub fn url(&self) -> String {
        format!("mongodb://{}:{}/{}", self.host, self.port, self.db)
    }
}

/// Identity of this server process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerInfo {
    #[serde(rename = "serverId")]
    pub server_id: String,
    #[serde(rename = "zoneIdList", default)]
    pub zone_id_list: Vec<String>,
}

/// Contents of [`SYS_CONFIG_FILE`].
#[derive(Debug, Clone, Deserialize)]
pub struct SysConfig {
    /// Optional cross-server database.
    #[serde(default)]
    pub db_global: Option<DbConfig>,
    /// Database per server id (zones fall back to their server's entry).
    #[serde(default)]
    pub db_server_map: HashMap<String, DbConfig>,
    pub server: ServerInfo,
    /// Lane runtime settings.
    #[serde(default)]
    pub lanes: Config,
}

impl SysConfig {
    /// Database config for this server.
    pub fn server_db(&self) -> Result<&DbConfig, ConfigError> {
        self.db_server_map
            .get(&self.server.server_id)
            .ok_or_else(|| ConfigError::MissingServer {
                server_id: self.server.server_id.clone(),
            })
    }

    /// Database config for a zone: its own entry, else the server's.
    pub fn zone_db(&self, zone: &str) -> Result<&DbConfig, ConfigError> {
        match self.db_server_map.get(zone) {
            Some(cfg) => Ok(cfg),
            None => self.server_db(),
        }
    }
}

/// Resolves and parses JSON configuration files.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    root: PathBuf,
    environment: String,
    provider: String,
}

impl ConfigLoader {
    /// Creates a loader for `<root>/<environment>/<provider>/`.
    pub fn new(
        root: impl Into<PathBuf>,
        environment: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            environment: environment.into(),
            provider: provider.into(),
        }
    }

    /// Builds a loader from `SERVER_CONFIG_ROOT`, `SERVER_ENVIRONMENT`, `SERVER_PROVIDER`.
    pub fn from_env() -> Self {
        let var = |name: &str, default: &str| std::env::var(name).unwrap_or_else(|_| default.to_string());
        Self::new(
            var("SERVER_CONFIG_ROOT", "config"),
            var("SERVER_ENVIRONMENT", "dev"),
            var("SERVER_PROVIDER", "local"),
        )
    }

    /// Directory the loader reads from.
    pub fn base_path(&self) -> PathBuf {
        self.root.join(&self.environment).join(&self.provider)
    }

    /// Reads and parses `filename` from [`base_path`](Self::base_path).
    pub fn load_json<T: DeserializeOwned>(&self, filename: &str) -> Result<T, ConfigError> {
        let path = self.base_path().join(filename);
        debug!(path = %path.display(), "loading config");

        let raw = std::fs::read_to_string(&path).map_err(|source| {
            error!(path = %path.display(), %source, "config read failed");
            ConfigError::Read {
                path: path.clone(),
                source,
            }
        })?;

        let data = serde_json::from_str(&raw).map_err(|source| {
            error!(path = %path.display(), %source, "config parse failed");
            ConfigError::Parse {
                path: path.clone(),
                source,
            }
        })?;
        debug!(path = %path.display(), "config loaded");
        Ok(data)
    }

    /// Loads [`SYS_CONFIG_FILE`].
    pub fn load_sys(&self) -> Result<SysConfig, ConfigError> {
        self.load_json(SYS_CONFIG_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn scratch_loader(tag: &str) -> ConfigLoader {
        let root = std::env::temp_dir().join(format!("keylane-{tag}-{}", std::process::id()));
        let loader = ConfigLoader::new(root, "test", "local");
        std::fs::create_dir_all(loader.base_path()).unwrap();
        loader
    }

    #[test]
    fn loads_sys_config() {
        let loader = scratch_loader("sys");
        std::fs::write(
            loader.base_path().join(SYS_CONFIG_FILE),
            r#"{
                "db_global": { "host": "g", "port": 27017, "db": "global" },
                "db_server_map": {
                    "s1": { "host": "h", "port": 27018, "db": "server" },
                    "z2": { "host": "z", "port": 27019, "db": "zone2" }
                },
                "server": { "serverId": "s1", "zoneIdList": ["z1", "z2"] },
                "lanes": { "max_queue_size": 5, "grace_ms": 100 }
            }"#,
        )
        .unwrap();

        let sys = loader.load_sys().unwrap();
        assert_eq!(sys.db_global.as_ref().unwrap().url(), "mongodb://g:27017/global");
        assert_eq!(sys.server_db().unwrap().db, "server");
        assert_eq!(sys.zone_db("z1").unwrap().db, "server");
        assert_eq!(sys.zone_db("z2").unwrap().db, "zone2");
        assert_eq!(sys.lanes.max_queue_size, 5);
        assert_eq!(sys.lanes.grace, Duration::from_millis(100));
    }

    #[test]
    fn missing_file_is_an_error_not_a_panic() {
        let loader = scratch_loader("missing");
        let err = loader.load_json::<SysConfig>("absent.json").unwrap_err();
        assert_eq!(err.as_label(), "config_read");
    }

    #[test]
    fn malformed_json_is_reported() {
        let loader = scratch_loader("malformed");
        std::fs::write(loader.base_path().join("bad.json"), "{ nope").unwrap();
        let err = loader.load_json::<serde_json::Value>("bad.json").unwrap_err();
        assert_eq!(err.as_label(), "config_parse");
    }

    #[test]
    fn unknown_server_id_is_reported() {
        let sys: SysConfig =
            serde_json::from_str(r#"{ "server": { "serverId": "s9" } }"#).unwrap();
        assert!(matches!(
            sys.server_db(),
            Err(ConfigError::MissingServer { server_id }) if server_id == "s9"
        ));
    }
}

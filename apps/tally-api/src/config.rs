//! Server configuration module.
//!
//! Configuration is layered with the `config` crate:
//! built-in defaults, then an optional `tally.toml` in the working directory,
//! then `TALLY_*` environment variables.
//!
//! | Key               | Env var                 | Default        |
//! |-------------------|-------------------------|----------------|
//! | `bind_addr`       | `TALLY_BIND_ADDR`       | `0.0.0.0`      |
//! | `port`            | `TALLY_PORT`            | `8080`         |
//! | `database_path`   | `TALLY_DATABASE_PATH`   | `./tally.db`   |
//! | `max_connections` | `TALLY_MAX_CONNECTIONS` | `5`            |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tally_db::DbConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
const DEFAULT_PORT: i64 = 8080;
const DEFAULT_DATABASE_PATH: &str = "./tally.db";
const DEFAULT_MAX_CONNECTIONS: i64 = 5;

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Interface to listen on
    pub bind_addr: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Upper bound of the connection pool
    pub max_connections: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT as u16,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            max_connections: DEFAULT_MAX_CONNECTIONS as u32,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `tally.toml` (optional) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("tally")
    }

    /// Loads configuration using `file_stem` as the optional config file.
    pub fn load_from(file_stem: &str) -> Result<Self, ConfigError> {
        let config: ApiConfig = Config::builder()
            .set_default("bind_addr", DEFAULT_BIND_ADDR)?
            .set_default("port", DEFAULT_PORT)?
            .set_default("database_path", DEFAULT_DATABASE_PATH)?
            .set_default("max_connections", DEFAULT_MAX_CONNECTIONS)?
            .add_source(File::with_name(file_stem).required(false))
            .add_source(Environment::with_prefix("TALLY").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }
        self.bind_ip()?;
        Ok(())
    }

    fn bind_ip(&self) -> Result<IpAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidValue("bind_addr".to_string()))
    }

    /// Address the HTTP listener binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(SocketAddr::new(self.bind_ip()?, self.port))
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.max_connections)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:8080");
        assert_eq!(config.db_config().max_connections, 5);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "port = 9001\nbind_addr = \"127.0.0.1\"\ndatabase_path = \"/tmp/x.db\"\n",
        )
        .unwrap();

        let stem = dir.path().join("custom");
        let config = ApiConfig::load_from(stem.to_str().unwrap()).unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:9001");
        assert_eq!(config.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn test_rejects_bad_bind_addr() {
        let config = ApiConfig {
            bind_addr: "not-an-ip".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(
            config.socket_addr(),
            Err(ConfigError::InvalidValue(field)) if field == "bind_addr"
        ));
    }
}

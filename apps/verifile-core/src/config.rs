//! Configuration shared by the server and the client

use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the batch files
    pub path: PathBuf,
    /// File holding the committed root hash (client side)
    pub root_hash_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "localhost".to_string(),
                port: 8080,
            },
            storage: StorageConfig {
                path: PathBuf::from("storage"),
                root_hash_path: PathBuf::from(".verifile/root_hash"),
            },
            log: LogConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Config {
    /// Read configuration from the process environment, falling back to
    /// defaults for unset variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = match var("SERVER_PORT") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "SERVER_PORT",
                value,
            })?,
            None => defaults.server.port,
        };

        let level = var("LOG_LEVEL").unwrap_or(defaults.log.level);
        if !is_known_level(&level) {
            return Err(ConfigError::Invalid {
                name: "LOG_LEVEL",
                value: level,
            });
        }

        Ok(Config {
            server: ServerConfig {
                host: var("SERVER_ADDRESS")
                    .or_else(|| var("SERVER_HOST"))
                    .unwrap_or(defaults.server.host),
                port,
            },
            storage: StorageConfig {
                path: var("STORAGE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.path),
                root_hash_path: var("ROOT_HASH_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.root_hash_path),
            },
            log: LogConfig {
                level: level.to_lowercase(),
            },
        })
    }

    /// Base URL the client talks to
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server.host, self.server.port)
    }

    /// Address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn is_known_level(level: &str) -> bool {
    matches!(
        level.to_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error" | "off"
    )
}

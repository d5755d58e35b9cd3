//! Server configuration loaded from TOML.

use derive_getters::Getters;
use derive_more::{Display, Error};
use ludus_rules::GameConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Which session store backs the server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Process-local map; games are lost on restart.
    #[default]
    Memory,
    /// SQLite database file.
    Sqlite {
        /// Path to the database file, created if missing.
        #[serde(default = "default_sqlite_path")]
        path: String,
    },
}

/// Settings for the HTTP server and session coordination.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// Session store backend.
    #[serde(default)]
    storage: StorageConfig,

    /// How often a waiting player re-reads the store, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    poll_interval_ms: u64,

    /// How many times a join retries after a storage write conflict.
    #[serde(default = "default_join_conflict_retries")]
    join_conflict_retries: u32,

    /// How long `/api/waitstate` holds a request before answering 204.
    #[serde(default = "default_wait_timeout_secs")]
    wait_timeout_secs: u64,

    /// Compressed config used when a new game request names none.
    #[serde(default = "default_game_config")]
    default_game_config: String,

    /// Largest rank or file count accepted for new games.
    #[serde(default = "default_max_board_dimension")]
    max_board_dimension: usize,
}

fn default_sqlite_path() -> String {
    "ludus.db".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_join_conflict_retries() -> u32 {
    3
}

fn default_wait_timeout_secs() -> u64 {
    30
}

fn default_game_config() -> String {
    GameConfig::default().to_compressed()
}

fn default_max_board_dimension() -> usize {
    64
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            storage: StorageConfig::default(),
            poll_interval_ms: default_poll_interval_ms(),
            join_conflict_retries: default_join_conflict_retries(),
            wait_timeout_secs: default_wait_timeout_secs(),
            default_game_config: default_game_config(),
            max_board_dimension: default_max_board_dimension(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or a
    /// value is out of range.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(host = %config.host, port = config.port, storage = ?config.storage, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid TOML for this shape
    /// or a value is out of range.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Replaces the bind address where an override is given.
    pub fn with_address(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// Poll interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Wait window as a duration.
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    /// Parsed default game config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configured text is not a valid config.
    pub fn game_config(&self) -> Result<GameConfig, ConfigError> {
        GameConfig::from_compressed(&self.default_game_config).map_err(|e| {
            ConfigError::new(format!(
                "Invalid default_game_config '{}': {}",
                self.default_game_config, e
            ))
        })
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first offending setting.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::new("poll_interval_ms must be positive".to_string()));
        }
        if self.wait_timeout_secs == 0 {
            return Err(ConfigError::new("wait_timeout_secs must be positive".to_string()));
        }
        if self.max_board_dimension < 4 {
            return Err(ConfigError::new(
                "max_board_dimension must be 4 or greater".to_string(),
            ));
        }
        let game = self.game_config()?;
        if game.rank_count().max(game.file_count()) > self.max_board_dimension {
            return Err(ConfigError::new(format!(
                "default_game_config '{}' exceeds max_board_dimension {}",
                self.default_game_config, self.max_board_dimension
            )));
        }
        if let StorageConfig::Sqlite { path } = &self.storage
            && path.is_empty()
        {
            return Err(ConfigError::new("storage path must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

//! # Application Configuration
//!
//! Configuration loaded once at startup, before any database call.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command line (highest priority)                                    │
//! │     --db ./optica.db                                                   │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     OPTICA_DB_PATH=/srv/optica/optica.db                               │
//! │     OPTICA_MAX_CONNECTIONS=3                                           │
//! │     OPTICA_SHOP_NAME="Óptica Gama"                                     │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     --config <path>, or                                                │
//! │     ~/.config/optica/config.toml (Linux)                               │
//! │     ~/Library/Application Support/cl.optica.optica/config.toml (macOS)│
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! │     database in the platform data dir, 5 connections, 30 s timeout     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/srv/optica/optica.db"
//! max_connections = 5
//! connect_timeout_secs = 30
//!
//! [shop]
//! name = "Óptica Gama"
//! ```

use directories::ProjectDirs;
use optica_db::DbConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Created with its parent directories if missing.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_database_path() -> PathBuf {
    ProjectDirs::from("cl", "optica", "optica")
        .map(|dirs| dirs.data_dir().join("optica.db"))
        .unwrap_or_else(|| PathBuf::from("optica.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// `[shop]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopSettings {
    /// Printed on report and sale headers.
    #[serde(default = "default_shop_name")]
    pub name: String,
}

fn default_shop_name() -> String {
    "Óptica".to_string()
}

impl Default for ShopSettings {
    fn default() -> Self {
        ShopSettings {
            name: default_shop_name(),
        }
    }
}

// =============================================================================
// App Configuration
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub shop: ShopSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file: an explicit `config_path` must exist; the platform
    ///    default is optional
    /// 3. Environment variables
    pub fn load(config_path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn from_file(path: &Path) -> ConfigResult<Self> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Replaces the database path (the `--db` flag).
    pub fn with_database_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            debug!(?path, "Overriding database path from command line");
            self.database.path = path;
        }
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "database.connect_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.shop.name.trim().is_empty() {
            return Err(ConfigError::Invalid("shop.name must not be empty".into()));
        }

        Ok(())
    }

    /// Connection settings for [`optica_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `OPTICA_*` overrides from a variable lookup. Unparseable
    /// numbers are ignored.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("OPTICA_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = var("OPTICA_MAX_CONNECTIONS") {
            if let Ok(n) = max.parse::<u32>() {
                self.database.max_connections = n;
            }
        }

        if let Some(name) = var("OPTICA_SHOP_NAME") {
            self.shop.name = name;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("cl", "optica", "optica").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_partial_file() {
        let config: AppConfig = toml::from_str(
            r#"
            [database]
            path = "/srv/optica/optica.db"

            [shop]
            name = "Óptica Gama"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, PathBuf::from("/srv/optica/optica.db"));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.connect_timeout_secs, 30);
        assert_eq!(config.shop.name, "Óptica Gama");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_is_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("OPTICA_DB_PATH", "/tmp/other.db"),
            ("OPTICA_MAX_CONNECTIONS", "2"),
            ("OPTICA_SHOP_NAME", "Visión Sur"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.shop.name, "Visión Sur");
    }

    #[test]
    fn test_bad_number_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides(|k| (k == "OPTICA_MAX_CONNECTIONS").then(|| "many".to_string()));
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_command_line_path_wins() {
        let config = AppConfig::default().with_database_path(Some(PathBuf::from("./cli.db")));
        assert_eq!(config.database.path, PathBuf::from("./cli.db"));

        let untouched = AppConfig::default().with_database_path(None);
        assert_eq!(untouched.database.path, default_database_path());
    }

    #[test]
    fn test_validate() {
        let mut config = AppConfig::default();
        config.database.max_connections = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.shop.name = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/optica/config.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_db_config() {
        let mut config = AppConfig::default();
        config.database.max_connections = 3;
        config.database.connect_timeout_secs = 7;

        let db = config.db_config();
        assert_eq!(db.max_connections, 3);
        assert_eq!(db.connect_timeout, Duration::from_secs(7));
        assert_eq!(db.database_path, config.database.path);
    }
}

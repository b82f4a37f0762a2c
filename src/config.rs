//! Application configuration
//!
//! Loaded from TOML. Search order: an explicit `--config` path, then
//! `kpiwatch.toml` next to the executable, then the embedded default.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::db;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid log level '{0}' (expected error, warn, info, debug or trace)")]
    InvalidLevel(String),
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub simulation: SimulationDefaults,
    /// File the configuration was read from; `None` for the embedded default
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct DatabaseConfig {
    /// SQLite file; relative paths resolve against the executable directory
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SimulationDefaults {
    pub default_seed: u64,
    pub default_duration_minutes: u32,
}

impl Default for SimulationDefaults {
    fn default() -> Self {
        Self {
            default_seed: 42,
            default_duration_minutes: 5,
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[database]
# path = "kpiwatch.db"

[logging]
level = "info"

[simulation]
default_seed = 42
default_duration_minutes = 5
"#;

const CONFIG_FILE_NAME: &str = "kpiwatch.toml";

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: Config = toml::from_str(&contents)?;
    config.source = Some(path.to_path_buf());
    config.log_level()?;
    Ok(config)
}

/// Load configuration, trying `explicit` first
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        return read_config(path);
    }

    if let Some(exe_dir) = exe_dir() {
        let config_path = exe_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return read_config(&config_path);
        }
    }

    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

fn exe_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

impl Config {
    /// Configured tracing level
    pub fn log_level(&self) -> Result<tracing::Level, ConfigError> {
        self.logging
            .level
            .parse::<tracing::Level>()
            .map_err(|_| ConfigError::InvalidLevel(self.logging.level.clone()))
    }

    /// Database file path
    ///
    /// Absolute paths are used as is, relative ones resolve against the
    /// executable directory; without a configured path the per-user data
    /// directory is used.
    pub fn database_path(&self) -> PathBuf {
        let Some(configured) = self.database.path.as_deref() else {
            return db::default_db_path();
        };

        let path = Path::new(configured);
        if path.is_absolute() {
            return path.to_path_buf();
        }

        match exe_dir() {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config_loads() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.database.path, None);
        assert_eq!(config.log_level().unwrap(), tracing::Level::INFO);
        assert_eq!(config.simulation.default_seed, 42);
        assert_eq!(config.simulation.default_duration_minutes, 5);
        assert_eq!(config.database_path(), db::default_db_path());
    }

    #[test]
    fn test_explicit_config_file() {
        let path = std::env::temp_dir().join("kpiwatch_test_config.toml");
        fs::write(
            &path,
            "[database]\npath = \"/var/lib/kpiwatch/plant.db\"\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
        assert_eq!(config.database_path(), PathBuf::from("/var/lib/kpiwatch/plant.db"));
        assert_eq!(config.log_level().unwrap(), tracing::Level::DEBUG);
        // missing section falls back to defaults
        assert_eq!(config.simulation, SimulationDefaults::default());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_invalid_level_rejected() {
        let path = std::env::temp_dir().join("kpiwatch_test_config_level.toml");
        fs::write(&path, "[logging]\nlevel = \"loud\"\n").unwrap();

        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::InvalidLevel(level)) if level == "loud"
        ));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_explicit_file() {
        let path = std::env::temp_dir().join("kpiwatch_test_config_missing.toml");
        assert!(matches!(load_config(Some(&path)), Err(ConfigError::Io { .. })));
    }
}

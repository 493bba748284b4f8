//! Service configuration.
//!
//! Loaded from a JSON file (default `~/.mezban/config.json`); a missing
//! file yields the defaults so a fresh checkout runs without setup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Database file location. `None` falls back to
    /// [`crate::db::default_database_path`].
    pub database_path: Option<PathBuf>,
    /// Directory uploaded application files are stored under.
    pub upload_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            database_path: None,
            upload_dir: PathBuf::from("uploads"),
        }
    }
}

/// Returns the canonical config path: `~/.mezban/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".mezban").join("config.json"))
}

/// Loads configuration from `path`, or from the default location when
/// `None`. A missing file is not an error.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let resolved = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => {
                log::info!("No home directory, using default config");
                return Ok(Config::default());
            }
        },
    };

    if !resolved.exists() {
        log::info!(
            "Config file {} not found, using defaults",
            resolved.display()
        );
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(&resolved).map_err(|e| ConfigError::ReadFile {
        path: resolved.clone(),
        source: e,
    })?;
    let config: Config = serde_json::from_str(&contents)?;
    validate(&config)?;

    log::info!("Loaded config from {}", resolved.display());
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.port == 0 {
        return Err(ConfigError::Validation {
            message: "port must be non-zero".to_string(),
        });
    }
    if config.upload_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation {
            message: "uploadDir must not be empty".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"port": 9090, "databasePath": "/tmp/mezban.db", "uploadDir": "/tmp/uploads"}"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/mezban.db")));
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/uploads"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"port": 3000}"#).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn test_zero_port_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"port": 0}"#).unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseJson(_)));
    }
}

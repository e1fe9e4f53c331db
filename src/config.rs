use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::Deserialize;
use thiserror::Error;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".medwise";
/// Optional configuration file inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not locate home directory")]
    NoHome,
    #[error("failed to read config {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Replaces the bundled dataset when set.
    pub dataset_path: Option<PathBuf>,
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset_path: None,
            log_filter: "medwise=info".to_string(),
        }
    }
}

/// Directory holding the database, log file and optional config.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dirs = BaseDirs::new().ok_or(ConfigError::NoHome)?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

/// Load the config file, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

//! Configuration loading and data folder resolution

use std::path::PathBuf;

use serde::Deserialize;

use crate::{Error, Result};

/// Service configuration
///
/// Loaded from a TOML file when one exists, otherwise defaults. The data
/// folder (and with it the database path) resolves in priority order:
/// command-line argument, `CARELOG_DATA` environment variable, `data_folder`
/// key in the config file, OS-dependent default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Folder holding the database file
    pub data_folder: PathBuf,
    /// Operator session lifetime, sliding, in minutes
    pub session_minutes: i64,
    /// Graph jobs untouched longer than this are swept, in minutes
    pub graph_job_retention_minutes: i64,
    /// Keep the historical activity-list rotation (first entry moved to
    /// the end). Consumers index into the list positionally; turn this off
    /// only once they no longer do.
    pub rotate_activity_list: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5730".to_string(),
            data_folder: default_data_folder(),
            session_minutes: 30,
            graph_job_retention_minutes: 60,
            rotate_activity_list: true,
        }
    }
}

impl Config {
    /// Load configuration, resolving the data folder.
    ///
    /// `cli_folder` wins over `CARELOG_DATA`, which wins over the config
    /// file, which wins over the compiled default.
    pub fn load(cli_folder: Option<&str>) -> Result<Self> {
        let mut config = match config_file_path() {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path)?;
                toml::from_str(&content)
                    .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?
            }
            _ => Self::default(),
        };

        if let Ok(folder) = std::env::var("CARELOG_DATA") {
            config.data_folder = PathBuf::from(folder);
        }
        if let Some(folder) = cli_folder {
            config.data_folder = PathBuf::from(folder);
        }

        Ok(config)
    }

    /// Database file inside the data folder
    pub fn database_path(&self) -> PathBuf {
        self.data_folder.join("carelog.db")
    }

    /// Create the data folder if missing
    pub fn ensure_data_folder(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_folder)?;
        Ok(())
    }
}

/// Platform config file location (`~/.config/carelog/config.toml` or the
/// OS equivalent)
fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("carelog").join("config.toml"))
}

/// OS-dependent default data folder
fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("carelog"))
        .unwrap_or_else(|| PathBuf::from("./carelog_data"))
}

//! Fanout configuration.
//!
//! Loaded from `~/.fanout/config.toml`. Every key is optional; a missing file
//! means defaults. Command-line flags override whatever is configured here.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::executor::DEFAULT_MAX_IN_FLIGHT;

/// Fanout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Where records and artifacts are stored.
    /// Defaults to `~/.fanout/store/`.
    pub storage_root: Option<PathBuf>,

    /// Default number of batches a run is split into.
    pub partitions: usize,

    /// Default record field used as the store key.
    pub key_field: Option<String>,

    /// How many words word-frequency output shows.
    pub top_k: usize,

    /// How many tasks of a batch may run at once.
    pub max_in_flight: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_root: None,
            partitions: 4,
            key_field: None,
            top_k: 10,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

impl Config {
    /// Load config from `~/.fanout/config.toml`, or defaults if it's missing.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a specific file, or defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        let config: Self = toml::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        if config.partitions == 0 {
            return Err(format!(
                "partitions must be at least 1 in {}",
                path.display()
            ));
        }

        if config.max_in_flight == 0 {
            return Err(format!(
                "max-in-flight must be at least 1 in {}",
                path.display()
            ));
        }

        Ok(config)
    }

    /// The config file path: `~/.fanout/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".fanout").join("config.toml"))
    }
}

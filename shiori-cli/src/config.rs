//! Settings file handling

use anyhow::{Context, Result};
use serde::Deserialize;
use shiori_sources::SourceConfig;
use std::path::{Path, PathBuf};

/// Tool configuration, loaded from a JSON settings file
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Library file, or the directory holding per-reader library files
    #[serde(default = "default_manga_path")]
    pub manga_path: PathBuf,

    /// SQLite database location
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Default source fetch parallelism
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Chapter sources to scrape
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

fn default_manga_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_database() -> PathBuf {
    PathBuf::from("shiori.db")
}

fn default_pool_size() -> usize {
    4
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            manga_path: default_manga_path(),
            database: default_database(),
            pool_size: default_pool_size(),
            sources: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }
}

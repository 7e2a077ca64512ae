//! Configuration loading and management

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.json";

/// Settings read from `<data-dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Snapshot file name, relative to the data directory
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: String,

    /// Directory of static files served at `/` (editor front-end)
    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    /// File inside `static_dir` served for `/`
    #[serde(default = "default_index_file")]
    pub index_file: String,

    /// Allow cross-origin requests from any origin
    #[serde(default = "default_true")]
    pub cors_permissive: bool,
}

fn default_snapshot_file() -> String {
    "documents.json".to_string()
}

fn default_index_file() -> String {
    "index.html".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_file: default_snapshot_file(),
            static_dir: None,
            index_file: default_index_file(),
            cors_permissive: true,
        }
    }
}

impl Config {
    /// Read `<data_dir>/config.json`. On first start the file does not exist
    /// yet; the defaults are written there so they can be edited.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);

        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let config = serde_json::from_str(&text)
                    .with_context(|| format!("Invalid {}", path.display()))?;
                tracing::info!("Using {}", path.display());
                Ok(config)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let config = Config::default();
                config.write_to(&path)?;
                tracing::info!("Wrote default settings to {}", path.display());
                Ok(config)
            }
            Err(err) => Err(err).with_context(|| format!("Cannot read {}", path.display())),
        }
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create {}", dir.display()))?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).with_context(|| format!("Cannot write {}", path.display()))
    }

    /// Full path of the snapshot file
    pub fn snapshot_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.snapshot_file)
    }
}

// Pipeline configuration for the command-line layer

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which transforms the pipeline applies between decode and encode.
///
/// The core operations never read this; the pipeline passes the values to
/// them explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Drop pitch columns that never sound
    pub prune_columns: bool,

    /// Replace velocities with 1 and keep only the average
    pub binarize_volume: bool,

    /// Average this many consecutive frames into one (lossy, export only)
    pub row_batch_size: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            prune_columns: true,
            binarize_volume: false,
            row_batch_size: None,
        }
    }
}

impl PipelineConfig {
    /// Load config from `path` (or the default location) or return default
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(config) => {
                        log::info!("Loaded pipeline config from {}", config_path.display());
                        return config;
                    }
                    Err(e) => {
                        log::warn!("Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read config file: {}", e);
                }
            }
        }

        Self::default()
    }

    /// Save config to disk
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }
}

/// Get the default config file path
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pianola")
        .join("pipeline.toml")
}

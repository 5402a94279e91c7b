use crate::app::types::OpenMode;
use crate::model::ids::Orientation;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    /// Periodic snapshots of unsaved content
    #[serde(default)]
    pub autosave: AutosaveConfig,

    /// Detection of external changes to open files
    #[serde(default)]
    pub file_check: FileCheckConfig,

    /// Split and open behavior
    #[serde(default)]
    pub layout: LayoutConfig,
}

/// Autosave configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AutosaveConfig {
    /// Run one background autosave worker per document
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Interval between snapshot writes, in milliseconds
    #[serde(default = "default_autosave_interval")]
    pub interval_ms: u64,

    /// Directory receiving the snapshots
    /// Defaults to `<data dir>/tessera/autosave`, or the temp dir when no
    /// data dir is known.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_autosave_interval() -> u64 {
    30_000
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: default_autosave_interval(),
            scratch_dir: None,
        }
    }
}

impl AutosaveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn resolved_scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .map(|d| d.join("tessera").join("autosave"))
                .unwrap_or_else(|| std::env::temp_dir().join("tessera-autosave"))
        })
    }
}

/// File change detection configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileCheckConfig {
    /// Poll backing files for external modification or removal
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Poll interval in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval() -> u64 {
    2_000
}

impl Default for FileCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl FileCheckConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Split tree and open routing configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LayoutConfig {
    /// Total size shared by the children of every splitter
    #[serde(default = "default_split_extent")]
    pub split_extent: u32,

    /// Orientation used when opening a file splits the active view
    #[serde(default = "default_orientation")]
    pub default_orientation: Orientation,

    /// Where files opened without an explicit target go
    #[serde(default)]
    pub open_mode: OpenMode,

    /// Prefix of placeholder names for unsaved documents
    #[serde(default = "default_placeholder_prefix")]
    pub placeholder_prefix: String,
}

fn default_split_extent() -> u32 {
    1000
}

fn default_orientation() -> Orientation {
    Orientation::Horizontal
}

fn default_placeholder_prefix() -> String {
    "Untitled".to_string()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            split_extent: default_split_extent(),
            default_orientation: default_orientation(),
            open_mode: OpenMode::default(),
            placeholder_prefix: default_placeholder_prefix(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tessera").join("config.json"))
    }

    /// Load configuration from the default location, falling back to defaults if not found
    pub fn load_or_default() -> Self {
        if let Some(config_path) = Self::default_config_path() {
            if config_path.exists() {
                match Self::load_from_file(&config_path) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!(
                            "Failed to load config from {}: {}, using defaults",
                            config_path.display(),
                            e
                        );
                    }
                }
            }
        }
        Self::default()
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Config =
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        std::fs::write(path.as_ref(), contents).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layout.split_extent < 2 {
            return Err(ConfigError::ValidationError(
                "layout.split_extent must be at least 2".to_string(),
            ));
        }
        if self.layout.placeholder_prefix.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "layout.placeholder_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// JSON Schema of the configuration file, pretty-printed
    pub fn json_schema() -> String {
        let schema = schemars::schema_for!(Config);
        serde_json::to_string_pretty(&schema).unwrap_or_default()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Serialize error: {0}")]
    SerializeError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

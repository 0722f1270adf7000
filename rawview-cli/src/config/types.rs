use rawview_core::{RegistryConfig, VersionPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawRawviewConfig {
    #[serde(default)]
    pub plugins: RawPluginsConfig,
}

/// Plugin config as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPluginsConfig {
    /// Directory searched for plugin modules
    pub dir: Option<PathBuf>,

    /// Parent of every plugin's persistent directory
    pub persistent_dir: Option<PathBuf>,

    /// File name suffixes of plugin modules
    pub module_suffixes: Option<Vec<String>>,

    /// What to do with plugins needing a newer interface
    pub version_policy: Option<VersionPolicy>,

    /// Register the plugins shipped with rawview
    pub builtin: Option<bool>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RawviewConfig {
    #[serde(default)]
    pub plugins: PluginsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginsConfig {
    /// Settings handed to the plugin registry
    #[serde(flatten)]
    pub registry: RegistryConfig,

    /// Register the plugins shipped with rawview
    pub builtin: bool,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            builtin: true,
        }
    }
}

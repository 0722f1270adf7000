//! Registry configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::policy::VersionPolicy;

/// File name suffixes that mark plugin modules, compared case-insensitively
pub const DEFAULT_MODULE_SUFFIXES: [&str; 3] =
    [".rawplugin.so", ".rawplugin.dylib", ".rawplugin.dll"];

/// Configuration for [`PluginRegistry`](crate::PluginRegistry)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Directory searched recursively for plugin modules
    pub plugin_dir: PathBuf,
    /// File name suffixes of plugin modules
    pub module_suffixes: Vec<String>,
    /// Parent of every plugin's persistent directory
    pub persistent_root: PathBuf,
    /// What to do with plugins needing a newer interface
    pub version_policy: VersionPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            plugin_dir: rawview_paths::plugin_dir(),
            module_suffixes: default_suffixes(),
            persistent_root: rawview_paths::persistent_dir(),
            version_policy: VersionPolicy::default(),
        }
    }
}

impl RegistryConfig {
    /// Configuration rooted at `root` instead of the install directory
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            plugin_dir: root.join(rawview_paths::PLUGIN_DIR_NAME),
            module_suffixes: default_suffixes(),
            persistent_root: root.join(rawview_paths::PERSISTENT_DIR_NAME),
            version_policy: VersionPolicy::default(),
        }
    }

    /// Builder: set the plugin directory
    pub fn with_plugin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plugin_dir = dir.into();
        self
    }

    /// Builder: set the version policy
    pub fn with_version_policy(mut self, policy: VersionPolicy) -> Self {
        self.version_policy = policy;
        self
    }
}

fn default_suffixes() -> Vec<String> {
    DEFAULT_MODULE_SUFFIXES.iter().map(|s| s.to_string()).collect()
}

use super::types::{PluginsConfig, RawPluginsConfig, RawRawviewConfig, RawviewConfig};
use anyhow::{Context, Result};
use rawview_core::RegistryConfig;
use std::path::{Path, PathBuf};

/// Environment variable overriding the project config directory
pub const PROJECT_CONFIG_DIR_ENV: &str = "RAWVIEW_PROJECT_CONFIG_DIR";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project + command line)
    pub fn load(overrides: RawRawviewConfig) -> Result<RawviewConfig> {
        let mut raw = RawRawviewConfig::default();

        // Layer 1: User config
        let user_path = Self::user_config_path();
        if user_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&project_path)?);
        }

        // Layer 3: Command-line flags
        raw = Self::merge_raw(raw, overrides);

        Ok(Self::finalize(raw))
    }

    /// Get user config path
    pub fn user_config_path() -> PathBuf {
        rawview_paths::config_dir().join("config.toml")
    }

    /// Get project config path
    /// Can be overridden with RAWVIEW_PROJECT_CONFIG_DIR env var
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var(PROJECT_CONFIG_DIR_ENV) {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".rawview/config.toml")
        }
    }

    fn read_raw(path: &Path) -> Result<RawRawviewConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawRawviewConfig, overlay: RawRawviewConfig) -> RawRawviewConfig {
        RawRawviewConfig {
            plugins: RawPluginsConfig {
                dir: overlay.plugins.dir.or(base.plugins.dir),
                persistent_dir: overlay.plugins.persistent_dir.or(base.plugins.persistent_dir),
                module_suffixes: overlay
                    .plugins
                    .module_suffixes
                    .or(base.plugins.module_suffixes),
                version_policy: overlay.plugins.version_policy.or(base.plugins.version_policy),
                builtin: overlay.plugins.builtin.or(base.plugins.builtin),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawRawviewConfig) -> RawviewConfig {
        let defaults = RegistryConfig::default();
        RawviewConfig {
            plugins: PluginsConfig {
                registry: RegistryConfig {
                    plugin_dir: raw.plugins.dir.unwrap_or(defaults.plugin_dir),
                    module_suffixes: raw
                        .plugins
                        .module_suffixes
                        .unwrap_or(defaults.module_suffixes),
                    persistent_root: raw
                        .plugins
                        .persistent_dir
                        .unwrap_or(defaults.persistent_root),
                    version_policy: raw.plugins.version_policy.unwrap_or(defaults.version_policy),
                },
                builtin: raw.plugins.builtin.unwrap_or(true),
            },
        }
    }
}

//! Registry error types

use std::path::PathBuf;

use rawview_plugin_api::{PluginError, PluginId};
use thiserror::Error;

/// Errors returned by [`PluginRegistry`](crate::PluginRegistry) operations
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Plugin requires a newer interface and the policy refuses it
    #[error(
        "Plugin '{plugin}' requires interface version {required}, host supports {supported}"
    )]
    VersionRejected {
        plugin: String,
        required: u32,
        supported: u32,
    },

    /// Unique name cannot be used as a directory name
    #[error("Plugin name '{name}' is not usable as a directory name")]
    InvalidUniqueName { name: String },

    /// Persistent directory could not be created
    #[error("Failed to create persistent directory {path} for '{plugin}': {source}")]
    PersistentDir {
        plugin: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Plugin initialization returned an error or panicked
    #[error("Plugin '{plugin}' failed to initialize: {detail}")]
    InitFailed { plugin: String, detail: String },

    /// No plugin with this id is registered
    #[error("Plugin {id} is not registered")]
    NotRegistered { id: PluginId },

    /// Priority change refused
    #[error(transparent)]
    Priority(#[from] PriorityError),
}

/// Reasons a priority change is refused. The existing order is kept.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriorityError {
    /// No plugin is registered under the identifier
    #[error("Identifier '{identifier}' has no registered plugins")]
    UnknownIdentifier { identifier: String },

    /// The new order does not have as many entries as the current one
    #[error("Identifier '{identifier}' has {expected} plugins, new order lists {supplied}")]
    LengthMismatch {
        identifier: String,
        expected: usize,
        supplied: usize,
    },

    /// The new order lists a plugin not registered under the identifier
    #[error("Plugin {plugin} is not registered under '{identifier}'")]
    ForeignPlugin { identifier: String, plugin: PluginId },

    /// The new order lists a plugin twice
    #[error("Plugin {plugin} is listed twice for '{identifier}'")]
    DuplicatePlugin { identifier: String, plugin: PluginId },
}

/// Errors loading a plugin module
#[derive(Error, Debug)]
pub enum ModuleError {
    /// Library could not be opened or a required symbol is missing
    #[error("Failed to load plugin module: {0}")]
    Library(#[from] libloading::Error),

    /// The module's constructor returned no instance
    #[error("Plugin module returned no instance at index {index}")]
    NullInstance { index: usize },
}

impl From<RegistryError> for PluginError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Priority(e) => PluginError::PriorityRejected(e.to_string()),
            RegistryError::NotRegistered { id } => PluginError::NotRegistered(id.to_string()),
            other => PluginError::Registration(other.to_string()),
        }
    }
}

impl From<PriorityError> for PluginError {
    fn from(err: PriorityError) -> Self {
        PluginError::PriorityRejected(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_rejected_display() {
        let err = RegistryError::VersionRejected {
            plugin: "hex".to_string(),
            required: 3,
            supported: 0,
        };
        let msg = err.to_string();
        assert!(msg.contains("hex"));
        assert!(msg.contains('3'));
    }

    #[test]
    fn test_priority_error_is_transparent() {
        let err: RegistryError = PriorityError::UnknownIdentifier {
            identifier: ".raw".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Identifier '.raw' has no registered plugins");
    }

    #[test]
    fn test_priority_error_maps_to_plugin_error() {
        let err: PluginError = PriorityError::DuplicatePlugin {
            identifier: ".raw".to_string(),
            plugin: PluginId::new(2),
        }
        .into();
        assert!(matches!(err, PluginError::PriorityRejected(_)));
        assert!(err.to_string().contains("#2"));
    }

    #[test]
    fn test_registry_error_maps_to_plugin_error() {
        let err: PluginError = RegistryError::InvalidUniqueName {
            name: "..".to_string(),
        }
        .into();
        assert!(matches!(err, PluginError::Registration(_)));

        let err: PluginError = RegistryError::NotRegistered {
            id: PluginId::new(9),
        }
        .into();
        assert!(matches!(err, PluginError::NotRegistered(_)));
    }

    #[test]
    fn test_null_instance_display() {
        let err = ModuleError::NullInstance { index: 4 };
        assert!(err.to_string().contains('4'));
    }
}

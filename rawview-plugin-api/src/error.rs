//! Error types for plugin authors

use thiserror::Error;

use crate::capability::Capability;

/// Errors that plugins return and that host callbacks report back to plugins
#[derive(Error, Debug)]
pub enum PluginError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Custom error with message
    #[error("{0}")]
    Custom(String),

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested byte range lies outside the data buffer
    #[error("Range {offset}+{length} is outside a buffer of {available} bytes")]
    OutOfRange {
        offset: usize,
        length: usize,
        available: usize,
    },

    /// The registry that created this context no longer exists
    #[error("Plugin host is no longer available")]
    HostUnavailable,

    /// A host service was used without declaring the capability for it
    #[error("Capability not declared: {0}")]
    CapabilityMissing(Capability),

    /// A priority change was refused by the host
    #[error("Priority change rejected: {0}")]
    PriorityRejected(String),

    /// Registering a further plugin failed
    #[error("Plugin registration failed: {0}")]
    Registration(String),

    /// The plugin referred to is not registered
    #[error("Plugin is not registered: {0}")]
    NotRegistered(String),
}

impl PluginError {
    /// Create a custom error with a message
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let config_err = PluginError::Config("missing key".to_string());
        assert_eq!(config_err.to_string(), "Configuration error: missing key");

        let custom_err = PluginError::Custom("something happened".to_string());
        assert_eq!(custom_err.to_string(), "something happened");

        let missing = PluginError::CapabilityMissing(Capability::PluginLoader);
        assert_eq!(missing.to_string(), "Capability not declared: plugin-loader");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let plugin_err: PluginError = io_err.into();

        assert!(matches!(plugin_err, PluginError::Io(_)));
        assert!(plugin_err.to_string().contains("file not found"));
    }

    #[test]
    fn test_helper_constructors() {
        let err = PluginError::custom("test");
        assert!(matches!(err, PluginError::Custom(_)));

        let err = PluginError::config("bad config");
        assert!(matches!(err, PluginError::Config(_)));

        let err = PluginError::invalid_input("bad bytes");
        assert!(matches!(err, PluginError::InvalidInput(_)));
    }

    #[test]
    fn test_out_of_range_display() {
        let err = PluginError::OutOfRange {
            offset: 10,
            length: 4,
            available: 12,
        };
        let msg = err.to_string();
        assert!(msg.contains("10+4"));
        assert!(msg.contains("12"));
    }
}

//! Host-facing diagnostics
//!
//! Failures caused by plugins or plugin modules never abort the registry.
//! They are reported as [`Diagnostic`]s to the sink the registry was built
//! with, and the registry carries on.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use rawview_plugin_api::Capability;

/// A recoverable problem the host should know about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A plugin module could not be loaded and was skipped
    ModuleLoadFailed { module: PathBuf, error: String },
    /// The plugin directory exists but could not be read
    PluginDirUnreadable { dir: PathBuf, error: String },
    /// A plugin needs a newer interface than this host supports
    VersionIncompatible {
        plugin: String,
        required: u32,
        supported: u32,
    },
    /// A handler failed or panicked while building a view
    PluginInvocationFailed { plugin: String, detail: String },
    /// A settings view could not be built
    SettingsRenderFailed { plugin: String, detail: String },
    /// A late activation hook failed or panicked
    LateActivationFailed { plugin: String, detail: String },
    /// A declared role has no implementation; the role is skipped
    CapabilityMismatch {
        plugin: String,
        capability: Capability,
    },
    /// A plugin was refused while loading
    RegistrationFailed { plugin: String, error: String },
}

impl Diagnostic {
    /// Name of the plugin this diagnostic is about, if any
    pub fn plugin(&self) -> Option<&str> {
        match self {
            Diagnostic::ModuleLoadFailed { .. } | Diagnostic::PluginDirUnreadable { .. } => None,
            Diagnostic::VersionIncompatible { plugin, .. }
            | Diagnostic::PluginInvocationFailed { plugin, .. }
            | Diagnostic::SettingsRenderFailed { plugin, .. }
            | Diagnostic::LateActivationFailed { plugin, .. }
            | Diagnostic::CapabilityMismatch { plugin, .. }
            | Diagnostic::RegistrationFailed { plugin, .. } => Some(plugin),
        }
    }

    /// Emit this diagnostic through `tracing`
    pub fn log(&self) {
        match self {
            Diagnostic::ModuleLoadFailed { module, error } => {
                tracing::error!(module = %module.display(), error = %error, "Failed to load plugin module");
            }
            Diagnostic::PluginDirUnreadable { dir, error } => {
                tracing::error!(dir = %dir.display(), error = %error, "Plugin directory is unreadable");
            }
            Diagnostic::VersionIncompatible {
                plugin,
                required,
                supported,
            } => {
                tracing::warn!(
                    plugin = %plugin,
                    required = required,
                    supported = supported,
                    "Plugin requires a newer interface version"
                );
            }
            Diagnostic::PluginInvocationFailed { plugin, detail } => {
                tracing::error!(plugin = %plugin, error = %detail, "Plugin failed to build a view");
            }
            Diagnostic::SettingsRenderFailed { plugin, detail } => {
                tracing::error!(plugin = %plugin, error = %detail, "Plugin settings view failed");
            }
            Diagnostic::LateActivationFailed { plugin, detail } => {
                tracing::error!(plugin = %plugin, error = %detail, "Plugin late activation failed");
            }
            Diagnostic::CapabilityMismatch { plugin, capability } => {
                tracing::warn!(
                    plugin = %plugin,
                    capability = %capability,
                    "Plugin declares a role it does not implement"
                );
            }
            Diagnostic::RegistrationFailed { plugin, error } => {
                tracing::error!(plugin = %plugin, error = %error, "Plugin registration failed");
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ModuleLoadFailed { module, error } => {
                write!(f, "could not load {}: {}", module.display(), error)
            }
            Diagnostic::PluginDirUnreadable { dir, error } => {
                write!(f, "could not read plugin directory {}: {}", dir.display(), error)
            }
            Diagnostic::VersionIncompatible {
                plugin,
                required,
                supported,
            } => write!(
                f,
                "{plugin} requires interface version {required}, this host supports {supported}"
            ),
            Diagnostic::PluginInvocationFailed { plugin, detail } => {
                write!(f, "{plugin} failed: {detail}")
            }
            Diagnostic::SettingsRenderFailed { plugin, detail } => {
                write!(f, "{plugin} settings failed: {detail}")
            }
            Diagnostic::LateActivationFailed { plugin, detail } => {
                write!(f, "{plugin} late activation failed: {detail}")
            }
            Diagnostic::CapabilityMismatch { plugin, capability } => {
                write!(f, "{plugin} declares {capability} but does not implement it")
            }
            Diagnostic::RegistrationFailed { plugin, error } => {
                write!(f, "{plugin} was not registered: {error}")
            }
        }
    }
}

/// Receives diagnostics from the registry.
///
/// Called from whichever thread hit the problem, never with a registry lock held.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Logs diagnostics and drops them
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        diagnostic.log();
    }
}

/// Keeps diagnostics for the host to show later. Nothing is logged.
#[derive(Debug, Default)]
pub struct CollectingSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything reported so far
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return everything reported so far
    pub fn drain(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }
}

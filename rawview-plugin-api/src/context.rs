//! PluginContext - a plugin's interface to host services
//!
//! The host builds one context per plugin and hands it to
//! [`Plugin::initialize`](crate::Plugin::initialize) exactly once. Every
//! service handle on the context is gated by a declared [`Capability`]: a
//! plugin that did not declare `PluginLoader` never gets a [`Loader`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use serde::{Serialize, de::DeserializeOwned};

use crate::Plugin;
use crate::capability::{Capability, CapabilitySet};
use crate::error::PluginError;
use crate::types::{DataRequest, FileRequest, PluginHandle, PluginId, ViewElement};

/// File name used for [`PluginSettings`] inside a persistent directory.
pub const SETTINGS_FILE: &str = "settings.toml";

// ─── Host Services ───────────────────────────────────────────────────

/// Services the host exposes to plugins.
///
/// Implemented by the registry. Plugins never call this directly; they go
/// through the capability-gated handles on [`PluginContext`].
pub trait HostServices: Send + Sync {
    /// Route a data request through the data identifier table
    fn dispatch_data(&self, request: &DataRequest<'_>) -> Option<ViewElement>;

    /// Route a file request through the file identifier table
    fn dispatch_file(&self, request: &FileRequest<'_>) -> Option<ViewElement>;

    /// Register another plugin, late-activating it when it asks for that
    fn register_plugin(&self, plugin: Arc<dyn Plugin>) -> Result<PluginHandle, PluginError>;

    /// Remove a plugin from every routing table. Returns false when absent.
    fn unload_plugin(&self, id: PluginId) -> bool;

    /// All registered plugins in registration order
    fn plugins(&self) -> Vec<PluginHandle>;

    /// Plugins registered under exactly this data identifier, by priority
    fn data_plugins(&self, identifier: &str) -> Vec<PluginHandle>;

    /// Plugins registered under exactly this file identifier, by priority
    fn file_plugins(&self, identifier: &str) -> Vec<PluginHandle>;

    fn data_identifiers(&self) -> Vec<String>;

    fn file_identifiers(&self) -> Vec<String>;

    /// Replace the priority order at a data identifier
    fn change_data_priority(&self, identifier: &str, order: &[PluginId])
    -> Result<(), PluginError>;

    /// Replace the priority order at a file identifier
    fn change_file_priority(&self, identifier: &str, order: &[PluginId])
    -> Result<(), PluginError>;

    /// Re-read the data identifiers of `id` and re-route it
    fn data_identifiers_changed(&self, id: PluginId) -> Result<(), PluginError>;

    /// Re-read the file identifiers of `id` and re-route it
    fn file_identifiers_changed(&self, id: PluginId) -> Result<(), PluginError>;
}

/// Weak link back to the host.
#[derive(Clone)]
struct HostLink(Weak<dyn HostServices>);

impl HostLink {
    fn get(&self) -> Result<Arc<dyn HostServices>, PluginError> {
        self.0.upgrade().ok_or(PluginError::HostUnavailable)
    }
}

// ─── Service Handles ─────────────────────────────────────────────────

/// Asks the host to display data or files through other plugins.
#[derive(Clone)]
pub struct ViewRequester {
    host: HostLink,
    data: bool,
    file: bool,
}

impl ViewRequester {
    /// Dispatch a data request. Requires `DataViewRequester`.
    pub fn dispatch_data(
        &self,
        request: &DataRequest<'_>,
    ) -> Result<Option<ViewElement>, PluginError> {
        if !self.data {
            return Err(PluginError::CapabilityMissing(Capability::DataViewRequester));
        }
        Ok(self.host.get()?.dispatch_data(request))
    }

    /// Dispatch a file request. Requires `FileViewRequester`.
    pub fn dispatch_file(
        &self,
        request: &FileRequest<'_>,
    ) -> Result<Option<ViewElement>, PluginError> {
        if !self.file {
            return Err(PluginError::CapabilityMissing(Capability::FileViewRequester));
        }
        Ok(self.host.get()?.dispatch_file(request))
    }
}

/// Tells the host that this plugin's identifier set changed.
#[derive(Clone)]
pub struct IdentifierNotifier {
    host: HostLink,
    plugin: PluginId,
    data: bool,
    file: bool,
}

impl IdentifierNotifier {
    /// Re-route this plugin under its current data identifiers.
    ///
    /// The plugin drops to the lowest priority under every identifier.
    pub fn data_identifiers_changed(&self) -> Result<(), PluginError> {
        if !self.data {
            return Err(PluginError::CapabilityMissing(
                Capability::DynamicDataIdentifiers,
            ));
        }
        self.host.get()?.data_identifiers_changed(self.plugin)
    }

    /// Re-route this plugin under its current file identifiers.
    pub fn file_identifiers_changed(&self) -> Result<(), PluginError> {
        if !self.file {
            return Err(PluginError::CapabilityMissing(
                Capability::DynamicFileIdentifiers,
            ));
        }
        self.host.get()?.file_identifiers_changed(self.plugin)
    }
}

/// Registers further plugins.
#[derive(Clone)]
pub struct Loader {
    host: HostLink,
}

impl Loader {
    pub fn register(&self, plugin: Arc<dyn Plugin>) -> Result<PluginHandle, PluginError> {
        self.host.get()?.register_plugin(plugin)
    }
}

/// Unloads plugins.
#[derive(Clone)]
pub struct Unloader {
    host: HostLink,
}

impl Unloader {
    /// Returns `Ok(false)` when the plugin was not registered.
    pub fn unload(&self, id: PluginId) -> Result<bool, PluginError> {
        Ok(self.host.get()?.unload_plugin(id))
    }
}

/// Enumerates registered plugins.
#[derive(Clone)]
pub struct Enumerator {
    host: HostLink,
}

impl Enumerator {
    pub fn plugins(&self) -> Result<Vec<PluginHandle>, PluginError> {
        Ok(self.host.get()?.plugins())
    }

    pub fn data_plugins(&self, identifier: &str) -> Result<Vec<PluginHandle>, PluginError> {
        Ok(self.host.get()?.data_plugins(identifier))
    }

    pub fn file_plugins(&self, identifier: &str) -> Result<Vec<PluginHandle>, PluginError> {
        Ok(self.host.get()?.file_plugins(identifier))
    }
}

/// Enumerates identifiers that currently route to at least one plugin.
#[derive(Clone)]
pub struct IdentifierLister {
    host: HostLink,
}

impl IdentifierLister {
    pub fn data_identifiers(&self) -> Result<Vec<String>, PluginError> {
        Ok(self.host.get()?.data_identifiers())
    }

    pub fn file_identifiers(&self) -> Result<Vec<String>, PluginError> {
        Ok(self.host.get()?.file_identifiers())
    }
}

/// Reorders plugins registered at an identifier.
///
/// `order` must list exactly the plugins currently registered at the
/// identifier, highest priority first. Anything else is rejected and the
/// existing order is kept.
#[derive(Clone)]
pub struct Prioritiser {
    host: HostLink,
}

impl Prioritiser {
    pub fn change_data_priority(
        &self,
        identifier: &str,
        order: &[PluginId],
    ) -> Result<(), PluginError> {
        self.host.get()?.change_data_priority(identifier, order)
    }

    pub fn change_file_priority(
        &self,
        identifier: &str,
        order: &[PluginId],
    ) -> Result<(), PluginError> {
        self.host.get()?.change_file_priority(identifier, order)
    }
}

// ─── Plugin Context ──────────────────────────────────────────────────

/// Plugin's interface to the host.
///
/// Provides:
/// - the plugin's registry identity and name
/// - its persistent directory (with `PersistentStorage`)
/// - one service handle per declared callback capability
/// - logging helpers
#[derive(Clone)]
pub struct PluginContext {
    plugin_id: PluginId,
    plugin_name: String,
    capabilities: CapabilitySet,
    persistent_dir: Option<PathBuf>,
    host: Option<HostLink>,
}

impl PluginContext {
    /// Create a context wired to a host
    pub fn new(
        plugin_id: PluginId,
        plugin_name: String,
        capabilities: CapabilitySet,
        host: Weak<dyn HostServices>,
    ) -> Self {
        Self {
            plugin_id,
            plugin_name,
            capabilities,
            persistent_dir: None,
            host: Some(HostLink(host)),
        }
    }

    /// Create a context with no host behind it (every service handle is absent)
    pub fn detached(plugin_id: PluginId, plugin_name: String, capabilities: CapabilitySet) -> Self {
        Self {
            plugin_id,
            plugin_name,
            capabilities,
            persistent_dir: None,
            host: None,
        }
    }

    /// Builder: set the persistent directory
    pub fn with_persistent_dir(mut self, dir: PathBuf) -> Self {
        self.persistent_dir = Some(dir);
        self
    }

    pub fn plugin_id(&self) -> PluginId {
        self.plugin_id
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    /// Capabilities the host recorded for this plugin
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// Private directory for persistent state, if `PersistentStorage` was declared
    pub fn persistent_dir(&self) -> Option<&Path> {
        self.persistent_dir.as_deref()
    }

    /// Load the plugin's settings file from its persistent directory
    pub fn load_settings(&self) -> Result<PluginSettings, PluginError> {
        let dir = self
            .persistent_dir()
            .ok_or(PluginError::CapabilityMissing(Capability::PersistentStorage))?;
        PluginSettings::load(&dir.join(SETTINGS_FILE))
    }

    // ─── Service Handles ─────────────────────────────────────────────

    fn link_if(&self, wanted: &[Capability]) -> Option<HostLink> {
        if wanted.iter().any(|c| self.capabilities.contains(*c)) {
            self.host.clone()
        } else {
            None
        }
    }

    /// Dispatch into other plugins (`DataViewRequester` / `FileViewRequester`)
    pub fn view_requester(&self) -> Option<ViewRequester> {
        self.link_if(&[Capability::DataViewRequester, Capability::FileViewRequester])
            .map(|host| ViewRequester {
                host,
                data: self.capabilities.contains(Capability::DataViewRequester),
                file: self.capabilities.contains(Capability::FileViewRequester),
            })
    }

    /// Report identifier changes (`DynamicDataIdentifiers` / `DynamicFileIdentifiers`)
    pub fn identifier_notifier(&self) -> Option<IdentifierNotifier> {
        self.link_if(&[
            Capability::DynamicDataIdentifiers,
            Capability::DynamicFileIdentifiers,
        ])
        .map(|host| IdentifierNotifier {
            host,
            plugin: self.plugin_id,
            data: self
                .capabilities
                .contains(Capability::DynamicDataIdentifiers),
            file: self
                .capabilities
                .contains(Capability::DynamicFileIdentifiers),
        })
    }

    /// Register further plugins (`PluginLoader`)
    pub fn loader(&self) -> Option<Loader> {
        self.link_if(&[Capability::PluginLoader])
            .map(|host| Loader { host })
    }

    /// Unload plugins (`PluginUnloader`)
    pub fn unloader(&self) -> Option<Unloader> {
        self.link_if(&[Capability::PluginUnloader])
            .map(|host| Unloader { host })
    }

    /// Enumerate plugins (`PluginEnumerator`)
    pub fn enumerator(&self) -> Option<Enumerator> {
        self.link_if(&[Capability::PluginEnumerator])
            .map(|host| Enumerator { host })
    }

    /// Enumerate identifiers (`IdentifierEnumerator`)
    pub fn identifier_lister(&self) -> Option<IdentifierLister> {
        self.link_if(&[Capability::IdentifierEnumerator])
            .map(|host| IdentifierLister { host })
    }

    /// Reorder plugins at an identifier (`PriorityChanger`)
    pub fn prioritiser(&self) -> Option<Prioritiser> {
        self.link_if(&[Capability::PriorityChanger])
            .map(|host| Prioritiser { host })
    }

    // ─── Logging ─────────────────────────────────────────────────────

    /// Log an info message (automatically prefixed with plugin name)
    pub fn log_info(&self, message: &str) {
        tracing::info!(plugin = %self.plugin_name, "{}", message);
    }

    /// Log a warning message
    pub fn log_warn(&self, message: &str) {
        tracing::warn!(plugin = %self.plugin_name, "{}", message);
    }

    /// Log an error message
    pub fn log_error(&self, message: &str) {
        tracing::error!(plugin = %self.plugin_name, "{}", message);
    }

    /// Log a debug message
    pub fn log_debug(&self, message: &str) {
        tracing::debug!(plugin = %self.plugin_name, "{}", message);
    }
}

impl std::fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginContext")
            .field("plugin_id", &self.plugin_id)
            .field("plugin_name", &self.plugin_name)
            .field("capabilities", &self.capabilities)
            .field("persistent_dir", &self.persistent_dir)
            .field("attached", &self.host.is_some())
            .finish()
    }
}

// ─── Plugin Settings ─────────────────────────────────────────────────

/// Plugin settings - persistent key-value store backed by TOML
#[derive(Debug, Clone)]
pub struct PluginSettings {
    values: HashMap<String, toml::Value>,
    dirty: bool,
}

impl PluginSettings {
    /// Create empty settings
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
            dirty: false,
        }
    }

    /// Load settings from a TOML file; a missing file yields empty settings
    pub fn load(path: &Path) -> Result<Self, PluginError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        let values: HashMap<String, toml::Value> =
            toml::from_str(&content).map_err(|e| PluginError::Config(e.to_string()))?;
        Ok(Self {
            values,
            dirty: false,
        })
    }

    /// Save settings to a TOML file
    pub fn save(&mut self, path: &Path) -> Result<(), PluginError> {
        let content = toml::to_string_pretty(&self.values)
            .map_err(|e| PluginError::Serialization(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.exists()) {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        self.dirty = false;
        Ok(())
    }

    /// Get a value
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values.get(key).and_then(|v| v.clone().try_into().ok())
    }

    /// Get a value or a default when missing or of the wrong type
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Set a value
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), PluginError> {
        let toml_value =
            toml::Value::try_from(value).map_err(|e| PluginError::Serialization(e.to_string()))?;
        self.values.insert(key.to_string(), toml_value);
        self.dirty = true;
        Ok(())
    }

    /// Check if the settings changed since loading/saving
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Keys in sorted order
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self::new()
    }
}

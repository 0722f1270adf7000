//! PluginRegistry - plugin lifecycle, routing and dispatch

use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use rawview_plugin_api::{
    Capability, CapabilitySet, DataRequest, FileRequest, HostServices, INTERFACE_VERSION, Plugin,
    PluginContext, PluginError, PluginHandle, PluginId, ViewElement,
};

use crate::config::RegistryConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::discovery::{PluginModule, discover_modules};
use crate::error::{PriorityError, RegistryError};
use crate::isolate;
use crate::policy::VersionVerdict;
use crate::resolver::{self, Candidate, RouteKind};
use crate::router::IdentifierRouter;

/// Text of the settings view for plugins that have none
pub const NO_SETTINGS: &str = "No settings!";

/// Counts from one [`PluginRegistry::load_plugins`] run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Modules loaded successfully
    pub modules_loaded: usize,
    /// Modules that failed to load and were skipped
    pub modules_failed: usize,
    /// Plugins registered (built-in and discovered)
    pub plugins_registered: usize,
    /// Plugins refused at registration
    pub plugins_rejected: usize,
    /// Late activation hooks run
    pub late_activated: usize,
}

/// A plugin as the registry stores it
struct RegisteredPlugin {
    id: PluginId,
    plugin: Arc<dyn Plugin>,
    capabilities: CapabilitySet,
    late_activated: bool,
}

impl RegisteredPlugin {
    fn handle(&self) -> PluginHandle {
        PluginHandle::new(self.id, Arc::clone(&self.plugin))
    }
}

#[derive(Default)]
struct RegistryState {
    /// Registration order
    plugins: Vec<RegisteredPlugin>,
    data_routes: IdentifierRouter,
    file_routes: IdentifierRouter,
}

impl RegistryState {
    fn find(&self, id: PluginId) -> Option<&RegisteredPlugin> {
        self.plugins.iter().find(|p| p.id == id)
    }

    fn routes(&self, kind: RouteKind) -> &IdentifierRouter {
        match kind {
            RouteKind::Data => &self.data_routes,
            RouteKind::File => &self.file_routes,
        }
    }

    fn routes_mut(&mut self, kind: RouteKind) -> &mut IdentifierRouter {
        match kind {
            RouteKind::Data => &mut self.data_routes,
            RouteKind::File => &mut self.file_routes,
        }
    }

    fn handles(&self, ids: &[PluginId]) -> Vec<PluginHandle> {
        ids.iter()
            .filter_map(|id| self.find(*id))
            .map(RegisteredPlugin::handle)
            .collect()
    }
}

struct RegistryInner {
    config: RegistryConfig,
    sink: Arc<dyn DiagnosticSink>,
    state: RwLock<RegistryState>,
    next_id: AtomicU64,
    /// Handed to plugin contexts so they never keep the registry alive
    this: Weak<RegistryInner>,
    /// Declared after `state` so plugin instances drop first
    modules: Mutex<Vec<PluginModule>>,
}

/// The plugin registry.
///
/// Cheap to clone; clones share the same plugins. Plugin code is never run
/// while internal locks are held, so plugins may call back into the
/// registry from any hook, including from inside a dispatch.
#[derive(Clone)]
pub struct PluginRegistry {
    inner: Arc<RegistryInner>,
}

impl PluginRegistry {
    /// Create an empty registry that logs diagnostics
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    /// Create an empty registry reporting diagnostics to `sink`
    pub fn with_sink(config: RegistryConfig, sink: Arc<dyn DiagnosticSink>) -> Self {
        let inner = Arc::new_cyclic(|this| RegistryInner {
            config,
            sink,
            state: RwLock::new(RegistryState::default()),
            next_id: AtomicU64::new(1),
            this: this.clone(),
            modules: Mutex::new(Vec::new()),
        });
        Self { inner }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Discover and register every plugin module, then run late activation.
    pub fn load_plugins(&self) -> LoadSummary {
        self.load_plugins_with(Vec::new())
    }

    /// Register `builtins` first, then discovered modules, then run late activation.
    ///
    /// Built-ins come first, so they win priority ties with discovered plugins.
    pub fn load_plugins_with(&self, builtins: Vec<Arc<dyn Plugin>>) -> LoadSummary {
        let inner = &self.inner;
        let mut summary = LoadSummary::default();

        for plugin in builtins {
            inner.register_during_load(plugin, &mut summary);
        }

        let dir = &inner.config.plugin_dir;
        let paths = match discover_modules(dir, &inner.config.module_suffixes) {
            Ok(paths) => paths,
            Err(e) => {
                inner.report(Diagnostic::PluginDirUnreadable {
                    dir: dir.clone(),
                    error: e.to_string(),
                });
                Vec::new()
            }
        };

        for path in paths {
            // SAFETY: modules in the plugin directory are trusted to follow
            // the export_plugins! contract.
            match unsafe { PluginModule::load(&path) } {
                Ok((module, plugins)) => {
                    summary.modules_loaded += 1;
                    inner.lock_modules().push(module);
                    for plugin in plugins {
                        inner.register_during_load(plugin, &mut summary);
                    }
                }
                Err(e) => {
                    summary.modules_failed += 1;
                    inner.report(Diagnostic::ModuleLoadFailed {
                        module: path,
                        error: e.to_string(),
                    });
                }
            }
        }

        summary.late_activated = inner.activate_pending();

        tracing::info!(
            modules = summary.modules_loaded,
            failed = summary.modules_failed,
            plugins = summary.plugins_registered,
            "Plugins loaded"
        );
        summary
    }

    /// Register one plugin. It becomes routable once this returns.
    ///
    /// Late activation is not run here; see [`load_plugins`](Self::load_plugins).
    pub fn register(&self, plugin: Arc<dyn Plugin>) -> Result<PluginHandle, RegistryError> {
        self.inner.register(plugin)
    }

    /// Remove a plugin from the plugin list and both routing tables.
    ///
    /// Returns false when it was not registered.
    pub fn unload(&self, id: PluginId) -> bool {
        self.inner.unload(id)
    }

    /// Ask data plugins to display `request`
    pub fn dispatch_data(&self, request: &DataRequest<'_>) -> Option<ViewElement> {
        self.inner.dispatch_data(request)
    }

    /// Ask file plugins to display the file at `path`, routed by `identifier`
    pub fn dispatch_file(&self, identifier: &str, path: &Path) -> Option<ViewElement> {
        self.inner.dispatch_file(&FileRequest::new(identifier, path))
    }

    /// Every registered plugin in registration order
    pub fn list_plugins(&self) -> Vec<PluginHandle> {
        self.inner.plugins()
    }

    pub fn get(&self, id: PluginId) -> Option<PluginHandle> {
        self.inner.read().find(id).map(RegisteredPlugin::handle)
    }

    /// First registered plugin with this unique name
    pub fn find(&self, unique_name: &str) -> Option<PluginHandle> {
        self.inner
            .read()
            .plugins
            .iter()
            .find(|p| p.plugin.unique_name() == unique_name)
            .map(RegisteredPlugin::handle)
    }

    /// Capabilities recorded for a plugin at registration
    pub fn capabilities_of(&self, id: PluginId) -> Option<CapabilitySet> {
        self.inner.read().find(id).map(|p| p.capabilities.clone())
    }

    pub fn data_identifiers(&self) -> Vec<String> {
        self.inner.identifiers(RouteKind::Data)
    }

    pub fn file_identifiers(&self) -> Vec<String> {
        self.inner.identifiers(RouteKind::File)
    }

    /// Plugins registered under exactly this data identifier, by priority
    pub fn data_plugins_at(&self, identifier: &str) -> Vec<PluginHandle> {
        self.inner.plugins_at(RouteKind::Data, identifier)
    }

    /// Plugins registered under exactly this file identifier, by priority
    pub fn file_plugins_at(&self, identifier: &str) -> Vec<PluginHandle> {
        self.inner.plugins_at(RouteKind::File, identifier)
    }

    /// Replace the priority order under a data identifier
    pub fn change_data_priority(
        &self,
        identifier: &str,
        order: &[PluginId],
    ) -> Result<(), PriorityError> {
        self.inner.change_priority(RouteKind::Data, identifier, order)
    }

    /// Replace the priority order under a file identifier
    pub fn change_file_priority(
        &self,
        identifier: &str,
        order: &[PluginId],
    ) -> Result<(), PriorityError> {
        self.inner.change_priority(RouteKind::File, identifier, order)
    }

    /// Settings view of a plugin, with a placeholder when it has none.
    ///
    /// Returns `None` only for an unknown id.
    pub fn settings_view(&self, id: PluginId) -> Option<ViewElement> {
        let handle = self.get(id)?;
        let name = handle.unique_name().to_string();
        let view = match isolate::invoke(|| handle.plugin().settings_view()) {
            Ok(Some(view)) => view,
            Ok(None) => ViewElement::new(name).with_line(NO_SETTINGS),
            Err(detail) => {
                self.inner.report(Diagnostic::SettingsRenderFailed {
                    plugin: name.clone(),
                    detail: detail.clone(),
                });
                ViewElement::new(name)
                    .with_line("Settings could not be displayed")
                    .with_line(detail)
            }
        };
        Some(view)
    }

    /// Number of loaded plugin modules
    pub fn module_count(&self) -> usize {
        self.inner.lock_modules().len()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.read();
        f.debug_struct("PluginRegistry")
            .field("plugins", &state.plugins.len())
            .field("data_identifiers", &state.data_routes.len())
            .field("file_identifiers", &state.file_routes.len())
            .finish()
    }
}

impl RegistryInner {
    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_modules(&self) -> std::sync::MutexGuard<'_, Vec<PluginModule>> {
        self.modules.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn report(&self, diagnostic: Diagnostic) {
        self.sink.report(diagnostic);
    }

    fn register_during_load(&self, plugin: Arc<dyn Plugin>, summary: &mut LoadSummary) {
        let name = plugin.unique_name().to_string();
        match self.register(plugin) {
            Ok(_) => summary.plugins_registered += 1,
            Err(e) => {
                summary.plugins_rejected += 1;
                self.report(Diagnostic::RegistrationFailed {
                    plugin: name,
                    error: e.to_string(),
                });
            }
        }
    }

    fn register(&self, plugin: Arc<dyn Plugin>) -> Result<PluginHandle, RegistryError> {
        let name = plugin.unique_name().to_string();

        // 1. Interface version
        let required = plugin.min_interface_version();
        match self
            .config
            .version_policy
            .evaluate(required, INTERFACE_VERSION)
        {
            VersionVerdict::Compatible => {}
            verdict => {
                self.report(Diagnostic::VersionIncompatible {
                    plugin: name.clone(),
                    required,
                    supported: INTERFACE_VERSION,
                });
                if verdict == VersionVerdict::Refuse {
                    return Err(RegistryError::VersionRejected {
                        plugin: name,
                        required,
                        supported: INTERFACE_VERSION,
                    });
                }
            }
        }

        // 2. Capabilities, read once
        let capabilities = self.checked_capabilities(&name, plugin.as_ref());
        let id = PluginId::new(self.next_id.fetch_add(1, Ordering::Relaxed));

        // 3. Persistent storage
        let host: Weak<dyn HostServices> = self.this.clone();
        let mut ctx = PluginContext::new(id, name.clone(), capabilities.clone(), host);
        if capabilities.contains(Capability::PersistentStorage) {
            ctx = ctx.with_persistent_dir(self.persistent_dir_for(&name)?);
        }

        // 4. Initialize; nothing is published yet
        isolate::invoke(|| plugin.initialize(ctx)).map_err(|detail| RegistryError::InitFailed {
            plugin: name.clone(),
            detail,
        })?;

        // 5. Publish
        let data_ids = self.read_identifiers(&name, plugin.as_ref(), &capabilities, RouteKind::Data);
        let file_ids = self.read_identifiers(&name, plugin.as_ref(), &capabilities, RouteKind::File);
        {
            let mut state = self.write();
            state.plugins.push(RegisteredPlugin {
                id,
                plugin: Arc::clone(&plugin),
                capabilities: capabilities.clone(),
                late_activated: false,
            });
            state.data_routes.insert(id, data_ids);
            state.file_routes.insert(id, file_ids);
        }

        tracing::info!(plugin = %name, id = %id, capabilities = %capabilities, "Plugin registered");
        Ok(PluginHandle::new(id, plugin))
    }

    /// Declared capabilities, minus roles the plugin does not implement
    fn checked_capabilities(&self, name: &str, plugin: &dyn Plugin) -> CapabilitySet {
        let declared = plugin.capabilities();
        declared
            .iter()
            .filter(|capability| {
                let implemented = match capability {
                    Capability::DataHandler => plugin.as_data_handler().is_some(),
                    Capability::FileHandler => plugin.as_file_handler().is_some(),
                    Capability::LateActivation => plugin.as_late_activated().is_some(),
                    _ => true,
                };
                if !implemented {
                    self.report(Diagnostic::CapabilityMismatch {
                        plugin: name.to_string(),
                        capability: *capability,
                    });
                }
                implemented
            })
            .collect()
    }

    fn persistent_dir_for(&self, name: &str) -> Result<PathBuf, RegistryError> {
        if !is_valid_dir_name(name) {
            return Err(RegistryError::InvalidUniqueName {
                name: name.to_string(),
            });
        }
        let path = self.config.persistent_root.join(name);
        std::fs::create_dir_all(&path).map_err(|source| RegistryError::PersistentDir {
            plugin: name.to_string(),
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Current identifiers of one role. Failures count as no identifiers.
    fn read_identifiers(
        &self,
        name: &str,
        plugin: &dyn Plugin,
        capabilities: &CapabilitySet,
        kind: RouteKind,
    ) -> Vec<String> {
        let result = match kind {
            RouteKind::Data if capabilities.contains(Capability::DataHandler) => plugin
                .as_data_handler()
                .map(|h| isolate::invoke_infallible(|| h.data_identifiers())),
            RouteKind::File if capabilities.contains(Capability::FileHandler) => plugin
                .as_file_handler()
                .map(|h| isolate::invoke_infallible(|| h.file_identifiers())),
            _ => None,
        };
        match result {
            Some(Ok(identifiers)) => identifiers,
            Some(Err(detail)) => {
                self.report(Diagnostic::PluginInvocationFailed {
                    plugin: name.to_string(),
                    detail,
                });
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Run late activation for every plugin that has not had it yet, in
    /// registration order. Returns how many hooks ran.
    fn activate_pending(&self) -> usize {
        let pending: Vec<PluginId> = self
            .read()
            .plugins
            .iter()
            .filter(|p| p.capabilities.contains(Capability::LateActivation) && !p.late_activated)
            .map(|p| p.id)
            .collect();

        pending.into_iter().filter(|id| self.activate_late(*id)).count()
    }

    /// Late-activate one plugin unless it already was. Returns whether the hook ran.
    fn activate_late(&self, id: PluginId) -> bool {
        let plugin = {
            let mut state = self.write();
            let Some(entry) = state.plugins.iter_mut().find(|p| p.id == id) else {
                return false;
            };
            if entry.late_activated || !entry.capabilities.contains(Capability::LateActivation) {
                return false;
            }
            entry.late_activated = true;
            Arc::clone(&entry.plugin)
        };

        let Some(hook) = plugin.as_late_activated() else {
            return false;
        };
        if let Err(detail) = isolate::invoke(|| hook.activate_late()) {
            self.report(Diagnostic::LateActivationFailed {
                plugin: plugin.unique_name().to_string(),
                detail,
            });
        }
        true
    }

    fn unload(&self, id: PluginId) -> bool {
        let mut state = self.write();
        let before = state.plugins.len();
        state.plugins.retain(|p| p.id != id);
        let removed = state.plugins.len() != before;
        state.data_routes.remove_plugin(id);
        state.file_routes.remove_plugin(id);
        drop(state);

        if removed {
            tracing::info!(id = %id, "Plugin unloaded");
        }
        removed
    }

    fn candidates(&self, kind: RouteKind, identifier: &str) -> Vec<Candidate> {
        let state = self.read();
        state
            .routes(kind)
            .candidates(identifier)
            .into_iter()
            .filter_map(|id| state.find(id))
            .map(|p| Candidate {
                id: p.id,
                plugin: Arc::clone(&p.plugin),
            })
            .collect()
    }

    fn identifiers(&self, kind: RouteKind) -> Vec<String> {
        self.read().routes(kind).identifiers()
    }

    fn plugins_at(&self, kind: RouteKind, identifier: &str) -> Vec<PluginHandle> {
        let state = self.read();
        state.handles(state.routes(kind).plugins_at(identifier))
    }

    fn change_priority(
        &self,
        kind: RouteKind,
        identifier: &str,
        order: &[PluginId],
    ) -> Result<(), PriorityError> {
        self.write().routes_mut(kind).reorder(identifier, order)?;
        tracing::debug!(table = kind.as_str(), identifier = %identifier, "Priority changed");
        Ok(())
    }

    fn identifiers_changed(&self, kind: RouteKind, id: PluginId) -> Result<(), RegistryError> {
        let (plugin, capabilities) = {
            let state = self.read();
            let entry = state.find(id).ok_or(RegistryError::NotRegistered { id })?;
            (Arc::clone(&entry.plugin), entry.capabilities.clone())
        };

        let name = plugin.unique_name().to_string();
        let identifiers = self.read_identifiers(&name, plugin.as_ref(), &capabilities, kind);

        let mut state = self.write();
        // unloaded while the identifiers were being read
        if state.find(id).is_none() {
            return Err(RegistryError::NotRegistered { id });
        }
        state.routes_mut(kind).reassign(id, identifiers);
        tracing::debug!(plugin = %name, table = kind.as_str(), "Identifiers re-routed");
        Ok(())
    }
}

impl HostServices for RegistryInner {
    fn dispatch_data(&self, request: &DataRequest<'_>) -> Option<ViewElement> {
        let candidates = self.candidates(RouteKind::Data, request.identifier);
        resolver::resolve(
            &candidates,
            request.identifier,
            &|d| self.report(d),
            |plugin| resolver::try_data(plugin, request),
        )
    }

    fn dispatch_file(&self, request: &FileRequest<'_>) -> Option<ViewElement> {
        let candidates = self.candidates(RouteKind::File, request.identifier);
        resolver::resolve(
            &candidates,
            request.identifier,
            &|d| self.report(d),
            |plugin| resolver::try_file(plugin, request),
        )
    }

    fn register_plugin(&self, plugin: Arc<dyn Plugin>) -> Result<PluginHandle, PluginError> {
        let handle = self.register(plugin)?;
        self.activate_late(handle.id());
        Ok(handle)
    }

    fn unload_plugin(&self, id: PluginId) -> bool {
        self.unload(id)
    }

    fn plugins(&self) -> Vec<PluginHandle> {
        self.read()
            .plugins
            .iter()
            .map(RegisteredPlugin::handle)
            .collect()
    }

    fn data_plugins(&self, identifier: &str) -> Vec<PluginHandle> {
        self.plugins_at(RouteKind::Data, identifier)
    }

    fn file_plugins(&self, identifier: &str) -> Vec<PluginHandle> {
        self.plugins_at(RouteKind::File, identifier)
    }

    fn data_identifiers(&self) -> Vec<String> {
        self.identifiers(RouteKind::Data)
    }

    fn file_identifiers(&self) -> Vec<String> {
        self.identifiers(RouteKind::File)
    }

    fn change_data_priority(
        &self,
        identifier: &str,
        order: &[PluginId],
    ) -> Result<(), PluginError> {
        Ok(self.change_priority(RouteKind::Data, identifier, order)?)
    }

    fn change_file_priority(
        &self,
        identifier: &str,
        order: &[PluginId],
    ) -> Result<(), PluginError> {
        Ok(self.change_priority(RouteKind::File, identifier, order)?)
    }

    fn data_identifiers_changed(&self, id: PluginId) -> Result<(), PluginError> {
        Ok(self.identifiers_changed(RouteKind::Data, id)?)
    }

    fn file_identifiers_changed(&self, id: PluginId) -> Result<(), PluginError> {
        Ok(self.identifiers_changed(RouteKind::File, id)?)
    }
}

/// A single normal path component: not empty, `.`, `..`, or a path
fn is_valid_dir_name(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawview_plugin_api::DataHandler;
    use tempfile::TempDir;

    struct Echo {
        name: &'static str,
        identifiers: Vec<&'static str>,
    }

    impl Plugin for Echo {
        fn unique_name(&self) -> &str {
            self.name
        }

        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet::of(&[Capability::DataHandler])
        }

        fn as_data_handler(&self) -> Option<&dyn DataHandler> {
            Some(self)
        }
    }

    impl DataHandler for Echo {
        fn data_identifiers(&self) -> Vec<String> {
            self.identifiers.iter().map(|s| s.to_string()).collect()
        }

        fn try_view_data(
            &self,
            _request: &DataRequest<'_>,
        ) -> Result<Option<ViewElement>, PluginError> {
            Ok(Some(ViewElement::new(self.name)))
        }
    }

    fn registry(dir: &TempDir) -> PluginRegistry {
        PluginRegistry::new(RegistryConfig::rooted_at(dir.path()))
    }

    #[test]
    fn test_valid_dir_names() {
        assert!(is_valid_dir_name("hex-dump"));
        assert!(is_valid_dir_name("plugin.v2"));
        assert!(!is_valid_dir_name(""));
        assert!(!is_valid_dir_name("."));
        assert!(!is_valid_dir_name(".."));
        assert!(!is_valid_dir_name("a/b"));
        assert!(!is_valid_dir_name("a\\b"));
        assert!(!is_valid_dir_name("/abs"));
    }

    #[test]
    fn test_ids_are_monotonic() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        let a = registry
            .register(Arc::new(Echo {
                name: "a",
                identifiers: vec![".a"],
            }))
            .unwrap();
        let b = registry
            .register(Arc::new(Echo {
                name: "a",
                identifiers: vec![".a"],
            }))
            .unwrap();
        assert!(a.id() < b.id());
        assert_eq!(registry.data_plugins_at(".a"), vec![a, b]);
    }

    #[test]
    fn test_unknown_id_has_no_settings_view() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        assert!(registry.settings_view(PluginId::new(42)).is_none());
        assert!(!registry.unload(PluginId::new(42)));
    }

    #[test]
    fn test_debug_shows_counts() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        registry
            .register(Arc::new(Echo {
                name: "a",
                identifiers: vec![".a", ".b"],
            }))
            .unwrap();
        let debug = format!("{registry:?}");
        assert!(debug.contains("plugins: 1"));
        assert!(debug.contains("data_identifiers: 2"));
    }
}

//! Registry setup shared by every command

use std::sync::Arc;

use rawview_core::{CollectingSink, PluginRegistry};

use crate::config::RawviewConfig;

/// A loaded plugin registry plus the diagnostics it has reported
pub struct Host {
    pub registry: PluginRegistry,
    sink: Arc<CollectingSink>,
}

impl Host {
    /// Build the registry and load built-in and discovered plugins
    pub fn start(config: &RawviewConfig) -> Self {
        let sink = Arc::new(CollectingSink::new());
        let registry = PluginRegistry::with_sink(config.plugins.registry.clone(), sink.clone());

        let builtins = if config.plugins.builtin {
            rawview_basic::builtin_plugins()
        } else {
            Vec::new()
        };
        let summary = registry.load_plugins_with(builtins);
        tracing::debug!(
            plugin_dir = %registry.config().plugin_dir.display(),
            modules = summary.modules_loaded,
            plugins = summary.plugins_registered,
            "Host started"
        );

        Self { registry, sink }
    }

    /// Print every diagnostic reported since the last call to stderr
    pub fn report_diagnostics(&self) -> usize {
        let diagnostics = self.sink.drain();
        for diagnostic in &diagnostics {
            eprintln!("warning: {diagnostic}");
        }
        diagnostics.len()
    }
}

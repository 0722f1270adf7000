//! Shared mock plugins for rawview-core integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use rawview_core::{CollectingSink, PluginRegistry, RegistryConfig};
use rawview_plugin_api::{
    Capability, CapabilitySet, DataHandler, DataRequest, FileHandler, FileRequest, LateActivated,
    Plugin, PluginContext, PluginError, ViewElement,
};
use tempfile::TempDir;

/// Ordered record of plugin calls, shared between mocks
#[derive(Clone, Default)]
pub struct Events(Arc<Mutex<Vec<String>>>);

impl Events {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == event).count()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.0.lock().unwrap().iter().position(|e| e == event)
    }
}

/// How a mock handler answers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reply {
    /// View labelled with the plugin name, one line holding the identifier
    Accept,
    Decline,
    Fail,
    Panic,
}

pub type DataHook =
    Box<dyn Fn(&PluginContext, &DataRequest<'_>) -> Result<Option<ViewElement>, PluginError> + Send + Sync>;
pub type FileHook =
    Box<dyn Fn(&PluginContext, &FileRequest<'_>) -> Result<Option<ViewElement>, PluginError> + Send + Sync>;
pub type LateHook = Box<dyn Fn(&PluginContext) -> Result<(), PluginError> + Send + Sync>;

/// Configurable plugin
pub struct MockPlugin {
    name: String,
    capabilities: CapabilitySet,
    min_version: u32,
    data_ids: Mutex<Vec<String>>,
    file_ids: Mutex<Vec<String>>,
    data_reply: Reply,
    file_reply: Reply,
    data_hook: Option<DataHook>,
    file_hook: Option<FileHook>,
    late_hook: Option<LateHook>,
    settings: Option<Reply>,
    fail_init: Option<Reply>,
    ctx: Mutex<Option<PluginContext>>,
    events: Events,
}

impl MockPlugin {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            capabilities: CapabilitySet::empty(),
            min_version: 0,
            data_ids: Mutex::new(Vec::new()),
            file_ids: Mutex::new(Vec::new()),
            data_reply: Reply::Accept,
            file_reply: Reply::Accept,
            data_hook: None,
            file_hook: None,
            late_hook: None,
            settings: None,
            fail_init: None,
            ctx: Mutex::new(None),
            events: Events::default(),
        }
    }

    fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities = self
            .capabilities
            .iter()
            .chain(std::iter::once(capability))
            .collect();
        self
    }

    pub fn with_capabilities(mut self, capabilities: &[Capability]) -> Self {
        for capability in capabilities {
            self = self.with_capability(*capability);
        }
        self
    }

    /// Handle data under these identifiers
    pub fn data(self, identifiers: &[&str]) -> Self {
        self.set_data_ids(identifiers);
        self.with_capability(Capability::DataHandler)
    }

    /// Handle files under these identifiers
    pub fn file(self, identifiers: &[&str]) -> Self {
        self.set_file_ids(identifiers);
        self.with_capability(Capability::FileHandler)
    }

    pub fn data_reply(mut self, reply: Reply) -> Self {
        self.data_reply = reply;
        self
    }

    pub fn file_reply(mut self, reply: Reply) -> Self {
        self.file_reply = reply;
        self
    }

    pub fn on_data(mut self, hook: DataHook) -> Self {
        self.data_hook = Some(hook);
        self
    }

    pub fn on_file(mut self, hook: FileHook) -> Self {
        self.file_hook = Some(hook);
        self
    }

    pub fn on_late(mut self, hook: LateHook) -> Self {
        self.late_hook = Some(hook);
        self.with_capability(Capability::LateActivation)
    }

    /// Run late activation without doing anything else
    pub fn late(self) -> Self {
        self.on_late(Box::new(|_| Ok(())))
    }

    pub fn min_version(mut self, version: u32) -> Self {
        self.min_version = version;
        self
    }

    /// `Accept` builds a settings view; `Decline` has none; `Fail`/`Panic` break
    pub fn settings(mut self, reply: Reply) -> Self {
        self.settings = Some(reply);
        self
    }

    /// Make `initialize` fail (`Fail`) or panic (`Panic`)
    pub fn init_reply(mut self, reply: Reply) -> Self {
        self.fail_init = Some(reply);
        self
    }

    pub fn events(mut self, events: &Events) -> Self {
        self.events = events.clone();
        self
    }

    pub fn set_data_ids(&self, identifiers: &[&str]) {
        *self.data_ids.lock().unwrap() = identifiers.iter().map(|s| s.to_string()).collect();
    }

    pub fn set_file_ids(&self, identifiers: &[&str]) {
        *self.file_ids.lock().unwrap() = identifiers.iter().map(|s| s.to_string()).collect();
    }

    /// The context handed to `initialize`
    pub fn ctx(&self) -> PluginContext {
        self.ctx
            .lock()
            .unwrap()
            .clone()
            .expect("plugin was not initialized")
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn answer(&self, reply: Reply, identifier: &str) -> Result<Option<ViewElement>, PluginError> {
        match reply {
            Reply::Accept => Ok(Some(ViewElement::new(self.name.clone()).with_line(identifier))),
            Reply::Decline => Ok(None),
            Reply::Fail => Err(PluginError::custom(format!("{} failed", self.name))),
            Reply::Panic => panic!("{} panicked", self.name),
        }
    }
}

impl Plugin for MockPlugin {
    fn unique_name(&self) -> &str {
        &self.name
    }

    fn min_interface_version(&self) -> u32 {
        self.min_version
    }

    fn capabilities(&self) -> CapabilitySet {
        self.capabilities.clone()
    }

    fn initialize(&self, ctx: PluginContext) -> Result<(), PluginError> {
        self.events.push(format!("init:{}", self.name));
        match self.fail_init {
            Some(Reply::Fail) => return Err(PluginError::custom("init refused")),
            Some(Reply::Panic) => panic!("init exploded"),
            _ => {}
        }
        *self.ctx.lock().unwrap() = Some(ctx);
        Ok(())
    }

    fn settings_view(&self) -> Result<Option<ViewElement>, PluginError> {
        match self.settings {
            None => Ok(None),
            Some(reply) => self.answer(reply, "settings"),
        }
    }

    fn as_data_handler(&self) -> Option<&dyn DataHandler> {
        Some(self)
    }

    fn as_file_handler(&self) -> Option<&dyn FileHandler> {
        Some(self)
    }

    fn as_late_activated(&self) -> Option<&dyn LateActivated> {
        Some(self)
    }
}

impl DataHandler for MockPlugin {
    fn data_identifiers(&self) -> Vec<String> {
        self.data_ids.lock().unwrap().clone()
    }

    fn try_view_data(&self, request: &DataRequest<'_>) -> Result<Option<ViewElement>, PluginError> {
        self.events.push(format!("data:{}", self.name));
        match &self.data_hook {
            Some(hook) => hook(&self.ctx(), request),
            None => self.answer(self.data_reply, request.identifier),
        }
    }
}

impl FileHandler for MockPlugin {
    fn file_identifiers(&self) -> Vec<String> {
        self.file_ids.lock().unwrap().clone()
    }

    fn try_view_file(&self, request: &FileRequest<'_>) -> Result<Option<ViewElement>, PluginError> {
        self.events.push(format!("file:{}", self.name));
        match &self.file_hook {
            Some(hook) => hook(&self.ctx(), request),
            None => self.answer(self.file_reply, request.identifier),
        }
    }
}

impl LateActivated for MockPlugin {
    fn activate_late(&self) -> Result<(), PluginError> {
        self.events.push(format!("late:{}", self.name));
        match &self.late_hook {
            Some(hook) => hook(&self.ctx()),
            None => Ok(()),
        }
    }
}

/// Erase mock types for `load_plugins_with`
pub fn builtins(plugins: Vec<Arc<MockPlugin>>) -> Vec<Arc<dyn Plugin>> {
    plugins
        .into_iter()
        .map(|p| p as Arc<dyn Plugin>)
        .collect()
}

/// Registry rooted in a temp dir, reporting to a collecting sink
pub struct Harness {
    pub dir: TempDir,
    pub registry: PluginRegistry,
    pub sink: Arc<CollectingSink>,
}

impl Harness {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        Self::with_config(RegistryConfig::rooted_at(dir.path()), dir)
    }

    pub fn with_config(config: RegistryConfig, dir: TempDir) -> Self {
        let sink = Arc::new(CollectingSink::new());
        let registry = PluginRegistry::with_sink(config, sink.clone());
        Self {
            dir,
            registry,
            sink,
        }
    }

    /// Register, panicking on failure
    pub fn add(&self, plugin: &Arc<MockPlugin>) -> rawview_plugin_api::PluginHandle {
        self.registry.register(plugin.clone()).unwrap()
    }
}

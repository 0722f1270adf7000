//! rawview-core - plugin registry, identifier routing and dispatch
//!
//! The [`PluginRegistry`] owns every plugin, loads plugin modules from the
//! plugin directory, and routes view requests to plugins by identifier.
//! Identifiers match by suffix, and plugins sharing an identifier are tried
//! in priority order until one produces a view.
//!
//! ```ignore
//! use rawview_core::{PluginRegistry, RegistryConfig};
//!
//! let registry = PluginRegistry::new(RegistryConfig::default());
//! registry.load_plugins();
//! let path = std::path::Path::new("sample.raw");
//! if let Some(view) = registry.dispatch_file("sample.raw", path) {
//!     println!("{}", view.label);
//! }
//! ```

pub mod config;
pub mod diagnostics;
pub mod discovery;
pub mod error;
mod isolate;
pub mod policy;
pub mod registry;
pub mod resolver;
pub mod router;

pub use config::{DEFAULT_MODULE_SUFFIXES, RegistryConfig};
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, TracingSink};
pub use discovery::{PluginModule, discover_modules};
pub use error::{ModuleError, PriorityError, RegistryError};
pub use policy::{VersionPolicy, VersionVerdict};
pub use registry::{LoadSummary, NO_SETTINGS, PluginRegistry};
pub use resolver::RouteKind;
pub use router::IdentifierRouter;

pub use rawview_plugin_api as api;

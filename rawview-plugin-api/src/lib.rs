//! rawview-plugin-api - Plugin API for the rawview file viewer
//!
//! rawview knows nothing about file formats. Everything it can show comes
//! from plugins, and plugins know nothing about each other: they are wired
//! together by the host through identifiers and capabilities.
//!
//! A plugin implements [`Plugin`] and declares the optional roles it
//! supports as a [`CapabilitySet`]. Roles with behaviour (handling data,
//! handling files, late activation) are reached through the `as_*`
//! accessors; roles that only consume host services (dispatching, loading,
//! enumerating, reprioritising) receive their handles through the
//! [`PluginContext`] passed to [`Plugin::initialize`].
//!
//! # Example
//!
//! ```ignore
//! use rawview_plugin_api::{
//!     Capability, CapabilitySet, DataHandler, DataRequest, Plugin, PluginError, ViewElement,
//!     export_plugins,
//! };
//!
//! #[derive(Default)]
//! pub struct LengthPlugin;
//!
//! impl Plugin for LengthPlugin {
//!     fn unique_name(&self) -> &str {
//!         "length"
//!     }
//!
//!     fn capabilities(&self) -> CapabilitySet {
//!         CapabilitySet::of(&[Capability::DataHandler])
//!     }
//!
//!     fn as_data_handler(&self) -> Option<&dyn DataHandler> {
//!         Some(self)
//!     }
//! }
//!
//! impl DataHandler for LengthPlugin {
//!     fn data_identifiers(&self) -> Vec<String> {
//!         vec![".bin".to_string()]
//!     }
//!
//!     fn try_view_data(&self, request: &DataRequest<'_>) -> Result<Option<ViewElement>, PluginError> {
//!         let payload = request.payload()?;
//!         Ok(Some(ViewElement::new("Length").with_line(payload.len().to_string())))
//!     }
//! }
//!
//! export_plugins!(LengthPlugin);
//! ```

pub mod capability;
pub mod context;
pub mod error;
pub mod types;

pub use capability::{Capability, CapabilitySet};
pub use context::{
    Enumerator, HostServices, IdentifierLister, IdentifierNotifier, Loader, PluginContext,
    PluginSettings, Prioritiser, SETTINGS_FILE, Unloader, ViewRequester,
};
pub use error::PluginError;
pub use types::*;

/// Interface version implemented by this crate.
///
/// Plugins report the minimum version they need through
/// [`Plugin::min_interface_version`].
pub const INTERFACE_VERSION: u32 = 0;

/// Symbol exported by plugin modules returning the number of plugin types.
pub const COUNT_SYMBOL: &[u8] = b"_rawview_plugin_count";

/// Symbol exported by plugin modules constructing the plugin at an index.
pub const CREATE_SYMBOL: &[u8] = b"_rawview_plugin_create";

/// The base plugin trait - every rawview plugin implements it.
///
/// All methods except the identity and capability declaration have
/// defaults, so plugins only override what they use.
pub trait Plugin: Send + Sync {
    /// Unique, filesystem-safe name. Used as the persistent directory name.
    fn unique_name(&self) -> &str;

    /// Minimum interface version this plugin needs
    fn min_interface_version(&self) -> u32 {
        0
    }

    /// Roles this plugin implements. Read once, at registration.
    fn capabilities(&self) -> CapabilitySet;

    /// Called once at registration with the host services this plugin
    /// declared capabilities for. Keep the context to use them later.
    fn initialize(&self, _ctx: PluginContext) -> Result<(), PluginError> {
        Ok(())
    }

    /// View describing the plugin and its settings.
    ///
    /// May build a new view on every call.
    fn settings_view(&self) -> Result<Option<ViewElement>, PluginError> {
        Ok(None)
    }

    /// The data handling role, if `Capability::DataHandler` is declared
    fn as_data_handler(&self) -> Option<&dyn DataHandler> {
        None
    }

    /// The file handling role, if `Capability::FileHandler` is declared
    fn as_file_handler(&self) -> Option<&dyn FileHandler> {
        None
    }

    /// The late activation role, if `Capability::LateActivation` is declared
    fn as_late_activated(&self) -> Option<&dyn LateActivated> {
        None
    }
}

/// Processes and shows information about data rather than files.
pub trait DataHandler: Send + Sync {
    /// Data identifiers this plugin handles.
    ///
    /// Each is compared against the end of the requested identifier.
    fn data_identifiers(&self) -> Vec<String>;

    /// Try to build a view for the data.
    ///
    /// `Ok(None)` declines and lets the next plugin try.
    fn try_view_data(&self, request: &DataRequest<'_>) -> Result<Option<ViewElement>, PluginError>;
}

/// Processes and shows information about files rather than data.
///
/// A file handler usually reads the file and relays its contents to data
/// handlers through a [`ViewRequester`].
pub trait FileHandler: Send + Sync {
    /// File identifiers this plugin handles.
    ///
    /// Each is compared against the end of the requested identifier, which
    /// is usually the lowercased path.
    fn file_identifiers(&self) -> Vec<String>;

    /// Try to build a view for the file. `Ok(None)` declines.
    fn try_view_file(&self, request: &FileRequest<'_>) -> Result<Option<ViewElement>, PluginError>;
}

/// Runs once after every plugin known at startup has been registered.
pub trait LateActivated: Send + Sync {
    fn activate_late(&self) -> Result<(), PluginError>;
}

#[doc(hidden)]
pub fn __create_plugin<T: Plugin + Default + 'static>() -> *mut Box<dyn Plugin> {
    let plugin: Box<dyn Plugin> = Box::new(T::default());
    Box::into_raw(Box::new(plugin))
}

/// Export plugin types for dynamic loading.
///
/// Generates the C ABI entry points the host resolves in a plugin module.
/// Every listed type is constructed through `Default`.
///
/// # Usage
///
/// ```ignore
/// rawview_plugin_api::export_plugins!(HexPlugin, TextPlugin);
/// ```
///
/// # Generated Functions
///
/// - `_rawview_plugin_count()`: Number of exported plugin types
/// - `_rawview_plugin_create(index)`: Creates the plugin at `index`, or null
#[macro_export]
macro_rules! export_plugins {
    ($($plugin_type:ty),+ $(,)?) => {
        const __RAWVIEW_PLUGIN_CONSTRUCTORS: &[fn() -> *mut Box<dyn $crate::Plugin>] =
            &[$($crate::__create_plugin::<$plugin_type>),+];

        #[unsafe(no_mangle)]
        pub extern "C" fn _rawview_plugin_count() -> usize {
            __RAWVIEW_PLUGIN_CONSTRUCTORS.len()
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn _rawview_plugin_create(index: usize) -> *mut Box<dyn $crate::Plugin> {
            match __RAWVIEW_PLUGIN_CONSTRUCTORS.get(index) {
                Some(create) => create(),
                None => std::ptr::null_mut(),
            }
        }
    };
}

//! rawview-basic - first-party rawview plugins
//!
//! - [`RawFilePlugin`]: reads any file and hands its bytes to data plugins
//! - [`HexDumpPlugin`]: hex dump of any data (lowest priority fallback)
//! - [`TextPlugin`]: UTF-8 text for common text extensions
//!
//! The crate builds as an `rlib`, so hosts can register the plugins as
//! built-ins, and as a `cdylib` that can be dropped into the plugin directory
//! (renamed to end in `.rawplugin.so`, `.rawplugin.dylib` or `.rawplugin.dll`).

use std::sync::Arc;

use rawview_plugin_api::Plugin;

pub mod hex_dump;
pub mod raw_file;
pub mod text;

pub use hex_dump::{HexDumpPlugin, HexDumpSettings};
pub use raw_file::RawFilePlugin;
pub use text::TextPlugin;

/// Fresh instances of every plugin in this crate, in registration order
pub fn builtin_plugins() -> Vec<Arc<dyn Plugin>> {
    vec![
        Arc::new(RawFilePlugin::default()) as Arc<dyn Plugin>,
        Arc::new(TextPlugin),
        Arc::new(HexDumpPlugin::default()),
    ]
}

rawview_plugin_api::export_plugins!(RawFilePlugin, TextPlugin, HexDumpPlugin);

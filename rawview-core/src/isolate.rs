//! Panic isolation around plugin calls

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use rawview_plugin_api::PluginError;

/// Run plugin code, turning both errors and panics into a message.
pub(crate) fn invoke<T>(f: impl FnOnce() -> Result<T, PluginError>) -> Result<T, String> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

/// Run infallible plugin code, turning a panic into a message.
pub(crate) fn invoke_infallible<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    invoke(|| Ok(f()))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

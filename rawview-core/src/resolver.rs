//! Dispatch resolver
//!
//! Walks the candidates for a request in priority order and returns the
//! first view a plugin produces. Candidates are snapshotted before the walk,
//! so handlers may call back into the registry, including dispatching
//! further requests.

use std::sync::Arc;

use rawview_plugin_api::{DataRequest, FileRequest, Plugin, PluginError, PluginId, ViewElement};

use crate::diagnostics::Diagnostic;
use crate::isolate;

/// A plugin selected for a request
#[derive(Clone)]
pub(crate) struct Candidate {
    pub id: PluginId,
    pub plugin: Arc<dyn Plugin>,
}

/// Which routing table a request goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Data,
    File,
}

impl RouteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Data => "data",
            RouteKind::File => "file",
        }
    }
}

/// Try each candidate in turn; the first `Some` wins.
///
/// Declines move on silently. Errors and panics are reported and the walk
/// continues with the next candidate.
pub(crate) fn resolve<F>(
    candidates: &[Candidate],
    identifier: &str,
    report: &dyn Fn(Diagnostic),
    attempt: F,
) -> Option<ViewElement>
where
    F: Fn(&dyn Plugin) -> Result<Option<ViewElement>, PluginError>,
{
    for candidate in candidates {
        let plugin = candidate.plugin.as_ref();
        match isolate::invoke(|| attempt(plugin)) {
            Ok(Some(view)) => {
                tracing::debug!(
                    plugin = %plugin.unique_name(),
                    id = %candidate.id,
                    identifier = %identifier,
                    "Plugin produced a view"
                );
                return Some(view);
            }
            Ok(None) => {
                tracing::trace!(plugin = %plugin.unique_name(), identifier = %identifier, "Plugin declined");
            }
            Err(detail) => report(Diagnostic::PluginInvocationFailed {
                plugin: plugin.unique_name().to_string(),
                detail,
            }),
        }
    }
    tracing::debug!(identifier = %identifier, tried = candidates.len(), "No plugin produced a view");
    None
}

/// Data attempt: plugins without a data role decline
pub(crate) fn try_data(
    plugin: &dyn Plugin,
    request: &DataRequest<'_>,
) -> Result<Option<ViewElement>, PluginError> {
    match plugin.as_data_handler() {
        Some(handler) => handler.try_view_data(request),
        None => Ok(None),
    }
}

/// File attempt: plugins without a file role decline
pub(crate) fn try_file(
    plugin: &dyn Plugin,
    request: &FileRequest<'_>,
) -> Result<Option<ViewElement>, PluginError> {
    match plugin.as_file_handler() {
        Some(handler) => handler.try_view_file(request),
        None => Ok(None),
    }
}

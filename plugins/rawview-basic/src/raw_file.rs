//! Raw file reader - turns any file into a data request

use std::sync::OnceLock;

use rawview_plugin_api::{
    Capability, CapabilitySet, DataRequest, FileHandler, FileRequest, Plugin, PluginContext,
    PluginError, ViewElement, ViewRequester,
};

/// Reads a file and asks data plugins to show its bytes.
///
/// Registered under the catch-all file identifier. The data request keeps
/// the file identifier, so data plugins route on the file's extension.
#[derive(Default)]
pub struct RawFilePlugin {
    requester: OnceLock<ViewRequester>,
}

impl RawFilePlugin {
    pub const NAME: &'static str = "raw-file";
}

impl Plugin for RawFilePlugin {
    fn unique_name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::of(&[Capability::FileHandler, Capability::DataViewRequester])
    }

    fn initialize(&self, ctx: PluginContext) -> Result<(), PluginError> {
        let requester = ctx
            .view_requester()
            .ok_or(PluginError::CapabilityMissing(Capability::DataViewRequester))?;
        // a second initialize keeps the first requester
        let _ = self.requester.set(requester);
        Ok(())
    }

    fn as_file_handler(&self) -> Option<&dyn FileHandler> {
        Some(self)
    }
}

impl FileHandler for RawFilePlugin {
    fn file_identifiers(&self) -> Vec<String> {
        vec![String::new()]
    }

    fn try_view_file(&self, request: &FileRequest<'_>) -> Result<Option<ViewElement>, PluginError> {
        let requester = self.requester.get().ok_or(PluginError::HostUnavailable)?;
        let bytes = std::fs::read(request.path)?;

        let data = DataRequest::new(request.identifier, &bytes).with_file_path(request.path);
        let Some(view) = requester.dispatch_data(&data)? else {
            tracing::debug!(path = %request.path.display(), "No data plugin accepted file contents");
            return Ok(None);
        };

        let label = request
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| request.path.display().to_string());
        Ok(Some(
            ViewElement::new(label)
                .with_line(format!("{} bytes", bytes.len()))
                .with_child(view),
        ))
    }
}

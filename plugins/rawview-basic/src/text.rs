//! Plain text view

use rawview_plugin_api::{
    Capability, CapabilitySet, DataHandler, DataRequest, Plugin, PluginError, ViewElement,
};

/// Identifiers of text formats shown as text
pub const TEXT_IDENTIFIERS: [&str; 6] = [".txt", ".md", ".log", ".csv", ".json", ".toml"];

/// Longest text shown, in lines
pub const MAX_LINES: usize = 10_000;

/// Shows UTF-8 text line by line. Declines anything that is not valid UTF-8.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextPlugin;

impl TextPlugin {
    pub const NAME: &'static str = "text";
}

impl Plugin for TextPlugin {
    fn unique_name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::of(&[Capability::DataHandler])
    }

    fn as_data_handler(&self) -> Option<&dyn DataHandler> {
        Some(self)
    }
}

impl DataHandler for TextPlugin {
    fn data_identifiers(&self) -> Vec<String> {
        TEXT_IDENTIFIERS.iter().map(|s| s.to_string()).collect()
    }

    fn try_view_data(&self, request: &DataRequest<'_>) -> Result<Option<ViewElement>, PluginError> {
        let Ok(text) = std::str::from_utf8(request.payload()?) else {
            return Ok(None);
        };

        let total = text.lines().count();
        let mut view = ViewElement::new("Text").with_lines(text.lines().take(MAX_LINES));
        if total > MAX_LINES {
            view = view.with_line(format!("... {} more lines", total - MAX_LINES));
        }
        Ok(Some(view))
    }
}

//! Hex dump - fallback view for any data

use std::path::PathBuf;
use std::sync::OnceLock;

use rawview_plugin_api::{
    Capability, CapabilitySet, DataHandler, DataRequest, Plugin, PluginContext, PluginError,
    PluginSettings, SETTINGS_FILE, ViewElement,
};

pub const DEFAULT_BYTES_PER_LINE: usize = 16;
pub const DEFAULT_MAX_BYTES: usize = 4096;
const MAX_BYTES_PER_LINE: usize = 64;

/// Dump layout read from `settings.toml` in the plugin's persistent directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexDumpSettings {
    pub bytes_per_line: usize,
    pub max_bytes: usize,
}

impl Default for HexDumpSettings {
    fn default() -> Self {
        Self {
            bytes_per_line: DEFAULT_BYTES_PER_LINE,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

impl HexDumpSettings {
    fn from_settings(settings: &PluginSettings) -> Self {
        let bytes_per_line = settings
            .get::<i64>("bytes_per_line")
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(DEFAULT_BYTES_PER_LINE)
            .clamp(1, MAX_BYTES_PER_LINE);
        let max_bytes = settings
            .get::<i64>("max_bytes")
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(DEFAULT_MAX_BYTES);
        Self {
            bytes_per_line,
            max_bytes,
        }
    }

    fn to_settings(&self) -> Result<PluginSettings, PluginError> {
        let mut settings = PluginSettings::new();
        settings.set("bytes_per_line", setting_value("bytes_per_line", self.bytes_per_line)?)?;
        settings.set("max_bytes", setting_value("max_bytes", self.max_bytes)?)?;
        Ok(settings)
    }
}

/// TOML integers are `i64`
fn setting_value(key: &str, value: usize) -> Result<i64, PluginError> {
    i64::try_from(value)
        .map_err(|_| PluginError::config(format!("{key} = {value} does not fit in a TOML integer")))
}

struct Loaded {
    settings: HexDumpSettings,
    path: Option<PathBuf>,
}

/// Offset / hex / ASCII dump of any data.
///
/// Registered under the catch-all data identifier, so it only runs when no
/// more specific plugin accepts the data.
#[derive(Default)]
pub struct HexDumpPlugin {
    loaded: OnceLock<Loaded>,
}

impl HexDumpPlugin {
    pub const NAME: &'static str = "hex-dump";

    /// Settings in effect (defaults before initialization)
    pub fn settings(&self) -> HexDumpSettings {
        self.loaded
            .get()
            .map(|l| l.settings.clone())
            .unwrap_or_default()
    }
}

impl Plugin for HexDumpPlugin {
    fn unique_name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::of(&[Capability::DataHandler, Capability::PersistentStorage])
    }

    fn initialize(&self, ctx: PluginContext) -> Result<(), PluginError> {
        let path = ctx.persistent_dir().map(|dir| dir.join(SETTINGS_FILE));
        let settings = match &path {
            Some(path) if path.exists() => {
                HexDumpSettings::from_settings(&PluginSettings::load(path)?)
            }
            Some(path) => {
                // write defaults so there is a file to edit
                let defaults = HexDumpSettings::default();
                defaults.to_settings()?.save(path)?;
                ctx.log_debug("Wrote default settings");
                defaults
            }
            None => HexDumpSettings::default(),
        };
        let _ = self.loaded.set(Loaded { settings, path });
        Ok(())
    }

    fn settings_view(&self) -> Result<Option<ViewElement>, PluginError> {
        let settings = self.settings();
        let mut view = ViewElement::new(Self::NAME)
            .with_line(format!("bytes_per_line = {}", settings.bytes_per_line))
            .with_line(format!("max_bytes = {}", settings.max_bytes));
        if let Some(path) = self.loaded.get().and_then(|l| l.path.as_ref()) {
            view = view.with_line(format!("file: {}", path.display()));
        }
        Ok(Some(view))
    }

    fn as_data_handler(&self) -> Option<&dyn DataHandler> {
        Some(self)
    }
}

impl DataHandler for HexDumpPlugin {
    fn data_identifiers(&self) -> Vec<String> {
        vec![String::new()]
    }

    fn try_view_data(&self, request: &DataRequest<'_>) -> Result<Option<ViewElement>, PluginError> {
        let payload = request.payload()?;
        let settings = self.settings();
        let shown = &payload[..payload.len().min(settings.max_bytes)];

        let mut view = ViewElement::new("Hex dump")
            .with_lines(dump_lines(shown, request.offset, settings.bytes_per_line));
        if shown.len() < payload.len() {
            view = view.with_line(format!("... {} more bytes", payload.len() - shown.len()));
        }
        Ok(Some(view))
    }
}

/// `offset  hex bytes  |ascii|` lines, offsets counted from `base`
pub fn dump_lines(data: &[u8], base: usize, bytes_per_line: usize) -> Vec<String> {
    let width = bytes_per_line.max(1);
    let hex_width = width * 3 - 1;
    data.chunks(width)
        .enumerate()
        .map(|(row, chunk)| {
            let hex: Vec<String> = chunk.iter().map(|b| hex::encode([*b])).collect();
            let ascii: String = chunk
                .iter()
                .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
                .collect();
            format!(
                "{:08x}  {:<hex_width$}  |{}|",
                base + row * width,
                hex.join(" "),
                ascii
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawview_plugin_api::PluginId;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> PluginContext {
        PluginContext::detached(
            PluginId::new(1),
            HexDumpPlugin::NAME.to_string(),
            HexDumpPlugin::default().capabilities(),
        )
        .with_persistent_dir(dir.path().to_path_buf())
    }

    #[test]
    fn test_dump_lines_layout() {
        let lines = dump_lines(b"ABC\x00\x01", 0, 4);
        assert_eq!(
            lines,
            vec!["00000000  41 42 43 00  |ABC.|", "00000004  01           |.|"]
        );
    }

    #[test]
    fn test_dump_lines_offset_base() {
        let lines = dump_lines(b"hi", 0x20, 16);
        assert!(lines[0].starts_with("00000020  68 69"));
    }

    #[test]
    fn test_initialize_writes_default_settings() {
        let dir = TempDir::new().unwrap();
        let plugin = HexDumpPlugin::default();
        plugin.initialize(context(&dir)).unwrap();

        let saved = PluginSettings::load(&dir.path().join(SETTINGS_FILE)).unwrap();
        assert_eq!(saved.get::<i64>("bytes_per_line"), Some(16));
        assert_eq!(plugin.settings(), HexDumpSettings::default());
    }

    #[test]
    fn test_initialize_reads_existing_settings() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            "bytes_per_line = 8\nmax_bytes = 4\n",
        )
        .unwrap();
        let plugin = HexDumpPlugin::default();
        plugin.initialize(context(&dir)).unwrap();

        let data = [0u8; 10];
        let view = plugin
            .try_view_data(&DataRequest::new("x", &data))
            .unwrap()
            .unwrap();
        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.lines[1], "... 6 more bytes");
    }

    #[test]
    fn test_out_of_range_settings_are_clamped() {
        let mut settings = PluginSettings::new();
        settings.set("bytes_per_line", 0i64).unwrap();
        settings.set("max_bytes", -5i64).unwrap();
        let parsed = HexDumpSettings::from_settings(&settings);
        assert_eq!(parsed.bytes_per_line, 1);
        assert_eq!(parsed.max_bytes, DEFAULT_MAX_BYTES);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_oversized_setting_is_a_config_error() {
        let settings = HexDumpSettings {
            bytes_per_line: DEFAULT_BYTES_PER_LINE,
            max_bytes: usize::MAX,
        };
        let err = settings.to_settings().unwrap_err();
        assert!(matches!(err, PluginError::Config(ref msg) if msg.contains("max_bytes")));
    }

    #[test]
    fn test_settings_round_trip_through_toml_values() {
        let settings = HexDumpSettings {
            bytes_per_line: 8,
            max_bytes: 512,
        };
        let parsed = HexDumpSettings::from_settings(&settings.to_settings().unwrap());
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_settings_view_lists_values() {
        let plugin = HexDumpPlugin::default();
        let view = plugin.settings_view().unwrap().unwrap();
        assert_eq!(view.label, "hex-dump");
        assert!(view.lines.contains(&"bytes_per_line = 16".to_string()));
    }

    #[test]
    fn test_bad_range_is_an_error() {
        let plugin = HexDumpPlugin::default();
        let data = [0u8; 4];
        let request = DataRequest::new("x", &data).with_range(3, 4);
        assert!(plugin.try_view_data(&request).is_err());
    }
}

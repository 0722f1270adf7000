//! Routing table listing

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use rawview_core::{PluginRegistry, RouteKind};

use crate::host::Host;

/// Run identifiers command
pub fn run(host: &Host) -> Result<()> {
    let registry = &host.registry;
    if registry.data_identifiers().is_empty() && registry.file_identifiers().is_empty() {
        println!("No identifiers registered");
        return Ok(());
    }
    println!("{}", routing_table(registry));
    Ok(())
}

fn routing_table(registry: &PluginRegistry) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Kind").fg(Color::Cyan),
        Cell::new("Identifier").fg(Color::Cyan),
        Cell::new("Plugins (by priority)").fg(Color::Cyan),
    ]);

    for kind in [RouteKind::Data, RouteKind::File] {
        let identifiers = match kind {
            RouteKind::Data => registry.data_identifiers(),
            RouteKind::File => registry.file_identifiers(),
        };
        for identifier in identifiers {
            let plugins = match kind {
                RouteKind::Data => registry.data_plugins_at(&identifier),
                RouteKind::File => registry.file_plugins_at(&identifier),
            };
            let names: Vec<&str> = plugins.iter().map(|p| p.unique_name()).collect();
            table.add_row(vec![
                Cell::new(kind.as_str()),
                Cell::new(display_identifier(&identifier)),
                Cell::new(names.join(", ")),
            ]);
        }
    }
    table
}

/// The catch-all identifier is empty, which reads badly in a table
fn display_identifier(identifier: &str) -> &str {
    if identifier.is_empty() { "(any)" } else { identifier }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawview_core::RegistryConfig;
    use tempfile::TempDir;

    #[test]
    fn test_table_shows_builtin_routes() {
        let dir = TempDir::new().unwrap();
        let registry = PluginRegistry::new(RegistryConfig::rooted_at(dir.path()));
        registry.load_plugins_with(rawview_basic::builtin_plugins());

        let rendered = routing_table(&registry).to_string();
        assert!(rendered.contains(".txt"));
        assert!(rendered.contains("(any)"));
        assert!(rendered.contains("hex-dump"));
        assert!(rendered.contains("raw-file"));
    }

    #[test]
    fn test_catch_all_is_named() {
        assert_eq!(display_identifier(""), "(any)");
        assert_eq!(display_identifier(".md"), ".md");
    }
}

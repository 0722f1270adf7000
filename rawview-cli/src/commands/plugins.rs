//! Registered plugin commands

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use rawview_plugin_api::PluginHandle;

use crate::host::Host;
use crate::render::render_tree;

/// Plugin arguments
#[derive(Args)]
pub struct PluginsArgs {
    #[command(subcommand)]
    pub command: PluginsCommands,
}

/// Plugin subcommands
#[derive(Subcommand)]
pub enum PluginsCommands {
    /// List registered plugins
    List,
    /// Show a plugin's settings
    Settings {
        /// Plugin unique name
        name: String,
    },
}

/// Run plugins command
pub fn run(host: &Host, args: PluginsArgs) -> Result<()> {
    match args.command {
        PluginsCommands::List => list_plugins(host),
        PluginsCommands::Settings { name } => show_settings(host, &name),
    }
}

fn list_plugins(host: &Host) -> Result<()> {
    let plugins = host.registry.list_plugins();

    if plugins.is_empty() {
        println!("No plugins registered");
        println!();
        println!(
            "Plugin directory: {}",
            host.registry.config().plugin_dir.display()
        );
        return Ok(());
    }

    println!("{}", plugin_table(&plugins));
    Ok(())
}

fn plugin_table(plugins: &[PluginHandle]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Id").fg(Color::Cyan),
        Cell::new("Min version").fg(Color::Cyan),
        Cell::new("Capabilities").fg(Color::Cyan),
    ]);

    for handle in plugins {
        table.add_row(vec![
            Cell::new(handle.unique_name()),
            Cell::new(handle.id().get()),
            Cell::new(handle.plugin().min_interface_version()),
            Cell::new(handle.plugin().capabilities()),
        ]);
    }
    table
}

fn show_settings(host: &Host, name: &str) -> Result<()> {
    let Some(handle) = host.registry.find(name) else {
        bail!("No plugin named '{}'", name);
    };
    let Some(view) = host.registry.settings_view(handle.id()) else {
        bail!("Plugin '{}' was unloaded", name);
    };
    print!("{}", render_tree(&view));
    Ok(())
}

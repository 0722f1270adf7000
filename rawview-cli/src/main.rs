use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod host;
mod render;

use config::{ConfigLoader, RawPluginsConfig, RawRawviewConfig};
use host::Host;

#[derive(Parser)]
#[command(name = "rawview")]
#[command(about = "Inspect raw files through viewer plugins")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory searched for plugin modules
    #[arg(long, global = true, value_name = "DIR")]
    plugin_dir: Option<PathBuf>,

    /// Do not register the plugins shipped with rawview
    #[arg(long, global = true)]
    no_builtin: bool,
}

impl Cli {
    /// Flags as the last configuration layer; unset flags leave the files alone
    fn overrides(&self) -> RawRawviewConfig {
        RawRawviewConfig {
            plugins: RawPluginsConfig {
                dir: self.plugin_dir.clone(),
                builtin: self.no_builtin.then_some(false),
                ..Default::default()
            },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Open files and print what the plugins make of them
    Open(commands::open::OpenArgs),
    /// Inspect registered plugins
    Plugins(commands::plugins::PluginsArgs),
    /// Show data and file identifiers with their plugin order
    Identifiers,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = ConfigLoader::load(cli.overrides())?;
    let host = Host::start(&config);

    let result = match cli.command {
        Commands::Open(args) => commands::open::run(&host, args),
        Commands::Plugins(args) => commands::plugins::run(&host, args),
        Commands::Identifiers => commands::identifiers::run(&host),
    };

    host.report_diagnostics();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "rawview",
            "open",
            "a.raw",
            "b.txt",
            "--json",
            "--no-builtin",
            "--plugin-dir",
            "/opt/plugins",
        ])
        .unwrap();

        let Commands::Open(args) = &cli.command else {
            panic!("expected open");
        };
        assert_eq!(args.files.len(), 2);
        assert!(args.json);

        let overrides = cli.overrides();
        assert_eq!(overrides.plugins.builtin, Some(false));
        assert_eq!(overrides.plugins.dir, Some(PathBuf::from("/opt/plugins")));
    }

    #[test]
    fn test_unset_flags_do_not_override() {
        let cli = Cli::try_parse_from(["rawview", "identifiers"]).unwrap();
        let overrides = cli.overrides();
        assert!(overrides.plugins.builtin.is_none());
        assert!(overrides.plugins.dir.is_none());
    }

    #[test]
    fn test_open_needs_a_file() {
        assert!(Cli::try_parse_from(["rawview", "open"]).is_err());
    }

    #[test]
    fn test_plugins_settings_takes_name() {
        let cli = Cli::try_parse_from(["rawview", "plugins", "settings", "hex-dump"]).unwrap();
        let Commands::Plugins(args) = cli.command else {
            panic!("expected plugins");
        };
        assert!(matches!(
            args.command,
            commands::plugins::PluginsCommands::Settings { name } if name == "hex-dump"
        ));
    }
}

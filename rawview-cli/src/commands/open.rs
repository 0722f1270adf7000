//! Open files through the registered plugins

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use rawview_plugin_api::ViewElement;
use serde::Serialize;

use crate::host::Host;
use crate::render::render_tree;

/// Arguments for opening files
#[derive(Args)]
pub struct OpenArgs {
    /// Files to open
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Print views as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct OpenedFile {
    path: String,
    view: Option<ViewElement>,
}

/// Run open command
pub fn run(host: &Host, args: OpenArgs) -> Result<()> {
    let opened: Vec<OpenedFile> = args
        .files
        .iter()
        .map(|path| OpenedFile {
            path: path.display().to_string(),
            view: host
                .registry
                .dispatch_file(&request_identifier(path), path),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&opened)?);
        return Ok(());
    }

    for file in opened {
        match file.view {
            Some(view) => print!("{}", render_tree(&view)),
            None => println!("no plugin could display {}", file.path),
        }
    }
    Ok(())
}

/// Identifier a file is requested under: its whole path, lowercased
pub fn request_identifier(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

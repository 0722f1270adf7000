//! Runs the `rawview` binary against an isolated install directory

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn rawview(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rawview"))
        .args(args)
        .env("RAWVIEW_HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("RAWVIEW_PROJECT_CONFIG_DIR", home.join("project"))
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run rawview")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn open_prints_text_view() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("Notes.TXT");
    std::fs::write(&file, "first\nsecond\n").unwrap();

    let output = rawview(home.path(), &["open", file.to_str().unwrap()]);

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("Notes.TXT\n  13 bytes\n  Text\n"));
    assert!(out.contains("    first\n    second\n"));
}

#[test]
fn open_as_json() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("blob.bin");
    std::fs::write(&file, [0u8, 1, 2]).unwrap();

    let output = rawview(home.path(), &["open", "--json", file.to_str().unwrap()]);

    assert!(output.status.success(), "{}", stderr(&output));
    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed[0]["view"]["label"], "blob.bin");
    assert_eq!(parsed[0]["view"]["children"][0]["label"], "Hex dump");
}

#[test]
fn open_without_builtins_displays_nothing() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("a.raw");
    std::fs::write(&file, b"x").unwrap();

    let output = rawview(home.path(), &["--no-builtin", "open", file.to_str().unwrap()]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("no plugin could display"));
}

#[test]
fn missing_file_reports_diagnostic_on_stderr() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("gone.raw");

    let output = rawview(home.path(), &["open", file.to_str().unwrap()]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("no plugin could display"));
    assert!(stderr(&output).contains("warning: raw-file failed"));
}

#[test]
fn plugins_list_shows_builtins() {
    let home = TempDir::new().unwrap();
    let output = rawview(home.path(), &["plugins", "list"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    for name in ["raw-file", "text", "hex-dump"] {
        assert!(out.contains(name), "missing {name} in:\n{out}");
    }
}

#[test]
fn plugins_settings_for_unknown_name_fails() {
    let home = TempDir::new().unwrap();
    let output = rawview(home.path(), &["plugins", "settings", "nope"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("No plugin named 'nope'"));
}

#[test]
fn plugins_settings_shows_placeholder() {
    let home = TempDir::new().unwrap();
    let output = rawview(home.path(), &["plugins", "settings", "text"]);

    assert!(output.status.success());
    assert_eq!(stdout(&output), "text\n  No settings!\n");
}

#[test]
fn project_config_can_disable_builtins() {
    let home = TempDir::new().unwrap();
    let project = home.path().join("project");
    std::fs::create_dir_all(&project).unwrap();
    std::fs::write(project.join("config.toml"), "[plugins]\nbuiltin = false\n").unwrap();

    let output = rawview(home.path(), &["identifiers"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("No identifiers registered"));
}

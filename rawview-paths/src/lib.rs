//! Filesystem locations for rawview.
//!
//! Plugins and their persistent storage live next to the installed binary,
//! so a rawview install can be copied around as a single directory. User
//! configuration follows XDG conventions like other command-line tools.

use std::path::PathBuf;

/// Environment variable that overrides the install directory.
pub const HOME_ENV: &str = "RAWVIEW_HOME";

/// Name of the plugin directory under the install directory.
pub const PLUGIN_DIR_NAME: &str = "plugins";

/// Name of the persistent plugin storage root under the install directory.
pub const PERSISTENT_DIR_NAME: &str = "persistent-plugins";

/// Get the rawview install directory.
///
/// Returns `$RAWVIEW_HOME` if set, otherwise the directory containing the
/// running executable. Falls back to the current directory when neither is
/// available.
pub fn install_dir() -> PathBuf {
    if let Ok(home) = std::env::var(HOME_ENV) {
        return PathBuf::from(home);
    }

    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the directory searched for plugin modules.
///
/// # Examples
///
/// ```
/// use rawview_paths::plugin_dir;
///
/// let plugins = plugin_dir();
/// assert!(plugins.ends_with("plugins"));
/// ```
pub fn plugin_dir() -> PathBuf {
    install_dir().join(PLUGIN_DIR_NAME)
}

/// Get the root under which each persistent plugin gets its own directory.
pub fn persistent_dir() -> PathBuf {
    install_dir().join(PERSISTENT_DIR_NAME)
}

/// Get the rawview config directory.
///
/// Returns `$XDG_CONFIG_HOME/rawview` if set, otherwise `~/.config/rawview`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("rawview")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config/rawview")
    } else {
        PathBuf::from(".config/rawview")
    }
}

//! Plugin module discovery and loading
//!
//! Plugin modules are shared libraries built with
//! [`export_plugins!`](rawview_plugin_api::export_plugins). They are found
//! by file name suffix anywhere below the plugin directory.

use std::io;
use std::mem::ManuallyDrop;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::{Library, Symbol};
use rawview_plugin_api::{COUNT_SYMBOL, CREATE_SYMBOL, Plugin};

use crate::error::ModuleError;

type CountFn = unsafe extern "C" fn() -> usize;
type CreateFn = unsafe extern "C" fn(usize) -> *mut Box<dyn Plugin>;

/// Find plugin modules below `dir`, sorted by path.
///
/// A missing directory yields no modules. Unreadable subdirectories are
/// logged and skipped; only a failure to read `dir` itself is an error.
/// Symlinked directories are not followed.
pub fn discover_modules(dir: &Path, suffixes: &[String]) -> io::Result<Vec<PathBuf>> {
    let suffixes: Vec<String> = suffixes.iter().map(|s| s.to_lowercase()).collect();
    let mut found = Vec::new();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "Plugin directory does not exist");
            return Ok(found);
        }
        Err(e) => return Err(e),
    };
    walk(entries, &suffixes, &mut found);

    found.sort_by(|a, b| a.to_string_lossy().cmp(&b.to_string_lossy()));
    Ok(found)
}

fn walk(entries: std::fs::ReadDir, suffixes: &[String], found: &mut Vec<PathBuf>) {
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

        if is_dir {
            match std::fs::read_dir(&path) {
                Ok(children) => walk(children, suffixes, found),
                Err(e) => {
                    tracing::warn!(dir = %path.display(), error = %e, "Skipping unreadable directory");
                }
            }
        } else if path.is_file() && has_module_suffix(&path, suffixes) {
            found.push(path);
        }
    }
}

/// Whether the file name ends with one of the (lowercase) suffixes
fn has_module_suffix(path: &Path, suffixes: &[String]) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    let name = name.to_string_lossy().to_lowercase();
    suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
}

/// A loaded plugin module.
///
/// The library is never unloaded: plugin instances created from it may
/// outlive the registry that loaded it.
pub struct PluginModule {
    path: PathBuf,
    _library: ManuallyDrop<Library>,
}

impl PluginModule {
    /// Load a module and instantiate every plugin it exports, in export order.
    ///
    /// # Safety
    ///
    /// Loading a library runs its initialisers. The module must have been
    /// built against this version of `rawview-plugin-api` with the same
    /// compiler, since plugins cross the boundary as Rust trait objects.
    pub unsafe fn load(path: &Path) -> Result<(Self, Vec<Arc<dyn Plugin>>), ModuleError> {
        let library = unsafe { Library::new(path)? };

        let plugins = {
            let count: Symbol<CountFn> = unsafe { library.get(COUNT_SYMBOL)? };
            let create: Symbol<CreateFn> = unsafe { library.get(CREATE_SYMBOL)? };

            let total = unsafe { count() };
            let mut plugins: Vec<Arc<dyn Plugin>> = Vec::with_capacity(total);
            for index in 0..total {
                let raw = unsafe { create(index) };
                if raw.is_null() {
                    return Err(ModuleError::NullInstance { index });
                }
                let boxed: Box<Box<dyn Plugin>> = unsafe { Box::from_raw(raw) };
                plugins.push(Arc::from(*boxed));
            }
            plugins
        };

        tracing::debug!(module = %path.display(), plugins = plugins.len(), "Loaded plugin module");

        Ok((
            Self {
                path: path.to_path_buf(),
                _library: ManuallyDrop::new(library),
            },
            plugins,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for PluginModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginModule")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn suffixes() -> Vec<String> {
        crate::config::DEFAULT_MODULE_SUFFIXES
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_missing_dir_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let found = discover_modules(&dir.path().join("absent"), &suffixes()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_discovery_is_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("b/nested")).unwrap();
        std::fs::create_dir_all(dir.path().join("a")).unwrap();
        std::fs::write(dir.path().join("b/nested/z.rawplugin.so"), b"").unwrap();
        std::fs::write(dir.path().join("a/y.rawplugin.dll"), b"").unwrap();
        std::fs::write(dir.path().join("c.rawplugin.dylib"), b"").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"").unwrap();
        std::fs::write(dir.path().join("plain.so"), b"").unwrap();

        let found = discover_modules(dir.path(), &suffixes()).unwrap();
        let relative: Vec<PathBuf> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("a/y.rawplugin.dll"),
                PathBuf::from("b/nested/z.rawplugin.so"),
                PathBuf::from("c.rawplugin.dylib"),
            ]
        );
    }

    #[test]
    fn test_suffix_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Upper.RAWPLUGIN.SO"), b"").unwrap();
        let found = discover_modules(dir.path(), &suffixes()).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_load_rejects_non_library() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.rawplugin.so");
        std::fs::write(&path, b"definitely not a shared object").unwrap();

        let result = unsafe { PluginModule::load(&path) };
        assert!(matches!(result, Err(ModuleError::Library(_))));
    }
}

//! Request, view and identity types shared between host and plugins

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Plugin;
use crate::error::PluginError;

/// Presentation tree produced by a plugin.
///
/// The host renders it; the registry never looks inside.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewElement {
    /// Heading shown for this node
    pub label: String,
    /// Text lines shown under the heading
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<String>,
    /// Nested nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ViewElement>,
}

impl ViewElement {
    /// Create a node with a heading and no content
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            lines: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: append a text line
    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    /// Builder: append several text lines
    pub fn with_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
        self
    }

    /// Builder: append a child node
    pub fn with_child(mut self, child: ViewElement) -> Self {
        self.children.push(child);
        self
    }
}

/// A request to display a slice of in-memory data.
#[derive(Debug, Clone, Copy)]
pub struct DataRequest<'a> {
    /// Data identifier used for routing (matched by suffix)
    pub identifier: &'a str,
    /// Path of the file the data came from, if any.
    ///
    /// Data handlers should only use this to find referenced files.
    pub file_path: Option<&'a Path>,
    /// Buffer holding the data
    pub data: &'a [u8],
    /// Start of the data within `data`
    pub offset: usize,
    /// Number of bytes to process
    pub length: usize,
}

impl<'a> DataRequest<'a> {
    /// Request covering the whole buffer
    pub fn new(identifier: &'a str, data: &'a [u8]) -> Self {
        Self {
            identifier,
            file_path: None,
            data,
            offset: 0,
            length: data.len(),
        }
    }

    /// Builder: restrict the request to `offset..offset + length`
    pub fn with_range(mut self, offset: usize, length: usize) -> Self {
        self.offset = offset;
        self.length = length;
        self
    }

    /// Builder: attach the originating file path
    pub fn with_file_path(mut self, path: &'a Path) -> Self {
        self.file_path = Some(path);
        self
    }

    /// The bytes this request covers.
    ///
    /// Fails when `offset`/`length` reach past the end of the buffer.
    pub fn payload(&self) -> Result<&'a [u8], PluginError> {
        let out_of_range = || PluginError::OutOfRange {
            offset: self.offset,
            length: self.length,
            available: self.data.len(),
        };
        let end = self.offset.checked_add(self.length).ok_or_else(out_of_range)?;
        self.data.get(self.offset..end).ok_or_else(out_of_range)
    }
}

/// A request to display a file on disk.
#[derive(Debug, Clone, Copy)]
pub struct FileRequest<'a> {
    /// File identifier used for routing (usually the lowercased path)
    pub identifier: &'a str,
    /// Path to the file
    pub path: &'a Path,
}

impl<'a> FileRequest<'a> {
    pub fn new(identifier: &'a str, path: &'a Path) -> Self {
        Self { identifier, path }
    }
}

/// Registry-assigned identity of a registered plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PluginId(u64);

impl PluginId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered plugin together with its identity.
#[derive(Clone)]
pub struct PluginHandle {
    id: PluginId,
    plugin: Arc<dyn Plugin>,
}

impl PluginHandle {
    pub fn new(id: PluginId, plugin: Arc<dyn Plugin>) -> Self {
        Self { id, plugin }
    }

    pub fn id(&self) -> PluginId {
        self.id
    }

    pub fn unique_name(&self) -> &str {
        self.plugin.unique_name()
    }

    /// The plugin instance
    pub fn plugin(&self) -> &Arc<dyn Plugin> {
        &self.plugin
    }
}

impl fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHandle")
            .field("id", &self.id)
            .field("unique_name", &self.plugin.unique_name())
            .finish()
    }
}

impl PartialEq for PluginHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PluginHandle {}

//! Capability declarations
//!
//! A plugin declares the roles it implements once, through
//! [`Plugin::capabilities`](crate::Plugin::capabilities). The host reads the
//! set exactly once at registration and wires services accordingly.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One optional role a plugin may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Handles data requests routed by data identifier
    DataHandler,
    /// Handles file requests routed by file identifier
    FileHandler,
    /// Receives a private directory for persistent state
    PersistentStorage,
    /// May change its data identifier set at runtime
    DynamicDataIdentifiers,
    /// May change its file identifier set at runtime
    DynamicFileIdentifiers,
    /// May ask the host to display data through other plugins
    DataViewRequester,
    /// May ask the host to display files through other plugins
    FileViewRequester,
    /// May register further plugins
    PluginLoader,
    /// May unload plugins
    PluginUnloader,
    /// May enumerate registered plugins
    PluginEnumerator,
    /// May enumerate routed identifiers
    IdentifierEnumerator,
    /// May reorder the plugins registered at an identifier
    PriorityChanger,
    /// Runs a hook after every plugin has been registered
    LateActivation,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Capability; 13] = [
        Capability::DataHandler,
        Capability::FileHandler,
        Capability::PersistentStorage,
        Capability::DynamicDataIdentifiers,
        Capability::DynamicFileIdentifiers,
        Capability::DataViewRequester,
        Capability::FileViewRequester,
        Capability::PluginLoader,
        Capability::PluginUnloader,
        Capability::PluginEnumerator,
        Capability::IdentifierEnumerator,
        Capability::PriorityChanger,
        Capability::LateActivation,
    ];

    /// Stable kebab-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::DataHandler => "data-handler",
            Capability::FileHandler => "file-handler",
            Capability::PersistentStorage => "persistent-storage",
            Capability::DynamicDataIdentifiers => "dynamic-data-identifiers",
            Capability::DynamicFileIdentifiers => "dynamic-file-identifiers",
            Capability::DataViewRequester => "data-view-requester",
            Capability::FileViewRequester => "file-view-requester",
            Capability::PluginLoader => "plugin-loader",
            Capability::PluginUnloader => "plugin-unloader",
            Capability::PluginEnumerator => "plugin-enumerator",
            Capability::IdentifierEnumerator => "identifier-enumerator",
            Capability::PriorityChanger => "priority-changer",
            Capability::LateActivation => "late-activation",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable set of capabilities declared by one plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    inner: BTreeSet<Capability>,
}

impl CapabilitySet {
    /// Empty set (a plugin with no optional roles)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from a list of capabilities; duplicates collapse.
    pub fn of(capabilities: &[Capability]) -> Self {
        Self {
            inner: capabilities.iter().copied().collect(),
        }
    }

    /// Check whether a capability is declared
    pub fn contains(&self, capability: Capability) -> bool {
        self.inner.contains(&capability)
    }

    /// Iterate declared capabilities in a stable order
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.inner.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.inner.iter().map(Capability::as_str).collect();
        f.write_str(&names.join(", "))
    }
}

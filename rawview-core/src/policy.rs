//! Interface version policy

use serde::{Deserialize, Serialize};

/// What to do with a plugin that needs a newer interface than this host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionPolicy {
    /// Report the mismatch and register the plugin anyway
    #[default]
    WarnAndLoad,
    /// Report the mismatch and refuse the plugin
    Reject,
}

/// Outcome of [`VersionPolicy::evaluate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionVerdict {
    Compatible,
    LoadWithWarning,
    Refuse,
}

impl VersionPolicy {
    /// Decide on a plugin requiring `required` against a host supporting `supported`.
    pub fn evaluate(self, required: u32, supported: u32) -> VersionVerdict {
        if required <= supported {
            return VersionVerdict::Compatible;
        }
        match self {
            VersionPolicy::WarnAndLoad => VersionVerdict::LoadWithWarning,
            VersionPolicy::Reject => VersionVerdict::Refuse,
        }
    }
}

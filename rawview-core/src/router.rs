//! Identifier router
//!
//! Maps identifiers to the plugins registered under them, in priority
//! order. A request matches every key that is a suffix of it; the empty key
//! therefore matches everything and acts as the catch-all.

use std::collections::{BTreeMap, HashSet};

use rawview_plugin_api::PluginId;

use crate::error::PriorityError;

/// Priority-ordered plugin lists keyed by identifier.
///
/// A plugin appears at most once per key and no key maps to an empty list.
#[derive(Debug, Default, Clone)]
pub struct IdentifierRouter {
    routes: BTreeMap<String, Vec<PluginId>>,
}

impl IdentifierRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `plugin` at the lowest priority under each identifier.
    ///
    /// Duplicate identifiers are ignored, as are identifiers the plugin is
    /// already registered under.
    pub fn insert<I, S>(&mut self, plugin: PluginId, identifiers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for identifier in identifiers {
            let entry = self.routes.entry(identifier.into()).or_default();
            if !entry.contains(&plugin) {
                entry.push(plugin);
            }
        }
    }

    /// Remove `plugin` from every identifier. Returns whether it was routed at all.
    pub fn remove_plugin(&mut self, plugin: PluginId) -> bool {
        let mut removed = false;
        self.routes.retain(|_, plugins| {
            let before = plugins.len();
            plugins.retain(|p| *p != plugin);
            removed |= plugins.len() != before;
            !plugins.is_empty()
        });
        removed
    }

    /// Replace the identifiers of `plugin`; it drops to the lowest priority everywhere.
    pub fn reassign<I, S>(&mut self, plugin: PluginId, identifiers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.remove_plugin(plugin);
        self.insert(plugin, identifiers);
    }

    /// Plugins to try for `request`, in order.
    ///
    /// Longer (more specific) matching keys come first, each key's plugins in
    /// priority order. A plugin reachable through several keys is listed once
    /// per key.
    pub fn candidates(&self, request: &str) -> Vec<PluginId> {
        let mut matching: Vec<(&String, &Vec<PluginId>)> = self
            .routes
            .iter()
            .filter(|(key, _)| request.ends_with(key.as_str()))
            .collect();
        // stable: equal lengths keep key order
        matching.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        matching
            .into_iter()
            .flat_map(|(_, plugins)| plugins.iter().copied())
            .collect()
    }

    /// Plugins registered under exactly `identifier`, highest priority first
    pub fn plugins_at(&self, identifier: &str) -> &[PluginId] {
        self.routes
            .get(identifier)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every identifier with at least one plugin, sorted
    pub fn identifiers(&self) -> Vec<String> {
        self.routes.keys().cloned().collect()
    }

    /// Replace the priority order under `identifier`.
    ///
    /// `order` must be a permutation of the current plugins. Otherwise
    /// nothing changes.
    pub fn reorder(&mut self, identifier: &str, order: &[PluginId]) -> Result<(), PriorityError> {
        let current = self
            .routes
            .get_mut(identifier)
            .ok_or_else(|| PriorityError::UnknownIdentifier {
                identifier: identifier.to_string(),
            })?;

        if order.len() != current.len() {
            return Err(PriorityError::LengthMismatch {
                identifier: identifier.to_string(),
                expected: current.len(),
                supplied: order.len(),
            });
        }

        let mut seen = HashSet::with_capacity(order.len());
        for plugin in order {
            if !seen.insert(*plugin) {
                return Err(PriorityError::DuplicatePlugin {
                    identifier: identifier.to_string(),
                    plugin: *plugin,
                });
            }
            if !current.contains(plugin) {
                return Err(PriorityError::ForeignPlugin {
                    identifier: identifier.to_string(),
                    plugin: *plugin,
                });
            }
        }

        current.clear();
        current.extend_from_slice(order);
        Ok(())
    }

    /// Whether `plugin` is routed under any identifier
    pub fn contains(&self, plugin: PluginId) -> bool {
        self.routes.values().any(|plugins| plugins.contains(&plugin))
    }

    /// Number of identifiers
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

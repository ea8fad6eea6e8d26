//! Plugin registry
//!
//! Plugins are stored by id and indexed per callback kind. The index holds
//! only enabled plugins, in registration order, and is rebuilt from scratch
//! after every mutation so the logging path never scans disabled plugins or
//! plugins that do not declare the stage being run.
//!
//! Every `run_*` method copies the relevant index entry under the read lock
//! and releases the lock before invoking any callback. A callback may
//! therefore add, toggle or remove plugins; the change applies from the next
//! emission onwards.

use super::error::{LogLayerError, Result};
use super::log_context::{merge_fields, Fields};
use super::log_level::LogLevel;
use super::plugin::{
    BeforeDataOutParams, BeforeMessageOutParams, Plugin, PluginCallbackType, ShouldSendParams,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rand::Rng;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

struct RegisteredPlugin {
    plugin: Arc<Plugin>,
    disabled: bool,
    sequence: u64,
    registered_at: DateTime<Utc>,
}

#[derive(Default)]
struct PluginStore {
    plugins: HashMap<String, RegisteredPlugin>,
    index: HashMap<PluginCallbackType, Vec<Arc<Plugin>>>,
    next_sequence: u64,
}

impl PluginStore {
    fn reindex(&mut self) {
        let mut ordered: Vec<&RegisteredPlugin> = self.plugins.values().collect();
        ordered.sort_by_key(|entry| entry.sequence);

        let mut index = HashMap::new();
        for kind in PluginCallbackType::ALL {
            let active: Vec<Arc<Plugin>> = ordered
                .iter()
                .filter(|entry| !entry.disabled && entry.plugin.declares(kind))
                .map(|entry| Arc::clone(&entry.plugin))
                .collect();
            index.insert(kind, active);
        }

        self.index = index;
    }

    fn generate_id(&self, reserved: &HashSet<String>) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let candidate = format!("plugin-{:016x}", rng.gen::<u64>());
            if !self.plugins.contains_key(&candidate) && !reserved.contains(&candidate) {
                return candidate;
            }
        }
    }
}

/// Ordered, shareable collection of plugins
///
/// A `LogLayer` and all of its children hold the same `Arc<PluginManager>`,
/// so enabling, disabling, adding or removing a plugin through any of them
/// affects all of them.
#[derive(Default)]
pub struct PluginManager {
    store: RwLock<PluginStore>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with `plugins`
    pub fn with_plugins(plugins: impl IntoIterator<Item = Plugin>) -> Result<Self> {
        let manager = Self::new();
        manager.add_plugins(plugins)?;
        Ok(manager)
    }

    /// Register plugins in the given order
    ///
    /// Plugins without an id receive a generated one. If any explicit id is
    /// already registered, or appears twice in `plugins`, the whole batch is
    /// rejected with `DuplicatePluginId` and nothing is registered.
    pub fn add_plugins(&self, plugins: impl IntoIterator<Item = Plugin>) -> Result<()> {
        let plugins: Vec<Plugin> = plugins.into_iter().collect();
        let mut store = self.store.write();

        let mut reserved = HashSet::new();
        for id in plugins.iter().filter_map(Plugin::id) {
            if store.plugins.contains_key(id) || !reserved.insert(id.to_string()) {
                return Err(LogLayerError::duplicate_plugin(id));
            }
        }

        for mut plugin in plugins {
            let id = match plugin.id.clone() {
                Some(id) => id,
                None => {
                    let id = store.generate_id(&reserved);
                    reserved.insert(id.clone());
                    plugin.id = Some(id.clone());
                    id
                }
            };

            let sequence = store.next_sequence;
            store.next_sequence += 1;

            let disabled = plugin.disabled;
            store.plugins.insert(
                id,
                RegisteredPlugin {
                    plugin: Arc::new(plugin),
                    disabled,
                    sequence,
                    registered_at: Utc::now(),
                },
            );
        }

        store.reindex();
        Ok(())
    }

    /// Enable or disable a plugin. Unknown ids are ignored.
    pub fn set_enabled(&self, id: &str, enabled: bool) {
        let mut store = self.store.write();
        match store.plugins.get_mut(id) {
            Some(entry) => entry.disabled = !enabled,
            None => return,
        }
        store.reindex();
    }

    pub fn enable_plugin(&self, id: &str) {
        self.set_enabled(id, true);
    }

    pub fn disable_plugin(&self, id: &str) {
        self.set_enabled(id, false);
    }

    /// Remove a plugin. Unknown ids are ignored.
    pub fn remove_plugin(&self, id: &str) {
        let mut store = self.store.write();
        if store.plugins.remove(id).is_some() {
            store.reindex();
        }
    }

    /// Whether at least one enabled plugin declares `kind`
    pub fn has_plugins(&self, kind: PluginCallbackType) -> bool {
        self.store
            .read()
            .index
            .get(&kind)
            .is_some_and(|plugins| !plugins.is_empty())
    }

    /// Number of registered plugins, or of enabled plugins declaring `kind`
    pub fn count_plugins(&self, kind: Option<PluginCallbackType>) -> usize {
        let store = self.store.read();
        match kind {
            None => store.plugins.len(),
            Some(kind) => store.index.get(&kind).map_or(0, Vec::len),
        }
    }

    /// Registered ids in registration order
    pub fn plugin_ids(&self) -> Vec<String> {
        let store = self.store.read();
        let mut entries: Vec<(&String, u64)> = store
            .plugins
            .iter()
            .map(|(id, entry)| (id, entry.sequence))
            .collect();
        entries.sort_by_key(|(_, sequence)| *sequence);
        entries.into_iter().map(|(id, _)| id.clone()).collect()
    }

    /// `Some(true)` if enabled, `Some(false)` if disabled, `None` if unknown
    pub fn is_enabled(&self, id: &str) -> Option<bool> {
        self.store.read().plugins.get(id).map(|entry| !entry.disabled)
    }

    pub fn registered_at(&self, id: &str) -> Option<DateTime<Utc>> {
        self.store.read().plugins.get(id).map(|entry| entry.registered_at)
    }

    fn active(&self, kind: PluginCallbackType) -> Vec<Arc<Plugin>> {
        self.store
            .read()
            .index
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    /// Fold `on_before_data_out` over the envelope.
    ///
    /// Each plugin sees the data accumulated so far; returned fields are
    /// merged on top of it, creating the envelope if there was none.
    pub fn run_on_before_data_out(&self, data: Option<Fields>, log_level: LogLevel) -> Option<Fields> {
        let mut data = data;

        for plugin in self.active(PluginCallbackType::OnBeforeDataOut) {
            let Some(callback) = plugin.on_before_data_out.as_ref() else {
                continue;
            };

            let params = BeforeDataOutParams {
                log_level,
                data: data.as_ref(),
            };

            if let Some(result) = callback(params) {
                merge_fields(data.get_or_insert_with(Fields::new), result);
            }
        }

        data
    }

    /// `false` as soon as one plugin vetoes the emission
    pub fn run_should_send_to_logger(
        &self,
        messages: &[Value],
        data: Option<&Fields>,
        log_level: LogLevel,
    ) -> bool {
        self.active(PluginCallbackType::ShouldSendToLogger)
            .iter()
            .all(|plugin| match plugin.should_send_to_logger.as_ref() {
                Some(callback) => callback(ShouldSendParams {
                    log_level,
                    messages,
                    data,
                }),
                None => true,
            })
    }

    /// Thread metadata through `on_metadata_called`; `None` means drop it
    pub fn run_on_metadata_called(&self, metadata: Fields) -> Option<Fields> {
        let mut metadata = metadata;

        for plugin in self.active(PluginCallbackType::OnMetadataCalled) {
            if let Some(callback) = plugin.on_metadata_called.as_ref() {
                metadata = callback(metadata)?;
            }
        }

        Some(metadata)
    }

    /// Thread the message list through `on_before_message_out`
    pub fn run_on_before_message_out(&self, messages: Vec<Value>, log_level: LogLevel) -> Vec<Value> {
        let mut messages = messages;

        for plugin in self.active(PluginCallbackType::OnBeforeMessageOut) {
            let Some(callback) = plugin.on_before_message_out.as_ref() else {
                continue;
            };

            let params = BeforeMessageOutParams {
                log_level,
                messages: &messages,
            };

            if let Some(result) = callback(params) {
                messages = result;
            }
        }

        messages
    }
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("plugins", &self.plugin_ids())
            .finish()
    }
}

//! # Search Index Sync
//!
//! When enabled, every newly created attribute is announced to the external
//! search index as a field mapping. The call happens after the attribute's
//! transaction has committed and is best-effort: a failing index leaves the
//! attribute in place and is only logged.
//!
//! Updates and deletes are not propagated. A field's mapping type is fixed by
//! its value type, which never changes, and search indexes generally reject
//! edits to an existing field mapping. Flag changes that would have produced
//! a different mapping are logged so an operator can reindex.
//!
//! The index client itself sits behind the [`SearchIndex`] trait.

use crate::config::SearchIndexConfig;
use crate::error::{AttrError, Result};
use crate::model::{Attribute, ValueType};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubField {
    #[serde(rename = "type")]
    pub field_type: String,
    pub ignore_above: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(rename = "type")]
    pub field_type: String,
    pub index: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_analyzer: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, SubField>,
}

/// Index field type for a value type.
pub fn index_type(value_type: ValueType) -> &'static str {
    match value_type {
        ValueType::Int => "long",
        ValueType::Float => "float",
        ValueType::Text | ValueType::Datetime | ValueType::Date | ValueType::Time => "text",
    }
}

/// Client side of the external search index.
pub trait SearchIndex: Send + Sync {
    fn update_mapping(&self, field: &str, mapping: &FieldMapping) -> Result<()>;
}

pub struct SearchIndexSync {
    index: Arc<dyn SearchIndex>,
    settings: SearchIndexConfig,
}

impl SearchIndexSync {
    pub fn new(index: Arc<dyn SearchIndex>, settings: SearchIndexConfig) -> Self {
        Self { index, settings }
    }

    /// `None` unless the configuration enables index sync.
    pub fn from_config(settings: &SearchIndexConfig, index: Arc<dyn SearchIndex>) -> Option<Self> {
        settings
            .enabled
            .then(|| Self::new(index, settings.clone()))
    }

    pub fn mapping_for(&self, attr: &Attribute) -> FieldMapping {
        let mut mapping = FieldMapping {
            field_type: index_type(attr.value_type).to_string(),
            index: attr.flags.is_index,
            analyzer: None,
            search_analyzer: None,
            fields: BTreeMap::new(),
        };

        if attr.value_type == ValueType::Text {
            mapping.analyzer = Some(self.settings.text_analyzer.clone());
            mapping.search_analyzer = Some(self.settings.text_search_analyzer.clone());
            if attr.flags.is_index {
                mapping.fields.insert(
                    "keyword".to_string(),
                    SubField {
                        field_type: "keyword".to_string(),
                        ignore_above: self.settings.keyword_ignore_above,
                    },
                );
            }
        }
        mapping
    }

    /// Push the mapping of a freshly committed attribute. Returns whether the
    /// index accepted it; failures are logged and otherwise swallowed.
    pub fn on_created(&self, attr: &Attribute) -> bool {
        let mapping = self.mapping_for(attr);
        match self.index.update_mapping(&attr.name, &mapping) {
            Ok(()) => {
                info!(attr_id = attr.id, field = %attr.name, "search index mapping updated");
                true
            }
            Err(e) => {
                warn!(attr_id = attr.id, field = %attr.name, error = %e, "search index mapping update failed");
                false
            }
        }
    }

    /// Updates are not pushed; flag the ones whose mapping would differ.
    pub fn on_updated(&self, before: &Attribute, after: &Attribute) {
        if before.name != after.name || self.mapping_for(before) != self.mapping_for(after) {
            warn!(
                attr_id = after.id,
                field = %after.name,
                previous_field = %before.name,
                "index mapping is stale after attribute update; reindex required"
            );
        }
    }
}

/// Records mappings in memory.
#[derive(Default)]
pub struct InMemoryIndex {
    mappings: RwLock<BTreeMap<String, FieldMapping>>,
    simulate_failure: AtomicBool,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_simulate_failure(&self, fail: bool) {
        self.simulate_failure.store(fail, Ordering::SeqCst);
    }

    pub fn mapping(&self, field: &str) -> Option<FieldMapping> {
        self.mappings.read().get(field).cloned()
    }

    pub fn len(&self) -> usize {
        self.mappings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.read().is_empty()
    }
}

impl SearchIndex for InMemoryIndex {
    fn update_mapping(&self, field: &str, mapping: &FieldMapping) -> Result<()> {
        if self.simulate_failure.load(Ordering::SeqCst) {
            return Err(AttrError::Store("Simulated index failure".to_string()));
        }
        self.mappings.write().insert(field.to_string(), mapping.clone());
        Ok(())
    }
}

/// Keeps the mapping document as a JSON file, `{ "<field>": <mapping>, ... }`.
///
/// Updates are serialized per instance; share one `FileIndex` per file.
pub struct FileIndex {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn load(&self) -> Result<BTreeMap<String, FieldMapping>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path).map_err(AttrError::Io)?;
        serde_json::from_str(&content).map_err(AttrError::Serialization)
    }
}

impl SearchIndex for FileIndex {
    fn update_mapping(&self, field: &str, mapping: &FieldMapping) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut mappings = self.load()?;
        mappings.insert(field.to_string(), mapping.clone());

        let dir = self
            .path
            .parent()
            .ok_or_else(|| AttrError::Store(format!("invalid index path {}", self.path.display())))?;
        fs::create_dir_all(dir).map_err(AttrError::Io)?;
        let content = serde_json::to_string_pretty(&mappings).map_err(AttrError::Serialization)?;
        replace_file(dir, &self.path, &content)
    }
}

/// Write `content` to a temp file in `dir` and rename it over `target`.
fn replace_file(dir: &Path, target: &Path, content: &str) -> Result<()> {
    let tmp_file = dir.join(format!(".mappings-{}.tmp", Uuid::new_v4()));
    fs::write(&tmp_file, content).map_err(AttrError::Io)?;
    if let Err(e) = fs::rename(&tmp_file, target) {
        let _ = fs::remove_file(&tmp_file);
        return Err(AttrError::Io(e));
    }
    Ok(())
}

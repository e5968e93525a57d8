use crate::compact::KeyMap;
use crate::schema::FieldSummary;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A node of the hierarchical value space: scalar, object or array
pub type Document = Value;

/// An insertion-ordered object; every emitted record is one of these
pub type Object = Map<String, Value>;

/// Configuration for one loading session
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoadConfig {
    /// Name of the array whose object elements are emitted as records.
    /// When unset the whole root object is the record.
    #[serde(default)]
    pub records_array_name: Option<String>,

    /// Rewrite the top-level field names of every record to compacted codes
    #[serde(default)]
    pub compact_keys: bool,
}

impl LoadConfig {
    pub fn with_records_array(mut self, name: impl Into<String>) -> Self {
        self.records_array_name = Some(name.into());
        self
    }

    pub fn with_compaction(mut self, compact_keys: bool) -> Self {
        self.compact_keys = compact_keys;
        self
    }
}

/// What a finished session hands to metadata registration
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    /// Number of records emitted
    pub records: usize,

    /// The key compaction map, when compaction was enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_map: Option<KeyMap>,

    /// One entry per distinct top-level field, in first-seen order
    pub fields: Vec<FieldSummary>,
}

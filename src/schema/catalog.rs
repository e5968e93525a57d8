//! Per-field type inference over emitted records
//!
//! Metadata registration needs, for every top-level field of a collection,
//! its original name, its compacted code and a value type. The catalog
//! accumulates counts while records stream past and settles on a type once
//! the session is over.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

static ISO_DATETIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?$").unwrap()
});

static ISO_DATE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

static ISO_TIME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}(\.\d+)?$").unwrap());

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

static IPV4_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,3}\.){3}\d{1,3}$").unwrap());

fn detect_format(s: &str) -> Option<&'static str> {
    if ISO_DATETIME_REGEX.is_match(s) {
        Some("date-time")
    } else if ISO_DATE_REGEX.is_match(s) {
        Some("date")
    } else if ISO_TIME_REGEX.is_match(s) {
        Some("time")
    } else if EMAIL_REGEX.is_match(s) {
        Some("email")
    } else if UUID_REGEX.is_match(s) {
        Some("uuid")
    } else if IPV4_REGEX.is_match(s) {
        Some("ipv4")
    } else {
        None
    }
}

/// Inferred value type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
    /// Values of incompatible types were seen
    Mixed,
}

impl FieldKind {
    fn of(value: &Value) -> Self {
        match value {
            Value::Null => FieldKind::Null,
            Value::Bool(_) => FieldKind::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => FieldKind::Integer,
            Value::Number(_) => FieldKind::Number,
            Value::String(_) => FieldKind::String,
            Value::Array(_) => FieldKind::Array,
            Value::Object(_) => FieldKind::Object,
        }
    }

    /// The narrowest kind covering both; nulls are tracked separately
    fn unify(self, other: FieldKind) -> FieldKind {
        use FieldKind::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Null, k) | (k, Null) => k,
            (Integer, Number) | (Number, Integer) => Number,
            _ => Mixed,
        }
    }
}

/// Metadata for one top-level field of the loaded collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub name: String,
    /// Compacted code, when key compaction was enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub kind: FieldKind,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<&'static str>,
    /// Number of records the field appeared in
    pub occurrences: usize,
}

#[derive(Debug)]
struct FieldStats {
    kind: FieldKind,
    nulls: usize,
    occurrences: usize,
    strings: usize,
    format_counts: HashMap<&'static str, usize>,
}

impl FieldStats {
    fn new() -> Self {
        FieldStats {
            kind: FieldKind::Null,
            nulls: 0,
            occurrences: 0,
            strings: 0,
            format_counts: HashMap::new(),
        }
    }

    fn add(&mut self, value: &Value) {
        self.occurrences += 1;
        self.kind = self.kind.unify(FieldKind::of(value));
        match value {
            Value::Null => self.nulls += 1,
            Value::String(s) => {
                self.strings += 1;
                if let Some(format) = detect_format(s) {
                    *self.format_counts.entry(format).or_insert(0) += 1;
                }
            }
            _ => {}
        }
    }

    /// A format is reported only if every string agreed on it
    fn format(&self) -> Option<&'static str> {
        if self.kind != FieldKind::String || self.format_counts.len() != 1 {
            return None;
        }
        self.format_counts
            .iter()
            .next()
            .filter(|(_, count)| **count == self.strings)
            .map(|(format, _)| *format)
    }
}

/// Accumulates field statistics in first-seen field order
#[derive(Debug, Default)]
pub struct FieldCatalog {
    order: Vec<String>,
    fields: HashMap<String, FieldStats>,
}

impl FieldCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one field value
    pub fn observe(&mut self, name: &str, value: &Value) {
        if !self.fields.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.fields
            .entry(name.to_string())
            .or_insert_with(FieldStats::new)
            .add(value);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Summaries in first-seen order; `code_for` supplies compacted codes
    pub fn summaries<F>(&self, code_for: F) -> Vec<FieldSummary>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.order
            .iter()
            .filter_map(|name| {
                let stats = self.fields.get(name)?;
                Some(FieldSummary {
                    name: name.clone(),
                    code: code_for(name),
                    kind: stats.kind,
                    nullable: stats.nulls > 0,
                    format: stats.format(),
                    occurrences: stats.occurrences,
                })
            })
            .collect()
    }
}

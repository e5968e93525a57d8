use crate::types::Object;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// Bijection between original field names and their compacted codes
///
/// Both directions are kept in step by the compaction engine, which is the
/// only writer. Keys are remembered in the order they were first submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMap {
    key_to_code: HashMap<String, String>,
    code_to_key: HashMap<String, String>,
    order: Vec<String>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn code_for(&self, key: &str) -> Option<&str> {
        self.key_to_code.get(key).map(String::as_str)
    }

    pub fn key_for(&self, code: &str) -> Option<&str> {
        self.code_to_key.get(code).map(String::as_str)
    }

    /// Number of bound keys
    pub fn len(&self) -> usize {
        self.key_to_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_to_code.is_empty()
    }

    /// `(key, code)` pairs in first-seen key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.order
            .iter()
            .filter_map(|key| self.key_to_code.get(key).map(|code| (key.as_str(), code.as_str())))
    }

    pub fn key_to_code(&self) -> &HashMap<String, String> {
        &self.key_to_code
    }

    pub fn code_to_key(&self) -> &HashMap<String, String> {
        &self.code_to_key
    }

    /// Rename the fields of a record to their codes; unknown fields keep their name
    pub fn compact(&self, record: &Object) -> Object {
        record
            .iter()
            .map(|(key, value)| {
                let name = self.code_for(key).unwrap_or(key);
                (name.to_string(), value.clone())
            })
            .collect()
    }

    /// Restore the original field names of a compacted record; unknown codes are kept
    pub fn expand(&self, record: &Object) -> Object {
        record
            .iter()
            .map(|(code, value)| {
                let name = self.key_for(code).unwrap_or(code);
                (name.to_string(), value.clone())
            })
            .collect()
    }

    pub(crate) fn bind(&mut self, key: &str, code: &str) {
        if !self.key_to_code.contains_key(key) && !self.order.iter().any(|k| k == key) {
            self.order.push(key.to_string());
        }
        self.key_to_code.insert(key.to_string(), code.to_string());
        self.code_to_key.insert(code.to_string(), key.to_string());
    }

    /// Release a code, returning the key that held it
    pub(crate) fn unbind_code(&mut self, code: &str) -> Option<String> {
        let key = self.code_to_key.remove(code)?;
        self.key_to_code.remove(&key);
        Some(key)
    }
}

impl Serialize for KeyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, code) in self.iter() {
            map.serialize_entry(key, code)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn sample() -> KeyMap {
        let mut map = KeyMap::new();
        map.bind("state", "9");
        map.bind("race", "2");
        map
    }

    #[test]
    fn test_both_directions_agree() {
        let map = sample();
        assert_eq!(map.code_for("state"), Some("9"));
        assert_eq!(map.key_for("9"), Some("state"));
        assert_eq!(map.len(), 2);
        assert_eq!(map.code_for("sex"), None);
    }

    #[test]
    fn test_rebinding_keeps_first_seen_order() {
        let mut map = sample();
        assert_eq!(map.unbind_code("9"), Some("state".to_string()));
        assert!(map.key_for("9").is_none());
        assert!(map.code_for("state").is_none());

        map.bind("state", "9e");
        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs, vec![("state", "9e"), ("race", "2")]);
    }

    #[test]
    fn test_compact_and_expand_records() {
        let map = sample();
        let record = json!({"state": "Ohio", "race": "all", "extra": 1});
        let record = record.as_object().unwrap();

        let compacted = map.compact(record);
        assert_eq!(Value::Object(compacted.clone()), json!({"9": "Ohio", "2": "all", "extra": 1}));
        assert_eq!(&map.expand(&compacted), record);
    }

    #[test]
    fn test_serializes_in_first_seen_order() {
        let map = sample();
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"state":"9","race":"2"}"#);
    }
}

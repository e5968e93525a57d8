//! Property tests for key compaction
//!
//! 1. **Round trip**: every assigned key maps to its code and back
//! 2. **Bijection**: codes are pairwise distinct digest prefixes
//! 3. **Stability**: re-submitting known keys changes nothing
//! 4. **Record round trip**: expanding a compacted record restores it

use ingot::{KeyCompactor, KeyHasher, LoadConfig, Md5Hasher, Object, RecordExtractor};
use ingot::document::ListeningSink;
use ingot::source::stream_str;
use proptest::prelude::*;
use std::collections::HashSet;

fn distinct_keys() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z_][a-z0-9_]{0,12}", 1..60)
        .prop_map(|keys| keys.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_round_trip(keys in distinct_keys()) {
        let mut compactor = KeyCompactor::new();
        let pairs = compactor.compact_all(&keys).unwrap();

        prop_assert_eq!(pairs.len(), keys.len());
        for (key, code) in &pairs {
            prop_assert_eq!(compactor.key_for(code), Some(key.as_str()));
            prop_assert_eq!(compactor.code_for(key), Some(code.as_str()));
        }
    }

    #[test]
    fn prop_codes_are_distinct_digest_prefixes(keys in distinct_keys()) {
        let mut compactor = KeyCompactor::new();
        let pairs = compactor.compact_all(&keys).unwrap();

        let codes: HashSet<_> = pairs.iter().map(|(_, code)| code.clone()).collect();
        prop_assert_eq!(codes.len(), pairs.len());
        prop_assert_eq!(compactor.key_map().len(), keys.len());
        for (key, code) in &pairs {
            prop_assert!(Md5Hasher.hex_digest(key).starts_with(code.as_str()));
        }
    }

    #[test]
    fn prop_resubmission_is_stable(keys in distinct_keys()) {
        let mut compactor = KeyCompactor::new();
        compactor.compact_all(&keys).unwrap();
        let before = compactor.key_map().clone();

        for key in keys.iter().rev() {
            compactor.assign(key).unwrap();
        }
        prop_assert_eq!(compactor.key_map(), &before);
    }

    #[test]
    fn prop_compacted_record_expands_to_original(keys in distinct_keys()) {
        let document: serde_json::Map<String, serde_json::Value> = keys
            .iter()
            .enumerate()
            .map(|(i, key)| (key.clone(), serde_json::json!(i)))
            .collect();
        let input = serde_json::to_string(&document).unwrap();

        let config = LoadConfig::default().with_compaction(true);
        let mut records = Vec::new();
        let mut listener = |record: Object| records.push(record);
        let mut sink = ListeningSink::new(RecordExtractor::new(&config), &mut listener);
        stream_str(&input, &mut sink).unwrap();
        let summary = sink.finish().unwrap();

        prop_assert_eq!(records.len(), 1);
        let key_map = summary.key_map.unwrap();
        prop_assert_eq!(key_map.expand(&records[0]), document);
    }
}

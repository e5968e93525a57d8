//! Reversible field-name compaction
//!
//! Long field names are replaced by the shortest unique hex prefix of their
//! digest. The resulting [`KeyMap`] is persisted next to the loaded records so
//! the original names can be restored.

pub mod digest;
pub mod engine;
pub mod key_map;

pub use digest::{KeyHasher, Md5Hasher, Sha256Hasher};
pub use engine::{Assignment, KeyCompactor, Relocation};
pub use key_map::KeyMap;

//! Shortest-unique-prefix key compaction
//!
//! Every key is coded by the shortest prefix of its hex digest that no other
//! key holds. When a new key's candidate prefix is already held, the holder
//! is evicted and re-resolved from the next longer prefix, after which the new
//! key carries on from that longer length too. The vacated prefix stays
//! unused. Results depend on submission order, so keys must be fed in a
//! stable order (first-seen order in the source data).
//!
//! A key can be [frozen](KeyCompactor::freeze) once its code has been
//! written out. Frozen keys are never evicted: a colliding key passes over
//! their prefix and keeps lengthening its own.

use super::digest::{KeyHasher, Md5Hasher};
use super::key_map::KeyMap;
use crate::error::CompactionError;
use std::collections::HashSet;
use tracing::debug;

/// A key that lost its code while another key was being assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub key: String,
    pub from: String,
    pub to: String,
}

/// Outcome of one assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub code: String,
    /// Previously coded keys whose code changed, in the order they were moved
    pub relocated: Vec<Relocation>,
}

/// One pending resolution on the work-list
struct Pending {
    key: String,
    digest: String,
    /// Prefix length to try next
    len: usize,
    /// Code the key held before it was evicted
    evicted_from: Option<String>,
}

/// Map changes made by one assignment, undone if it fails
enum Change {
    Bound(String),
    Unbound { key: String, code: String },
}

/// Assigns compacted codes to field names; one instance per load session
pub struct KeyCompactor<H = Md5Hasher> {
    hasher: H,
    map: KeyMap,
    frozen: HashSet<String>,
}

impl KeyCompactor<Md5Hasher> {
    pub fn new() -> Self {
        Self::with_hasher(Md5Hasher)
    }
}

impl Default for KeyCompactor<Md5Hasher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: KeyHasher> KeyCompactor<H> {
    pub fn with_hasher(hasher: H) -> Self {
        KeyCompactor {
            hasher,
            map: KeyMap::new(),
            frozen: HashSet::new(),
        }
    }

    /// Pin the current code of `key`; later assignments never move it.
    /// Returns false if the key has no code yet.
    pub fn freeze(&mut self, key: &str) -> bool {
        if self.map.code_for(key).is_none() {
            return false;
        }
        if !self.frozen.contains(key) {
            self.frozen.insert(key.to_string());
        }
        true
    }

    pub fn is_frozen(&self, key: &str) -> bool {
        self.frozen.contains(key)
    }

    /// Assign a code to `key`, or return the code it already has
    pub fn assign(&mut self, key: &str) -> Result<String, CompactionError> {
        self.assign_tracked(key).map(|assignment| assignment.code)
    }

    /// Like [`assign`](Self::assign), also reporting which keys were moved.
    /// On error the map is left as it was before the call.
    pub fn assign_tracked(&mut self, key: &str) -> Result<Assignment, CompactionError> {
        if let Some(code) = self.map.code_for(key) {
            return Ok(Assignment {
                code: code.to_string(),
                relocated: Vec::new(),
            });
        }

        let mut relocated = Vec::new();
        let mut changes = Vec::new();
        let mut work = vec![Pending {
            key: key.to_string(),
            digest: self.hasher.hex_digest(key),
            len: 1,
            evicted_from: None,
        }];

        while let Some(top) = work.last_mut() {
            if top.len > top.digest.len() {
                let err = CompactionError::DigestExhausted {
                    key: top.key.clone(),
                    digest_len: top.digest.len(),
                };
                self.roll_back(changes);
                return Err(err);
            }

            let candidate = top.digest[..top.len].to_string();
            top.len += 1;
            let next_len = top.len;

            let holder = self.map.key_for(&candidate).map(str::to_string);
            match holder {
                None => {
                    self.map.bind(&top.key, &candidate);
                    changes.push(Change::Bound(candidate.clone()));
                    if let Some(from) = top.evicted_from.take() {
                        debug!(key = %top.key, %from, to = %candidate, "relocated compacted key");
                        relocated.push(Relocation {
                            key: top.key.clone(),
                            from,
                            to: candidate,
                        });
                    }
                    work.pop();
                }
                Some(holder) if holder == top.key => {
                    work.pop();
                }
                Some(holder) if self.frozen.contains(&holder) => {
                    debug!(key = %top.key, %holder, code = %candidate, "passing over frozen code");
                }
                Some(holder) => {
                    // The holder resumes one digit longer, and so does `top`
                    self.map.unbind_code(&candidate);
                    changes.push(Change::Unbound {
                        key: holder.clone(),
                        code: candidate.clone(),
                    });
                    let digest = self.hasher.hex_digest(&holder);
                    work.push(Pending {
                        key: holder,
                        digest,
                        len: next_len,
                        evicted_from: Some(candidate),
                    });
                }
            }
        }

        let code = self
            .map
            .code_for(key)
            .map(str::to_string)
            .ok_or_else(|| CompactionError::DigestExhausted {
                key: key.to_string(),
                digest_len: self.hasher.hex_digest(key).len(),
            })?;

        Ok(Assignment { code, relocated })
    }

    fn roll_back(&mut self, changes: Vec<Change>) {
        for change in changes.into_iter().rev() {
            match change {
                Change::Bound(code) => {
                    self.map.unbind_code(&code);
                }
                Change::Unbound { key, code } => self.map.bind(&key, &code),
            }
        }
    }

    /// Assign every key in order and return `(key, code)` pairs with final codes
    pub fn compact_all<I, S>(&mut self, keys: I) -> Result<Vec<(String, String)>, CompactionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: Vec<String> = keys.into_iter().map(|k| k.as_ref().to_string()).collect();
        for key in &keys {
            self.assign(key)?;
        }

        Ok(keys
            .into_iter()
            .filter_map(|key| {
                let code = self.map.code_for(&key)?.to_string();
                Some((key, code))
            })
            .collect())
    }

    pub fn code_for(&self, key: &str) -> Option<&str> {
        self.map.code_for(key)
    }

    pub fn key_for(&self, code: &str) -> Option<&str> {
        self.map.key_for(code)
    }

    pub fn key_map(&self) -> &KeyMap {
        &self.map
    }

    pub fn into_key_map(self) -> KeyMap {
        self.map
    }
}

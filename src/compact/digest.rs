//! Hash primitives used as the source of compacted codes

use md5::Md5;
use sha2::{Digest, Sha256};

/// Produces the fixed-length lowercase hex digest a key's codes are cut from
pub trait KeyHasher {
    fn hex_digest(&self, key: &str) -> String;
}

/// MD5 digests (32 hex digits); the default, so codes match previously loaded data
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5Hasher;

impl KeyHasher for Md5Hasher {
    fn hex_digest(&self, key: &str) -> String {
        hex::encode(Md5::digest(key.as_bytes()))
    }
}

/// SHA-256 digests (64 hex digits)
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl KeyHasher for Sha256Hasher {
    fn hex_digest(&self, key: &str) -> String {
        hex::encode(Sha256::digest(key.as_bytes()))
    }
}

impl<H: KeyHasher + ?Sized> KeyHasher for &H {
    fn hex_digest(&self, key: &str) -> String {
        (**self).hex_digest(key)
    }
}

impl<H: KeyHasher + ?Sized> KeyHasher for Box<H> {
    fn hex_digest(&self, key: &str) -> String {
        (**self).hex_digest(key)
    }
}

//! Error types
//!
//! Each stage owns a small taxonomy ([`BuildError`], [`CompactionError`],
//! [`XmlError`]); [`Error`] wraps them for callers driving a whole load.
//! None of them is recoverable for the stream that produced it.

use thiserror::Error;

/// Structural failures raised by the document builder
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The document stream did not open with an object
    #[error("document stream must begin with an object, found {found}")]
    InvalidRoot { found: &'static str },

    /// Start and end events do not match up
    #[error("unbalanced structure at depth {depth}: {reason}")]
    UnbalancedStructure { depth: usize, reason: String },

    /// A scalar arrived while no container was open
    #[error("scalar value ({kind}) outside of any container")]
    UnexpectedRootScalar { kind: &'static str },
}

impl BuildError {
    pub(crate) fn unbalanced(depth: usize, reason: impl Into<String>) -> Self {
        BuildError::UnbalancedStructure {
            depth,
            reason: reason.into(),
        }
    }
}

/// Failures of the key compaction engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompactionError {
    #[error("no free prefix left in the digest of key {key:?} ({digest_len} hex digits)")]
    DigestExhausted { key: String, digest_len: usize },
}

/// Failures of the XML transcoding adapter
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed XML at byte {position}: {source}")]
    Parse {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("XML input has no root element")]
    MissingRoot,

    #[error("XML input ended inside element <{name}>")]
    Unclosed { name: String },

    #[error("second root element <{name}> after the document element")]
    TrailingElement { name: String },
}

/// Any failure of a loading session
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Compaction(#[from] CompactionError),

    #[error(transparent)]
    Xml(#[from] XmlError),

    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

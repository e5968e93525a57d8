//! # Ingot - hierarchical data to flat documents
//!
//! Converts JSON, newline-delimited JSON and XML into a sequence of flat,
//! self-contained records for bulk insertion into a schemaless store, and
//! optionally shrinks top-level field names to short, reversible codes.
//!
//! ## Modules
//!
//! - **event**: the structural event shape every input is reduced to
//! - **document**: stack-based record assembly, extraction sessions and output
//! - **compact**: shortest-unique-digest-prefix key compaction
//! - **schema**: per-field type inference for metadata registration
//! - **source**: JSON and XML input adapters
//!
//! ## Quick Start
//!
//! ```rust
//! use ingot::{load_json, LoadConfig, Object};
//!
//! # fn main() -> ingot::Result<()> {
//! let input = r#"{
//!     "meta": {"page": 1},
//!     "results": [
//!         {"state": "Ohio", "race": "all"},
//!         {"state": "Iowa", "race": "all"}
//!     ]
//! }"#;
//!
//! let config = LoadConfig::default()
//!     .with_records_array("results")
//!     .with_compaction(true);
//!
//! let mut records = Vec::new();
//! let summary = load_json(input.as_bytes(), &config, &mut |record: Object| records.push(record))?;
//!
//! assert_eq!(records.len(), 2);
//! assert_eq!(records[0]["9"], "Ohio");
//!
//! let key_map = summary.key_map.expect("compaction was enabled");
//! assert_eq!(key_map.key_for("9"), Some("state"));
//! # Ok(())
//! # }
//! ```

use std::io::{BufRead, Read};
use tracing::info;

pub mod compact;
pub mod document;
pub mod error;
pub mod event;
pub mod schema;
pub mod source;
pub mod types;

// Re-export commonly used types for convenience
pub use compact::{KeyCompactor, KeyHasher, KeyMap, Md5Hasher, Sha256Hasher};
pub use document::{DocumentBuilder, RecordExtractor, RecordListener, RecordWriter};
pub use error::{BuildError, CompactionError, Error, Result, XmlError};
pub use event::{Event, Scalar};
pub use schema::{FieldKind, FieldSummary};
pub use types::{Document, LoadConfig, LoadSummary, Object};

use document::ListeningSink;
use source::XmlEventSource;

/// Load one JSON document, handing every record to `listener`
pub fn load_json<R, L>(reader: R, config: &LoadConfig, listener: &mut L) -> Result<LoadSummary>
where
    R: Read,
    L: RecordListener + ?Sized,
{
    let mut sink = ListeningSink::new(RecordExtractor::new(config), listener);
    source::stream_document(reader, &mut sink)?;
    let summary = sink.finish()?;
    info!(records = summary.records, fields = summary.fields.len(), "loaded JSON document");
    Ok(summary)
}

/// Load newline-delimited JSON; every line is a document of the same session
pub fn load_ndjson<R, L>(reader: R, config: &LoadConfig, listener: &mut L) -> Result<LoadSummary>
where
    R: BufRead,
    L: RecordListener + ?Sized,
{
    let mut sink = ListeningSink::new(RecordExtractor::new(config), listener);
    let documents = source::stream_lines(reader, &mut sink)?;
    let summary = sink.finish()?;
    info!(documents, records = summary.records, "loaded NDJSON stream");
    Ok(summary)
}

/// Load one XML document
pub fn load_xml<R, L>(reader: R, config: &LoadConfig, listener: &mut L) -> Result<LoadSummary>
where
    R: BufRead,
    L: RecordListener + ?Sized,
{
    let events = XmlEventSource::from_reader(reader)?;
    let summary = RecordExtractor::new(config).drive(events, listener)?;
    info!(records = summary.records, fields = summary.fields.len(), "loaded XML document");
    Ok(summary)
}

//! Document assembly: from events to records
//!
//! - **builder**: rebuilds nested documents from a flat event stream
//! - **extractor**: record boundaries, key compaction and listeners
//! - **writer**: JSON Lines output for bulk loading

pub mod builder;
pub mod extractor;
pub mod writer;

pub use builder::DocumentBuilder;
pub use extractor::{ListeningSink, RecordExtractor, RecordListener, Records};
pub use writer::{write_summary, RecordWriter};

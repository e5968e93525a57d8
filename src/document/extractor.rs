//! Record extraction policy over the document builder
//!
//! [`RecordExtractor`] owns one session: a [`DocumentBuilder`] for record
//! boundaries, an optional [`KeyCompactor`] for field-name compaction and a
//! [`FieldCatalog`] for metadata. Records leave it either through a
//! [`RecordListener`] (push) or the [`Records`] iterator (pull).

use super::builder::DocumentBuilder;
use crate::compact::{KeyCompactor, KeyHasher, Md5Hasher};
use crate::error::Result;
use crate::event::Event;
use crate::schema::FieldCatalog;
use crate::source::EventSink;
use crate::types::{LoadConfig, LoadSummary, Object};
use tracing::debug;

/// Receives every record of a session, in stream order
pub trait RecordListener {
    fn record_complete(&mut self, record: Object) -> Result<()>;
}

impl<F> RecordListener for F
where
    F: FnMut(Object) + ?Sized,
{
    fn record_complete(&mut self, record: Object) -> Result<()> {
        self(record);
        Ok(())
    }
}

/// Compaction state of a session; keys are frozen once a record used them
struct Compaction<H> {
    compactor: KeyCompactor<H>,
}

/// One loading session: boundaries, key compaction and field metadata
pub struct RecordExtractor<H = Md5Hasher> {
    builder: DocumentBuilder,
    compaction: Option<Compaction<H>>,
    catalog: FieldCatalog,
    emitted: usize,
}

impl RecordExtractor<Md5Hasher> {
    pub fn new(config: &LoadConfig) -> Self {
        Self::with_hasher(config, Md5Hasher)
    }
}

impl<H: KeyHasher> RecordExtractor<H> {
    /// A session whose key compaction (if enabled) digests keys with `hasher`
    pub fn with_hasher(config: &LoadConfig, hasher: H) -> Self {
        let builder = match &config.records_array_name {
            Some(name) => DocumentBuilder::with_records_array(name.clone()),
            None => DocumentBuilder::new(),
        };
        let compaction = config.compact_keys.then(|| Compaction {
            compactor: KeyCompactor::with_hasher(hasher),
        });

        RecordExtractor {
            builder,
            compaction,
            catalog: FieldCatalog::new(),
            emitted: 0,
        }
    }

    /// Consume one event, returning the finished record it completed, if any
    pub fn push(&mut self, event: Event) -> Result<Option<Object>> {
        let Some(record) = self.builder.push(event)? else {
            return Ok(None);
        };

        for (name, value) in &record {
            self.catalog.observe(name, value);
        }

        let record = match self.compaction.as_mut() {
            Some(compaction) => compaction.compact_record(record)?,
            None => record,
        };

        self.emitted += 1;
        debug!(record = self.emitted, fields = record.len(), "record emitted");
        Ok(Some(record))
    }

    /// Number of records emitted so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Fail if the input stopped inside an open container
    pub fn check_complete(&self) -> Result<()> {
        self.builder.finish()?;
        Ok(())
    }

    /// Metadata for the records emitted so far
    pub fn summary(&self) -> LoadSummary {
        let key_map = self
            .compaction
            .as_ref()
            .map(|compaction| compaction.compactor.key_map().clone());
        let fields = self.catalog.summaries(|name| {
            key_map
                .as_ref()
                .and_then(|map| map.code_for(name))
                .map(str::to_string)
        });

        LoadSummary {
            records: self.emitted,
            key_map,
            fields,
        }
    }

    /// End the session, checking the input was complete
    pub fn finish(self) -> Result<LoadSummary> {
        self.check_complete()?;
        Ok(self.summary())
    }

    /// Feed all `events` through the session, handing each record to `listener`
    pub fn drive<I, L>(mut self, events: I, listener: &mut L) -> Result<LoadSummary>
    where
        I: IntoIterator<Item = Event>,
        L: RecordListener + ?Sized,
    {
        for event in events {
            if let Some(record) = self.push(event)? {
                listener.record_complete(record)?;
            }
        }
        self.finish()
    }

    /// Pull records lazily out of `events`
    pub fn records<I>(self, events: I) -> Records<I::IntoIter, H>
    where
        I: IntoIterator<Item = Event>,
    {
        Records {
            events: events.into_iter(),
            extractor: self,
            done: false,
        }
    }
}

impl<H: KeyHasher> Compaction<H> {
    /// Code every new top-level key of `record` first, then rename them all.
    /// Keys used by an emitted record are frozen, so later keys can only
    /// move keys that no record has been written with yet.
    fn compact_record(&mut self, record: Object) -> Result<Object> {
        let seeding = self.compactor.key_map().is_empty();

        for name in record.keys() {
            if self.compactor.code_for(name).is_some() {
                continue;
            }
            let assignment = self.compactor.assign_tracked(name)?;
            if !seeding {
                debug!(key = %name, code = %assignment.code, "assigned code to new key");
            }
        }

        let mut compacted = Object::new();
        for (name, value) in record {
            // Every key was coded above
            let code = match self.compactor.code_for(&name) {
                Some(code) => code.to_string(),
                None => name.clone(),
            };
            self.compactor.freeze(&name);
            compacted.insert(code, value);
        }
        Ok(compacted)
    }
}

/// Push-side adapter: an extractor paired with the listener its records go to
pub struct ListeningSink<'a, H, L: ?Sized> {
    extractor: RecordExtractor<H>,
    listener: &'a mut L,
}

impl<'a, H: KeyHasher, L: RecordListener + ?Sized> ListeningSink<'a, H, L> {
    pub fn new(extractor: RecordExtractor<H>, listener: &'a mut L) -> Self {
        ListeningSink { extractor, listener }
    }

    pub fn finish(self) -> Result<LoadSummary> {
        self.extractor.finish()
    }
}

impl<H: KeyHasher, L: RecordListener + ?Sized> EventSink for ListeningSink<'_, H, L> {
    fn accept(&mut self, event: Event) -> Result<()> {
        if let Some(record) = self.extractor.push(event)? {
            self.listener.record_complete(record)?;
        }
        Ok(())
    }
}

/// Lazy, single-pass sequence of the records found in an event stream
pub struct Records<I, H = Md5Hasher> {
    events: I,
    extractor: RecordExtractor<H>,
    done: bool,
}

impl<I, H: KeyHasher> Records<I, H> {
    /// Metadata for the records yielded so far
    pub fn into_summary(self) -> LoadSummary {
        self.extractor.summary()
    }
}

impl<I, H> Iterator for Records<I, H>
where
    I: Iterator<Item = Event>,
    H: KeyHasher,
{
    type Item = Result<Object>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let Some(event) = self.events.next() else {
                self.done = true;
                return self.extractor.check_complete().err().map(Err);
            };
            match self.extractor.push(event) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

//! Input adapters that turn raw bytes into [`Event`] streams

pub mod json;
pub mod xml;

use crate::error::Result;
use crate::event::Event;

/// Push-style consumer of structural events
pub trait EventSink {
    fn accept(&mut self, event: Event) -> Result<()>;
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn accept(&mut self, event: Event) -> Result<()> {
        (**self).accept(event)
    }
}

pub use json::{stream_document, stream_lines, stream_str};
pub use xml::XmlEventSource;

//! Native JSON event source
//!
//! serde_json tokenizes the input and a [`DeserializeSeed`] visitor turns the
//! tokens into [`Event`]s as they are read. No intermediate `Value` tree is
//! built, so a large records array streams through in constant memory per
//! record.
//!
//! The visitor recurses once per nesting level, so serde_json's recursion
//! limit stays on: documents nested deeper than 128 levels fail with
//! [`Error::Json`].

use super::EventSink;
use crate::error::{Error, Result};
use crate::event::{Event, Scalar};
use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};
use std::fmt;
use std::io::{BufRead, Read};

/// Visitor that forwards every token to the sink.
/// A sink failure is parked in `failure` and reported instead of the serde error.
struct EventSeed<'a, S: ?Sized> {
    sink: &'a mut S,
    failure: &'a mut Option<Error>,
}

impl<'a, S: EventSink + ?Sized> EventSeed<'a, S> {
    fn reborrow(&mut self) -> EventSeed<'_, S> {
        EventSeed {
            sink: &mut *self.sink,
            failure: &mut *self.failure,
        }
    }

    fn emit<E: de::Error>(&mut self, event: Event) -> std::result::Result<(), E> {
        self.sink.accept(event).map_err(|err| {
            *self.failure = Some(err);
            E::custom("event sink rejected the input")
        })
    }
}

impl<'de, S: EventSink + ?Sized> DeserializeSeed<'de> for EventSeed<'_, S> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de, S: EventSink + ?Sized> Visitor<'de> for EventSeed<'_, S> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(mut self, v: bool) -> std::result::Result<(), E> {
        self.emit(Event::Scalar(Scalar::Bool(v)))
    }

    fn visit_i64<E: de::Error>(mut self, v: i64) -> std::result::Result<(), E> {
        self.emit(Event::Scalar(Scalar::Int(v)))
    }

    fn visit_u64<E: de::Error>(mut self, v: u64) -> std::result::Result<(), E> {
        let scalar = match i64::try_from(v) {
            Ok(i) => Scalar::Int(i),
            Err(_) => Scalar::Float(v as f64),
        };
        self.emit(Event::Scalar(scalar))
    }

    fn visit_f64<E: de::Error>(mut self, v: f64) -> std::result::Result<(), E> {
        self.emit(Event::Scalar(Scalar::Float(v)))
    }

    fn visit_str<E: de::Error>(mut self, v: &str) -> std::result::Result<(), E> {
        self.emit(Event::Scalar(Scalar::String(v.to_string())))
    }

    fn visit_string<E: de::Error>(mut self, v: String) -> std::result::Result<(), E> {
        self.emit(Event::Scalar(Scalar::String(v)))
    }

    fn visit_unit<E: de::Error>(mut self) -> std::result::Result<(), E> {
        self.emit(Event::Scalar(Scalar::Null))
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<(), E> {
        self.visit_unit()
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(mut self, mut seq: A) -> std::result::Result<(), A::Error> {
        self.emit(Event::ArrayStart)?;
        while seq.next_element_seed(self.reborrow())?.is_some() {}
        self.emit(Event::ArrayEnd)
    }

    fn visit_map<A: MapAccess<'de>>(mut self, mut map: A) -> std::result::Result<(), A::Error> {
        self.emit(Event::ObjectStart)?;
        while let Some(key) = map.next_key::<String>()? {
            self.emit(Event::FieldName(key))?;
            map.next_value_seed(self.reborrow())?;
        }
        self.emit(Event::ObjectEnd)
    }
}

fn drive<'de, D, S>(deserializer: D, sink: &mut S) -> Result<()>
where
    D: Deserializer<'de, Error = serde_json::Error>,
    S: EventSink + ?Sized,
{
    let mut failure = None;
    let outcome = EventSeed {
        sink,
        failure: &mut failure,
    }
    .deserialize(deserializer);

    match (outcome, failure) {
        (_, Some(err)) => Err(err),
        (Err(err), None) => Err(Error::Json(err)),
        (Ok(()), None) => Ok(()),
    }
}

/// Stream one JSON document from `reader` into `sink`.
/// Trailing non-whitespace after the document is an error.
pub fn stream_document<R: Read, S: EventSink + ?Sized>(reader: R, sink: &mut S) -> Result<()> {
    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    drive(&mut deserializer, sink)?;
    deserializer.end()?;
    Ok(())
}

/// Stream one JSON document held in memory
pub fn stream_str<S: EventSink + ?Sized>(input: &str, sink: &mut S) -> Result<()> {
    let mut deserializer = serde_json::Deserializer::from_str(input);
    drive(&mut deserializer, sink)?;
    deserializer.end()?;
    Ok(())
}

/// Stream newline-delimited JSON: every non-blank line is one document.
/// Returns the number of documents read.
pub fn stream_lines<R: BufRead, S: EventSink + ?Sized>(reader: R, sink: &mut S) -> Result<usize> {
    let mut documents = 0;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        stream_str(line, sink)?;
        documents += 1;
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildError;

    #[derive(Default)]
    struct Collect(Vec<Event>);

    impl EventSink for Collect {
        fn accept(&mut self, event: Event) -> Result<()> {
            self.0.push(event);
            Ok(())
        }
    }

    /// Rejects everything after the first `limit` events
    struct Reject {
        limit: usize,
        seen: usize,
    }

    impl EventSink for Reject {
        fn accept(&mut self, _event: Event) -> Result<()> {
            self.seen += 1;
            if self.seen > self.limit {
                return Err(BuildError::UnexpectedRootScalar { kind: "test" }.into());
            }
            Ok(())
        }
    }

    fn events_of(input: &str) -> Vec<Event> {
        let mut sink = Collect::default();
        stream_str(input, &mut sink).unwrap();
        sink.0
    }

    #[test]
    fn test_object_events() {
        let events = events_of(r#"{"a": 1, "b": [true, null], "c": {"d": "x"}, "e": 1.5}"#);
        assert_eq!(
            events,
            vec![
                Event::ObjectStart,
                Event::field("a"),
                Event::scalar(1i64),
                Event::field("b"),
                Event::ArrayStart,
                Event::scalar(true),
                Event::Scalar(Scalar::Null),
                Event::ArrayEnd,
                Event::field("c"),
                Event::ObjectStart,
                Event::field("d"),
                Event::scalar("x"),
                Event::ObjectEnd,
                Event::field("e"),
                Event::scalar(1.5),
                Event::ObjectEnd,
            ]
        );
    }

    #[test]
    fn test_number_kinds() {
        let events = events_of(r#"[-3, 18446744073709551615, 2e3]"#);
        assert_eq!(events[1], Event::scalar(-3i64));
        assert_eq!(events[2], Event::scalar(18446744073709551615u64 as f64));
        assert_eq!(events[3], Event::scalar(2000.0));
    }

    #[test]
    fn test_escaped_strings() {
        let events = events_of(r#"{"k\"ey": "line\nbreak é"}"#);
        assert_eq!(events[1], Event::field("k\"ey"));
        assert_eq!(events[2], Event::scalar("line\nbreak é"));
    }

    #[test]
    fn test_reader_source() {
        let mut sink = Collect::default();
        stream_document(r#"{"a": {}}"#.as_bytes(), &mut sink).unwrap();
        assert_eq!(sink.0.len(), 5);
    }

    #[test]
    fn test_sink_error_is_surfaced() {
        let mut sink = Reject { limit: 2, seen: 0 };
        let err = stream_str(r#"{"a": 1, "b": 2}"#, &mut sink).unwrap_err();
        assert!(matches!(err, Error::Build(BuildError::UnexpectedRootScalar { .. })));
        assert_eq!(sink.seen, 3);
    }

    #[test]
    fn test_malformed_json() {
        let mut sink = Collect::default();
        let err = stream_str(r#"{"a": }"#, &mut sink).unwrap_err();
        assert!(matches!(err, Error::Json(_)));

        let err = stream_str(r#"{} {}"#, &mut Collect::default()).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_nesting_limit() {
        let shallow = format!("{}1{}", "[".repeat(100), "]".repeat(100));
        let mut sink = Collect::default();
        stream_str(&shallow, &mut sink).unwrap();
        assert_eq!(sink.0.len(), 201);

        let deep = format!("{}1{}", "[".repeat(200), "]".repeat(200));
        let err = stream_str(&deep, &mut Collect::default()).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_lines() {
        let input = "{\"n\": 1}\n\n   \n{\"n\": 2}\n";
        let mut sink = Collect::default();
        let documents = stream_lines(input.as_bytes(), &mut sink).unwrap();
        assert_eq!(documents, 2);
        assert_eq!(sink.0.len(), 8);
    }
}

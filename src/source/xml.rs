//! XML to event transcoding
//!
//! The whole document is parsed into an element tree first and then replayed
//! as events, so memory grows with the input. Mapping:
//!
//! - the document becomes `{ "<root>": <root element> }`
//! - an element with no attributes and no child elements is a scalar of its
//!   text (`null` when empty, booleans and JSON-style numbers detected)
//! - any other element is an object: attributes as `@name` fields, non-blank
//!   text as a `$` field, children as fields named after the element
//! - consecutive siblings sharing a name collapse into one array field
//! - `xmlns` declarations are dropped

use crate::error::{Result, XmlError};
use crate::event::{Event, Scalar};
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::Reader;
use regex::Regex;
use std::io::BufRead;
use tracing::debug;

static INTEGER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?(0|[1-9]\d*)$").unwrap());

static FLOAT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(0|[1-9]\d*)(\.\d+)?([eE][+-]?\d+)?$").unwrap());

/// Typed value of element or attribute text
fn auto_primitive(text: &str) -> Scalar {
    match text {
        "" => Scalar::Null,
        "true" => Scalar::Bool(true),
        "false" => Scalar::Bool(false),
        _ if INTEGER_REGEX.is_match(text) => match text.parse::<i64>() {
            Ok(i) => Scalar::Int(i),
            Err(_) => text
                .parse::<f64>()
                .map(Scalar::Float)
                .unwrap_or_else(|_| Scalar::String(text.to_string())),
        },
        _ if FLOAT_REGEX.is_match(text) => text
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Scalar::Float)
            .unwrap_or_else(|| Scalar::String(text.to_string())),
        _ => Scalar::String(text.to_string()),
    }
}

fn is_namespace_declaration(key: &str) -> bool {
    key == "xmlns" || key.starts_with("xmlns:")
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn open<R>(start: &BytesStart, reader: &Reader<R>) -> std::result::Result<Self, XmlError> {
        let mut element = Element {
            name: String::from_utf8_lossy(start.name().as_ref()).to_string(),
            ..Element::default()
        };

        for attr in start.attributes() {
            let attr = attr.map_err(|e| parse_error(reader, e.into()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            if is_namespace_declaration(&key) {
                continue;
            }
            let value = attr
                .unescape_value()
                .map_err(|e| parse_error(reader, e))?
                .to_string();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    fn is_leaf(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty()
    }
}

fn parse_error<R>(reader: &Reader<R>, source: quick_xml::Error) -> XmlError {
    XmlError::Parse {
        position: reader.buffer_position(),
        source,
    }
}

/// Parse the document element, keeping the tree on an explicit stack
fn parse_tree<R: BufRead>(mut reader: Reader<R>) -> std::result::Result<Element, XmlError> {
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| parse_error(&reader, e))?;

        // A finished element, to be attached to its parent
        let closed = match event {
            XmlEvent::Start(start) => {
                open.push(Element::open(&start, &reader)?);
                None
            }
            XmlEvent::Empty(start) => Some(Element::open(&start, &reader)?),
            XmlEvent::End(_) => open.pop(),
            XmlEvent::Text(text) => {
                let text = text.unescape().map_err(|e| parse_error(&reader, e))?;
                if let Some(current) = open.last_mut() {
                    current.text.push_str(&text);
                }
                None
            }
            XmlEvent::CData(data) => {
                if let Some(current) = open.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
                None
            }
            XmlEvent::Eof => break,
            _ => None,
        };

        if let Some(element) = closed {
            match open.last_mut() {
                Some(parent) => parent.children.push(element),
                None if root.is_some() => {
                    return Err(XmlError::TrailingElement { name: element.name });
                }
                None => root = Some(element),
            }
        }
        buf.clear();
    }

    if let Some(unclosed) = open.pop() {
        return Err(XmlError::Unclosed { name: unclosed.name });
    }
    root.ok_or(XmlError::MissingRoot)
}

enum Step<'a> {
    Value(&'a Element),
    Emit(Event),
}

/// Replay the tree as events, depth first, without recursion
fn transcode(root: &Element) -> Vec<Event> {
    let mut events = vec![Event::ObjectStart, Event::FieldName(root.name.clone())];
    let mut steps = vec![Step::Emit(Event::ObjectEnd), Step::Value(root)];

    while let Some(step) = steps.pop() {
        let element = match step {
            Step::Emit(event) => {
                events.push(event);
                continue;
            }
            Step::Value(element) => element,
        };

        if element.is_leaf() {
            events.push(Event::Scalar(auto_primitive(&element.text)));
            continue;
        }

        events.push(Event::ObjectStart);
        for (key, value) in &element.attributes {
            events.push(Event::FieldName(format!("@{key}")));
            events.push(Event::Scalar(auto_primitive(value)));
        }
        if !element.text.trim().is_empty() {
            events.push(Event::field("$"));
            events.push(Event::Scalar(auto_primitive(&element.text)));
        }

        let mut ahead = Vec::new();
        for run in element.children.chunk_by(|a, b| a.name == b.name) {
            ahead.push(Step::Emit(Event::FieldName(run[0].name.clone())));
            if let [only] = run {
                ahead.push(Step::Value(only));
            } else {
                ahead.push(Step::Emit(Event::ArrayStart));
                ahead.extend(run.iter().map(Step::Value));
                ahead.push(Step::Emit(Event::ArrayEnd));
            }
        }
        ahead.push(Step::Emit(Event::ObjectEnd));
        steps.extend(ahead.into_iter().rev());
    }

    events
}

/// Buffered event stream of one XML document
#[derive(Debug)]
pub struct XmlEventSource {
    events: std::vec::IntoIter<Event>,
}

impl XmlEventSource {
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let root = parse_tree(Reader::from_reader(reader))?;
        let events = transcode(&root);
        debug!(root = %root.name, events = events.len(), "transcoded XML document");
        Ok(XmlEventSource {
            events: events.into_iter(),
        })
    }

    pub fn parse(xml: &str) -> Result<Self> {
        Self::from_reader(xml.as_bytes())
    }
}

impl Iterator for XmlEventSource {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        self.events.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.events.size_hint()
    }
}

impl ExactSizeIterator for XmlEventSource {}

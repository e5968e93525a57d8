//! Stack machine that rebuilds documents from a flat event stream
//!
//! Containers are kept as [`Frame`]s while they are open. Closing a frame
//! attaches it to its parent, or completes the root document. When a
//! records-array name is configured, objects that close directly inside that
//! array are handed out one by one and the array itself is never built.

use crate::error::BuildError;
use crate::event::Event;
use crate::types::{Document, Object};
use serde_json::Value;
use tracing::debug;

/// One open container
#[derive(Debug)]
enum Frame {
    Object {
        /// Name under which this object attaches to its parent
        field: Option<String>,
        /// Field name waiting for its value
        pending: Option<String>,
        contents: Object,
    },
    Array {
        field: Option<String>,
        contents: Vec<Document>,
    },
    /// The designated records array; its objects are emitted, not collected
    Records { name: String, emitted: usize },
}

/// Rebuilds documents from events; one instance per input stream
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    records_array: Option<String>,
    stack: Vec<Frame>,
    depth: usize,
    /// A records array was opened under the current root
    records_seen: bool,
    records_open: bool,
}

impl DocumentBuilder {
    /// A builder that completes one document per root object
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder that emits the objects of the array called `name` as records
    pub fn with_records_array(name: impl Into<String>) -> Self {
        DocumentBuilder {
            records_array: Some(name.into()),
            ..Self::default()
        }
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// True when no container is open
    pub fn is_idle(&self) -> bool {
        self.stack.is_empty()
    }

    /// Consume one event, returning a record if the event completed one
    pub fn push(&mut self, event: Event) -> Result<Option<Object>, BuildError> {
        match event {
            Event::ObjectStart => {
                let field = self.take_slot()?;
                self.stack.push(Frame::Object {
                    field,
                    pending: None,
                    contents: Object::new(),
                });
                self.depth += 1;
                Ok(None)
            }
            Event::ArrayStart => {
                if self.stack.is_empty() {
                    return Err(BuildError::InvalidRoot {
                        found: Event::ArrayStart.kind(),
                    });
                }
                let field = self.take_slot()?;
                let frame = match field {
                    Some(name) if !self.records_open && self.is_records_array(&name) => {
                        debug!(array = %name, depth = self.depth, "entering records array");
                        self.records_open = true;
                        self.records_seen = true;
                        Frame::Records { name, emitted: 0 }
                    }
                    field => Frame::Array {
                        field,
                        contents: Vec::new(),
                    },
                };
                self.stack.push(frame);
                self.depth += 1;
                Ok(None)
            }
            Event::FieldName(name) => self.set_field(name),
            Event::Scalar(scalar) => {
                if self.stack.is_empty() {
                    return Err(BuildError::UnexpectedRootScalar { kind: scalar.kind() });
                }
                let field = self.take_slot()?;
                self.attach(field, Value::from(scalar))
            }
            Event::ObjectEnd => self.close_object(),
            Event::ArrayEnd => self.close_array(),
        }
    }

    /// Check that the stream ended with every container closed
    pub fn finish(&self) -> Result<(), BuildError> {
        if self.stack.is_empty() {
            Ok(())
        } else {
            Err(BuildError::unbalanced(
                self.depth,
                format!("input ended with {} container(s) still open", self.stack.len()),
            ))
        }
    }

    fn is_records_array(&self, name: &str) -> bool {
        self.records_array.as_deref() == Some(name)
    }

    /// Claim the position a new value will occupy in the top frame.
    /// Objects hand out their pending field name; arrays need none.
    fn take_slot(&mut self) -> Result<Option<String>, BuildError> {
        let depth = self.depth;
        match self.stack.last_mut() {
            None => Ok(None),
            Some(Frame::Object { pending, .. }) => match pending.take() {
                Some(name) => Ok(Some(name)),
                None => Err(BuildError::unbalanced(depth, "object value without a field name")),
            },
            Some(Frame::Array { .. }) | Some(Frame::Records { .. }) => Ok(None),
        }
    }

    fn set_field(&mut self, name: String) -> Result<Option<Object>, BuildError> {
        let depth = self.depth;
        match self.stack.last_mut() {
            Some(Frame::Object { pending, .. }) => {
                if let Some(previous) = pending {
                    return Err(BuildError::unbalanced(
                        depth,
                        format!("field {name:?} follows field {previous:?} without a value"),
                    ));
                }
                *pending = Some(name);
                Ok(None)
            }
            Some(_) => Err(BuildError::unbalanced(
                depth,
                format!("field {name:?} inside an array"),
            )),
            None => Err(BuildError::unbalanced(
                depth,
                format!("field {name:?} outside of any object"),
            )),
        }
    }

    /// Put a finished value into the top frame
    fn attach(&mut self, field: Option<String>, value: Document) -> Result<Option<Object>, BuildError> {
        let depth = self.depth;
        match self.stack.last_mut() {
            Some(Frame::Object { contents, .. }) => {
                let name = field.ok_or_else(|| {
                    BuildError::unbalanced(depth, "object value without a field name")
                })?;
                // A repeated field name replaces the earlier value
                contents.insert(name, value);
                Ok(None)
            }
            Some(Frame::Array { contents, .. }) => {
                contents.push(value);
                Ok(None)
            }
            Some(Frame::Records { name, emitted }) => match value {
                Value::Object(record) => {
                    *emitted += 1;
                    debug!(array = %name, index = *emitted - 1, "record complete");
                    Ok(Some(record))
                }
                other => {
                    debug!(array = %name, value = %other, "skipping non-object element of records array");
                    Ok(None)
                }
            },
            None => Err(BuildError::unbalanced(depth, "value outside of any container")),
        }
    }

    fn close_object(&mut self) -> Result<Option<Object>, BuildError> {
        let (field, contents) = match self.stack.pop() {
            Some(Frame::Object {
                field,
                pending: None,
                contents,
            }) => (field, contents),
            Some(Frame::Object {
                pending: Some(name), ..
            }) => {
                return Err(BuildError::unbalanced(
                    self.depth,
                    format!("object closed while field {name:?} has no value"),
                ))
            }
            Some(_) => {
                return Err(BuildError::unbalanced(self.depth, "object end closes an array"))
            }
            None => {
                return Err(BuildError::unbalanced(self.depth, "object end without an open object"))
            }
        };
        self.depth -= 1;

        if self.stack.is_empty() {
            let records_seen = std::mem::take(&mut self.records_seen);
            if records_seen {
                debug!("root object closed after its records array; discarding it");
                return Ok(None);
            }
            if let Some(name) = &self.records_array {
                debug!(array = %name, "records array not found; emitting the root object");
            }
            return Ok(Some(contents));
        }

        self.attach(field, Value::Object(contents))
    }

    fn close_array(&mut self) -> Result<Option<Object>, BuildError> {
        match self.stack.pop() {
            Some(Frame::Array { field, contents }) => {
                self.depth -= 1;
                self.attach(field, Value::Array(contents))
            }
            Some(Frame::Records { name, emitted }) => {
                self.depth -= 1;
                self.records_open = false;
                debug!(array = %name, records = emitted, "records array closed");
                Ok(None)
            }
            Some(Frame::Object { .. }) => {
                Err(BuildError::unbalanced(self.depth, "array end closes an object"))
            }
            None => Err(BuildError::unbalanced(self.depth, "array end without an open array")),
        }
    }
}

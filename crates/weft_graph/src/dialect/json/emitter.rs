use alloc::string::String;
use alloc::vec::Vec;
use std::io;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Value};

use crate::error::ErrorKind;
use crate::event::{Marker, Markers};
use crate::info::Hint;
use crate::ser::Emitter;

enum Node {
    Object {
        key: Option<String>,
        tag: String,
        body: Map<String, Value>,
    },
    Sequence {
        key: String,
        items: Vec<Value>,
    },
}

/// Builds a [`Value`] tree from writer output.
///
/// Members keep the order they are emitted in; markers lead their body.
#[derive(Default)]
pub struct JsonEmitter {
    stack: Vec<Node>,
    /// Member name imposed by an enclosing wrapper.
    wrapper_key: Option<String>,
    root: Option<Value>,
}

impl JsonEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished document.
    pub fn into_value(self) -> Result<Value, ErrorKind> {
        match (self.stack.is_empty(), self.root) {
            (true, Some(root)) => Ok(root),
            _ => Err(ErrorKind::unexpected("end of output", "before the root object closed")),
        }
    }

    fn member_key(&mut self, name: &str) -> String {
        self.wrapper_key.take().unwrap_or_else(|| name.into())
    }

    fn place(&mut self, key: Option<String>, value: Value) -> Result<(), ErrorKind> {
        match (self.stack.last_mut(), key) {
            (Some(Node::Object { body, .. }), Some(key)) => {
                body.insert(key, value);
                Ok(())
            }
            (Some(Node::Sequence { items, .. }), _) => {
                items.push(value);
                Ok(())
            }
            (None, None) if self.root.is_none() => {
                self.root = Some(value);
                Ok(())
            }
            _ => Err(ErrorKind::unexpected("value", "with no member name")),
        }
    }
}

impl Emitter for JsonEmitter {
    #[inline]
    fn begin_document(&mut self, _uses_markers: bool) -> Result<(), ErrorKind> {
        Ok(())
    }

    fn start_object(&mut self, key: Option<&str>, tag: &str, markers: &Markers) -> Result<(), ErrorKind> {
        let key = self.wrapper_key.take().or_else(|| key.map(String::from));
        let mut body = Map::new();
        if let Some(id) = &markers.id {
            body.insert(Marker::JSON_ID.into(), Value::String(id.clone()));
        }
        if let Some(reference) = &markers.reference {
            body.insert(Marker::JSON_REF.into(), Value::String(reference.clone()));
        }
        self.stack.push(Node::Object {
            key,
            tag: tag.into(),
            body,
        });
        Ok(())
    }

    fn end_object(&mut self, _tag: &str) -> Result<(), ErrorKind> {
        match self.stack.pop() {
            Some(Node::Object { key, tag, body }) => {
                let mut container = Map::new();
                container.insert(tag, Value::Object(body));
                self.place(key, Value::Object(container))
            }
            _ => Err(ErrorKind::unexpected("end of object", "outside an object")),
        }
    }

    fn scalar(&mut self, name: &str, _hint: Hint, text: &str) -> Result<(), ErrorKind> {
        let key = self.member_key(name);
        self.place(Some(key), Value::String(text.into()))
    }

    fn start_sequence(&mut self, name: &str) -> Result<(), ErrorKind> {
        let key = self.member_key(name);
        self.stack.push(Node::Sequence {
            key,
            items: Vec::new(),
        });
        Ok(())
    }

    fn sequence_scalar(&mut self, _item_tag: &str, text: &str) -> Result<(), ErrorKind> {
        self.place(None, Value::String(text.into()))
    }

    fn end_sequence(&mut self, _name: &str) -> Result<(), ErrorKind> {
        match self.stack.pop() {
            Some(Node::Sequence { key, items }) => self.place(Some(key), Value::Array(items)),
            _ => Err(ErrorKind::unexpected("end of sequence", "outside a sequence")),
        }
    }

    fn start_wrapper(&mut self, name: &str) -> Result<(), ErrorKind> {
        self.wrapper_key = Some(name.into());
        Ok(())
    }

    fn end_wrapper(&mut self, _name: &str) -> Result<(), ErrorKind> {
        self.wrapper_key = None;
        Ok(())
    }
}

/// Serializes `value` into `out`, indented by `indent` spaces when `pretty`.
pub fn write_value<W: io::Write>(
    value: &Value,
    out: W,
    pretty: bool,
    indent: usize,
) -> Result<(), ErrorKind> {
    if pretty {
        let indent = " ".repeat(indent);
        let mut serializer = Serializer::with_formatter(out, PrettyFormatter::with_indent(indent.as_bytes()));
        value.serialize(&mut serializer)?;
    } else {
        serde_json::to_writer(out, value)?;
    }
    Ok(())
}

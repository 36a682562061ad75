// JSON backend over serde_json (member order preserved).

use std::borrow::Cow;

use serde_json::{Map, Number};

use super::{Backend, Document, Emit, Group, Node};
use crate::error::Error;
use crate::loader::Options;
use crate::value::Value;

const NAME: &str = "json";

#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Backend for Json {
    type Document<'src> = JsonDocument;
    type Emitter = JsonEmitter;

    fn name(&self) -> &'static str {
        NAME
    }

    // serde_json stops at 128 levels on its own, whatever `max_depth` says.
    fn parse<'src>(&self, content: &'src str, _options: &Options) -> Result<JsonDocument, Error> {
        serde_json::from_str(content)
            .map(JsonDocument)
            .map_err(|error| Error::IllFormed { backend: NAME, message: error.to_string() })
    }

    fn emitter(&self) -> JsonEmitter {
        JsonEmitter::default()
    }
}

pub struct JsonDocument(serde_json::Value);

impl Document for JsonDocument {
    type Node<'a> = JsonNode<'a>;

    fn root(&self) -> JsonNode<'_> {
        JsonNode { value: Some(&self.0), label: None }
    }
}

/// A JSON value plus the member key it was reached through, if any.
#[derive(Debug, Clone, Copy)]
pub struct JsonNode<'a> {
    value: Option<&'a serde_json::Value>,
    label: Option<&'a str>,
}

impl Node for JsonNode<'_> {
    fn is_valid(&self) -> bool {
        self.value.is_some()
    }

    // null members count as absent
    fn child(&self, name: &str) -> Self {
        let value = self.value.and_then(|value| value.get(name)).filter(|value| !value.is_null());
        JsonNode { value, label: None }
    }

    fn text(&self) -> Option<Cow<'_, str>> {
        match self.value? {
            serde_json::Value::String(text) => Some(Cow::Borrowed(text.as_str())),
            serde_json::Value::Number(number) => Some(Cow::Owned(number.to_string())),
            serde_json::Value::Bool(flag) => Some(Cow::Owned(flag.to_string())),
            _ => None,
        }
    }

    fn label(&self) -> Option<&str> {
        self.label
    }

    fn has_children(&self) -> bool {
        match self.value {
            Some(serde_json::Value::Array(items)) => !items.is_empty(),
            Some(serde_json::Value::Object(members)) => !members.is_empty(),
            _ => false,
        }
    }

    fn for_each_child<F>(&self, mut visit: F) -> Result<(), Error>
    where
        F: FnMut(Self) -> Result<(), Error>,
    {
        match self.value {
            Some(serde_json::Value::Array(items)) => {
                for item in items {
                    visit(JsonNode { value: Some(item), label: None })?;
                }
            }
            Some(serde_json::Value::Object(members)) => {
                for (key, member) in members {
                    visit(JsonNode { value: Some(member), label: Some(key.as_str()) })?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct JsonEmitter {
    stack: Vec<(String, serde_json::Value)>,
    root: Option<serde_json::Value>,
}

impl JsonEmitter {
    fn attach(&mut self, key: String, value: serde_json::Value) -> Result<(), Error> {
        match self.stack.last_mut() {
            Some((_, serde_json::Value::Array(items))) => items.push(value),
            Some((_, serde_json::Value::Object(members))) => {
                members.insert(key, value);
            }
            Some(_) => {
                return Err(Error::IllFormed {
                    backend: NAME,
                    message: "scalar cannot hold children".into(),
                });
            }
            None if self.root.is_none() => self.root = Some(value),
            None => {
                return Err(Error::IllFormed {
                    backend: NAME,
                    message: "more than one root value".into(),
                });
            }
        }
        Ok(())
    }
}

fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Bool(flag) => serde_json::Value::Bool(*flag),
        Value::Int(number) => serde_json::Value::Number(Number::from(*number)),
        Value::UInt(number) => serde_json::Value::Number(Number::from(*number)),
        // NaN and infinities have no JSON spelling
        Value::Float(number) => Number::from_f64(*number)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        other => serde_json::Value::String(other.as_text().unwrap_or_default()),
    }
}

impl Emit for JsonEmitter {
    fn open(&mut self, name: &str, label: Option<&str>, group: Group) -> Result<(), Error> {
        let container = match group {
            Group::Sequence => serde_json::Value::Array(Vec::new()),
            Group::Record | Group::Map => serde_json::Value::Object(Map::new()),
        };
        self.stack.push((label.unwrap_or(name).to_owned(), container));
        Ok(())
    }

    fn scalar(&mut self, name: &str, label: Option<&str>, value: &Value) -> Result<(), Error> {
        self.attach(label.unwrap_or(name).to_owned(), to_json(value))
    }

    fn close(&mut self) -> Result<(), Error> {
        let Some((key, value)) = self.stack.pop() else {
            return Err(Error::IllFormed {
                backend: NAME,
                message: "close without open value".into(),
            });
        };
        self.attach(key, value)
    }

    fn finish(self) -> Result<String, Error> {
        if !self.stack.is_empty() {
            return Err(Error::IllFormed { backend: NAME, message: "value left open".into() });
        }
        let root = self.root.unwrap_or(serde_json::Value::Null);
        serde_json::to_string_pretty(&root)
            .map_err(|error| Error::IllFormed { backend: NAME, message: error.to_string() })
    }
}

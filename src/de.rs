//! Deserialization engine.
//!
//! Walks a schema's fields in declaration order, finds the matching child of
//! the current node, decodes it by shape and stores it through the instance's
//! accessor. The first failure aborts the walk; fields stored before it stay
//! stored.

use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::convert;
use crate::error::{Error, Segment};
use crate::loader::Options;
use crate::parser::{Backend, Document, Node};
use crate::record::Instance;
use crate::schema::{ScalarKind, Schema, Shape};
use crate::value::{Fields, Value};

/// Parse `content` with `backend` and fill `instance` from the root node.
pub fn deserialize<B: Backend>(
    backend: &B,
    options: &Options,
    instance: &mut dyn Instance,
    content: &str,
) -> Result<(), Error> {
    if content.is_empty() {
        return Err(Error::EmptyContent);
    }
    let document = backend.parse(content, options)?;
    Decoder { max_depth: options.max_depth }.fill(document.root(), instance)
}

struct Decoder {
    max_depth: usize,
}

impl Decoder {
    fn fill<N: Node>(&self, root: N, instance: &mut dyn Instance) -> Result<(), Error> {
        let schema = instance.schema();
        self.visit_fields(root, schema.get(), 0, |index, value| {
            instance
                .set_field(index, value)
                .map_err(|mismatch| Error::type_mismatch(mismatch.to_string()))
        })
    }

    fn visit_fields<N, F>(
        &self,
        node: N,
        schema: &Schema,
        depth: usize,
        mut store: F,
    ) -> Result<(), Error>
    where
        N: Node,
        F: FnMut(usize, Value) -> Result<(), Error>,
    {
        for (index, field) in schema.fields().iter().enumerate() {
            trace!(record = schema.name(), field = field.name(), depth, "decoding field");
            let within = |error: Error| error.within(Segment::Field(field.name().to_owned()));
            let child = node.child(field.name());
            if !child.is_valid() {
                if field.is_optional() {
                    continue;
                }
                return Err(within(Error::missing()));
            }
            let value = self.decode(child, field.shape(), depth + 1).map_err(within)?;
            store(index, value).map_err(within)?;
        }
        Ok(())
    }

    fn decode<N: Node>(&self, node: N, shape: &Shape, depth: usize) -> Result<Value, Error> {
        if depth > self.max_depth {
            warn!(limit = self.max_depth, "document nesting exceeds the depth limit");
            return Err(Error::too_deep(self.max_depth));
        }
        match shape {
            Shape::Scalar(kind) => Self::scalar(node, *kind),
            Shape::Optional(inner) => {
                let value = self.decode(node, inner, depth)?;
                Ok(Value::Opt(Some(Box::new(value))))
            }
            Shape::Sequence(inner) => {
                let mut items = Vec::new();
                node.for_each_child(|item| {
                    let value = self
                        .decode(item, inner, depth + 1)
                        .map_err(|error| error.within(Segment::Index(items.len())))?;
                    items.push(value);
                    Ok(())
                })?;
                Ok(Value::Seq(items))
            }
            Shape::Map(key_kind, inner) => {
                let mut entries = IndexMap::new();
                let mut position = 0;
                node.for_each_child(|entry| {
                    let Some(key) = entry.label().map(str::to_owned) else {
                        return Err(Error::missing().within(Segment::Index(position)));
                    };
                    convert::convert(*key_kind, &key).map_err(|source| {
                        Error::extracting(source).within(Segment::Key(key.clone()))
                    })?;
                    let value = self
                        .decode(entry, inner, depth + 1)
                        .map_err(|error| error.within(Segment::Key(key.clone())))?;
                    // duplicate keys: last one wins
                    entries.insert(key, value);
                    position += 1;
                    Ok(())
                })?;
                Ok(Value::Map(entries))
            }
            Shape::Record(schema) | Shape::OwnedNode(schema) => {
                let schema = schema.get();
                let mut fields = Fields::new();
                self.visit_fields(node, schema, depth, |index, value| {
                    fields.insert(schema.fields()[index].name().to_owned(), value);
                    Ok(())
                })?;
                Ok(Value::Record(fields))
            }
            Shape::Variant(alternatives) => self.variant(node, alternatives, depth),
        }
    }

    fn scalar<N: Node>(node: N, kind: ScalarKind) -> Result<Value, Error> {
        let text = node.text().ok_or_else(Error::missing)?;
        convert::convert(kind, &text).map_err(Error::extracting)
    }

    /// Structured nodes select among record/container alternatives, text
    /// nodes among scalar ones; declaration order breaks ties.
    fn variant<N: Node>(
        &self,
        node: N,
        alternatives: &[Shape],
        depth: usize,
    ) -> Result<Value, Error> {
        let select = |index: usize, value: Value| Value::Variant { index, value: Box::new(value) };

        if node.has_children() {
            let mut rejected = None;
            for (index, alternative) in alternatives.iter().enumerate() {
                if !alternative.is_structural() {
                    continue;
                }
                match self.decode(node, alternative, depth) {
                    Ok(value) => return Ok(select(index, value)),
                    Err(error @ Error::DepthExceeded { .. }) => return Err(error),
                    Err(error) => {
                        trace!(alternative = %alternative, %error, "variant alternative rejected");
                        rejected = Some(error);
                    }
                }
            }
            return Err(Error::type_mismatch(match rejected {
                Some(error) => format!("no structured alternative accepts the node ({error})"),
                None => "node has children but every alternative is a scalar".to_owned(),
            }));
        }

        let Some(text) = node.text().filter(|text| !text.is_empty()) else {
            return Err(Error::type_mismatch("empty node cannot select an alternative"));
        };
        for (index, alternative) in alternatives.iter().enumerate() {
            if alternative.is_structural() {
                continue;
            }
            if let Ok(value) = self.decode(node, alternative, depth) {
                return Ok(select(index, value));
            }
        }
        Err(Error::type_mismatch(format!("no alternative accepts {text:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Json;
    use crate::record::DynRecord;
    use crate::schema::{Field, SchemaRef};
    use once_cell::sync::OnceCell;
    use pretty_assertions::assert_eq;

    fn nested() -> &'static Schema {
        static SCHEMA: OnceCell<Schema> = OnceCell::new();
        SCHEMA.get_or_init(|| {
            Schema::new(
                "Nested",
                vec![
                    Field::new("name", Shape::Scalar(ScalarKind::String)),
                    Field::new(
                        "child",
                        Shape::Optional(Box::new(Shape::OwnedNode(SchemaRef::Static(nested)))),
                    ),
                ],
            )
        })
    }

    fn load(content: &str, max_depth: usize) -> Result<DynRecord, Error> {
        let mut record = DynRecord::new(SchemaRef::Static(nested));
        deserialize(&Json, &Options { max_depth }, &mut record, content)?;
        Ok(record)
    }

    #[test]
    fn empty_content_is_checked_before_parsing() {
        assert!(matches!(load("", 8), Err(Error::EmptyContent)));
        assert!(matches!(load(" ", 8), Err(Error::IllFormed { .. })));
    }

    #[test]
    fn depth_guard_stops_deep_documents() {
        let shallow = r#"{"name": "a", "child": {"name": "b"}}"#;
        let record = load(shallow, 8).unwrap();
        assert_eq!(record.get("name"), Some(&Value::Str("a".into())));

        let mut deep = String::from(r#"{"name": "leaf"}"#);
        for _ in 0..10 {
            deep = format!(r#"{{"name": "n", "child": {deep}}}"#);
        }
        let error = load(&deep, 4).unwrap_err();
        assert!(matches!(error, Error::DepthExceeded { limit: 4, .. }));
        assert_eq!(
            error.path().map(ToString::to_string).as_deref(),
            Some("child.child.child.child.name")
        );
        assert!(load(&deep, 64).is_ok());
    }

    #[test]
    fn missing_nested_field_reports_full_path() {
        let error = load(r#"{"name": "a", "child": {"child": {}}}"#, 8).unwrap_err();
        assert_eq!(error.to_string(), "missing field `child.name`");
    }
}

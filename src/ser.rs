//! Serialization engine: the mirror of [`crate::de`].
//!
//! Reads every field through the instance accessor in declaration order and
//! emits one node per present value. Absent optional values are left out of
//! the document entirely.

use tracing::trace;

use crate::error::{Error, Segment};
use crate::parser::{Backend, Emit, Group};
use crate::record::Instance;
use crate::schema::{Field, ScalarKind, Shape};
use crate::value::Value;

/// Element name of sequence items and map entries.
pub const ITEM_NAME: &str = "value";

pub fn serialize<B: Backend>(backend: &B, instance: &dyn Instance) -> Result<String, Error> {
    let schema = instance.schema();
    let schema = schema.get();
    let mut emitter = backend.emitter();
    emitter.open(schema.name(), None, Group::Record)?;
    for (index, field) in schema.fields().iter().enumerate() {
        let value = instance.field(index);
        emit_field(&mut emitter, field, value.as_ref())?;
    }
    emitter.close()?;
    emitter.finish()
}

fn emit_field<E: Emit>(emitter: &mut E, field: &Field, value: Option<&Value>) -> Result<(), Error> {
    trace!(field = field.name(), "encoding field");
    let result = match value {
        None | Some(Value::Opt(None)) if field.is_optional() => return Ok(()),
        None => Err(Error::missing()),
        Some(value) => emit_value(emitter, field.name(), None, field.shape(), value),
    };
    result.map_err(|error| error.within(Segment::Field(field.name().to_owned())))
}

fn emit_value<E: Emit>(
    emitter: &mut E,
    name: &str,
    label: Option<&str>,
    shape: &Shape,
    value: &Value,
) -> Result<(), Error> {
    match (shape, value) {
        (Shape::Optional(_), Value::Opt(None)) => Ok(()),
        (Shape::Optional(inner), Value::Opt(Some(value))) => {
            emit_value(emitter, name, label, inner, value)
        }
        (Shape::Optional(inner), value) => emit_value(emitter, name, label, inner, value),
        (Shape::Scalar(kind), value) if scalar_fits(*kind, value) => {
            emitter.scalar(name, label, value)
        }
        (Shape::Sequence(inner), Value::Seq(items)) => {
            emitter.open(name, label, Group::Sequence)?;
            for (index, item) in items.iter().enumerate() {
                emit_value(emitter, ITEM_NAME, None, inner, item)
                    .map_err(|error| error.within(Segment::Index(index)))?;
            }
            emitter.close()
        }
        (Shape::Map(_, inner), Value::Map(entries)) => {
            emitter.open(name, label, Group::Map)?;
            for (key, entry) in entries {
                emit_value(emitter, ITEM_NAME, Some(key), inner, entry)
                    .map_err(|error| error.within(Segment::Key(key.clone())))?;
            }
            emitter.close()
        }
        (Shape::Variant(alternatives), Value::Variant { index, value }) => {
            match alternatives.get(*index) {
                Some(alternative) => emit_value(emitter, name, label, alternative, value),
                None => Err(Error::type_mismatch(format!("variant has no alternative {index}"))),
            }
        }
        (Shape::Record(schema) | Shape::OwnedNode(schema), Value::Record(fields)) => {
            emitter.open(name, label, Group::Record)?;
            for field in schema.get().fields() {
                emit_field(emitter, field, fields.get(field.name()))?;
            }
            emitter.close()
        }
        (shape, value) => Err(Error::type_mismatch(format!(
            "cannot write a {} as {shape}",
            value.kind_name()
        ))),
    }
}

fn scalar_fits(kind: ScalarKind, value: &Value) -> bool {
    match value {
        Value::Bool(_) => kind == ScalarKind::Bool,
        Value::Int(_) | Value::UInt(_) => kind.is_integer(),
        Value::Float(_) => matches!(kind, ScalarKind::F32 | ScalarKind::F64),
        Value::Str(_) => kind == ScalarKind::String,
        _ => false,
    }
}

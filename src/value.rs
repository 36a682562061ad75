//! Dynamic values exchanged between the engines and instances.
//!
//! The engines decode a document node into a [`Value`] according to a
//! [`Shape`], then hand it to the instance through its accessor. Typed Rust
//! fields cross that boundary with [`FromValue`] / [`IntoValue`]; [`Describe`]
//! tells the descriptor table which shape a Rust type has.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;

use indexmap::IndexMap;
use thiserror::Error;

use crate::convert;
use crate::schema::{ScalarKind, SchemaRef, Shape};

/// Decoded record fields keyed by field name, in declaration order.
pub type Fields = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Seq(Vec<Value>),
    /// Keys are label text already validated against the key kind.
    Map(IndexMap<String, Value>),
    Opt(Option<Box<Value>>),
    Variant { index: usize, value: Box<Value> },
    Record(Fields),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "signed integer",
            Value::UInt(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "map",
            Value::Opt(_) => "optional",
            Value::Variant { .. } => "variant",
            Value::Record(_) => "record",
        }
    }

    /// Text spelling of a scalar, as written into documents.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Bool(v) => Some(v.to_string()),
            Value::Int(v) => Some(v.to_string()),
            Value::UInt(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::Str(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => write!(f, "<{}>", self.kind_name()),
        }
    }
}

/// A value did not have the variant a typed field expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, found {found}")]
pub struct Mismatch {
    pub expected: &'static str,
    pub found: &'static str,
}

impl Mismatch {
    pub fn new(expected: &'static str, value: &Value) -> Self {
        Self { expected, found: value.kind_name() }
    }
}

pub trait Describe {
    fn shape() -> Shape;
}

pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, Mismatch>;
}

pub trait IntoValue {
    fn to_value(&self) -> Value;
}

/// Scalars usable as map keys; keys travel as label text.
pub trait MapKey: Sized {
    const KIND: ScalarKind;
    fn from_label(label: &str) -> Result<Self, Mismatch>;
    fn to_label(&self) -> String;
}

// ------------------------------- Scalars --------------------------------- //

macro_rules! integer_scalar {
    ($($ty:ty => $kind:ident as $variant:ident($wide:ty)),* $(,)?) => {$(
        impl Describe for $ty {
            fn shape() -> Shape {
                Shape::Scalar(ScalarKind::$kind)
            }
        }

        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, Mismatch> {
                let converted = match &value {
                    Value::Int(v) => <$ty>::try_from(*v).ok(),
                    Value::UInt(v) => <$ty>::try_from(*v).ok(),
                    _ => None,
                };
                converted.ok_or_else(|| Mismatch::new(stringify!($ty), &value))
            }
        }

        impl IntoValue for $ty {
            fn to_value(&self) -> Value {
                Value::$variant(<$wide>::from(*self))
            }
        }

        impl MapKey for $ty {
            const KIND: ScalarKind = ScalarKind::$kind;
            fn from_label(label: &str) -> Result<Self, Mismatch> {
                let value = convert::parse_integer(Self::KIND, label)
                    .map_err(|_| Mismatch { expected: stringify!($ty), found: "label" })?;
                <$ty>::from_value(value)
            }
            fn to_label(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

integer_scalar! {
    i8 => I8 as Int(i64), i16 => I16 as Int(i64), i32 => I32 as Int(i64), i64 => I64 as Int(i64),
    u8 => U8 as UInt(u64), u16 => U16 as UInt(u64), u32 => U32 as UInt(u64), u64 => U64 as UInt(u64),
}

impl Describe for bool {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::Bool)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(Mismatch::new("bool", &other)),
        }
    }
}

impl IntoValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl MapKey for bool {
    const KIND: ScalarKind = ScalarKind::Bool;
    fn from_label(label: &str) -> Result<Self, Mismatch> {
        convert::parse_bool(label).map_err(|_| Mismatch { expected: "bool", found: "label" })
    }
    fn to_label(&self) -> String {
        self.to_string()
    }
}

impl Describe for f64 {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::F64)
    }
}

impl Describe for f32 {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::F32)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Float(v) => Ok(v),
            other => Err(Mismatch::new("f64", &other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Float(v) => Ok(v as f32),
            other => Err(Mismatch::new("f32", &other)),
        }
    }
}

impl IntoValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl IntoValue for f32 {
    // through the shortest decimal spelling so 1.2f32 stays 1.2
    fn to_value(&self) -> Value {
        Value::Float(self.to_string().parse().unwrap_or(f64::from(*self)))
    }
}

impl Describe for String {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::String)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Str(v) => Ok(v),
            other => Err(Mismatch::new("string", &other)),
        }
    }
}

impl IntoValue for String {
    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }
}

impl MapKey for String {
    const KIND: ScalarKind = ScalarKind::String;
    fn from_label(label: &str) -> Result<Self, Mismatch> {
        Ok(label.to_owned())
    }
    fn to_label(&self) -> String {
        self.clone()
    }
}

// ------------------------------ Containers ------------------------------- //

impl<T: Describe> Describe for Vec<T> {
    fn shape() -> Shape {
        Shape::Sequence(Box::new(T::shape()))
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Seq(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(Mismatch::new("sequence", &other)),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(IntoValue::to_value).collect())
    }
}

impl<T: Describe> Describe for Option<T> {
    fn shape() -> Shape {
        Shape::Optional(Box::new(T::shape()))
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Opt(None) => Ok(None),
            Value::Opt(Some(inner)) => T::from_value(*inner).map(Some),
            // a bare value is the present case
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn to_value(&self) -> Value {
        Value::Opt(self.as_ref().map(|inner| Box::new(inner.to_value())))
    }
}

fn entries_from_value<K, V>(
    value: Value,
) -> Result<impl Iterator<Item = Result<(K, V), Mismatch>>, Mismatch>
where
    K: MapKey,
    V: FromValue,
{
    match value {
        Value::Map(entries) => Ok(entries
            .into_iter()
            .map(|(key, value)| Ok((K::from_label(&key)?, V::from_value(value)?)))),
        other => Err(Mismatch::new("map", &other)),
    }
}

fn entries_to_value<'a, K, V>(entries: impl Iterator<Item = (&'a K, &'a V)>) -> Value
where
    K: MapKey + 'a,
    V: IntoValue + 'a,
{
    Value::Map(entries.map(|(key, value)| (key.to_label(), value.to_value())).collect())
}

macro_rules! map_container {
    ($($map:ident [$($bound:tt)*]),* $(,)?) => {$(
        impl<K: MapKey, V: Describe> Describe for $map<K, V> {
            fn shape() -> Shape {
                Shape::Map(K::KIND, Box::new(V::shape()))
            }
        }

        impl<K: MapKey + $($bound)*, V: FromValue> FromValue for $map<K, V> {
            fn from_value(value: Value) -> Result<Self, Mismatch> {
                entries_from_value(value)?.collect()
            }
        }

        impl<K: MapKey, V: IntoValue> IntoValue for $map<K, V> {
            fn to_value(&self) -> Value {
                entries_to_value(self.iter())
            }
        }
    )*};
}

map_container! {
    IndexMap [Eq + Hash],
    HashMap [Eq + Hash],
    BTreeMap [Ord],
}

// ------------------------------ Owned nodes ------------------------------ //

impl<T: crate::record::Record> Describe for Box<T> {
    fn shape() -> Shape {
        Shape::OwnedNode(SchemaRef::Static(T::layout))
    }
}

impl<T: crate::record::Record> FromValue for Box<T> {
    fn from_value(value: Value) -> Result<Self, Mismatch> {
        crate::record::record_from_value::<T>(value).map(Box::new)
    }
}

impl<T: crate::record::Record> IntoValue for Box<T> {
    fn to_value(&self) -> Value {
        crate::record::record_to_value(self.as_ref())
    }
}

//! Instances and their accessors.
//!
//! The engines never see concrete types: they read a [`Schema`] and go through
//! [`Instance`] to set or read one field at a time. Rust types get there with
//! [`record!`](crate::record!) (struct + descriptor table + accessor table) and
//! [`variant!`](crate::variant!) (tagged unions); runtime schemas use
//! [`DynRecord`].

use crate::schema::{Schema, SchemaRef};
use crate::value::{Fields, Mismatch, Value};

/// Accessor surface of a schema instance.
pub trait Instance {
    fn schema(&self) -> SchemaRef;
    /// Store a decoded value into the field at `index` of `schema().fields()`.
    fn set_field(&mut self, index: usize, value: Value) -> Result<(), Mismatch>;
    /// Current value of a field; `None` when the instance never held one.
    fn field(&self, index: usize) -> Option<Value>;
}

/// Read/write accessor of one field of `T`.
pub struct Accessor<T> {
    pub get: fn(&T) -> Value,
    pub set: fn(&mut T, Value) -> Result<(), Mismatch>,
}

/// A Rust type with a static descriptor table.
///
/// `layout().fields()` and `accessors()` are aligned index by index.
pub trait Record: Instance + Default + 'static {
    fn layout() -> &'static Schema;
    fn accessors() -> &'static [Accessor<Self>];
}

pub fn set_with_accessor<T: Record>(
    record: &mut T,
    index: usize,
    value: Value,
) -> Result<(), Mismatch> {
    match T::accessors().get(index) {
        Some(accessor) => (accessor.set)(record, value),
        None => Err(Mismatch { expected: "declared field", found: "field index" }),
    }
}

pub fn get_with_accessor<T: Record>(record: &T, index: usize) -> Option<Value> {
    T::accessors().get(index).map(|accessor| (accessor.get)(record))
}

/// Build a fresh `T` from decoded record fields; absent fields keep their default.
pub fn record_from_value<T: Record>(value: Value) -> Result<T, Mismatch> {
    let mut fields = match value {
        Value::Record(fields) => fields,
        other => return Err(Mismatch::new("record", &other)),
    };
    let mut record = T::default();
    for (index, field) in T::layout().fields().iter().enumerate() {
        if let Some(value) = fields.swap_remove(field.name()) {
            set_with_accessor(&mut record, index, value)?;
        }
    }
    Ok(record)
}

pub fn record_to_value<T: Record>(record: &T) -> Value {
    let fields = T::layout()
        .fields()
        .iter()
        .zip(T::accessors())
        .map(|(field, accessor)| (field.name().to_owned(), (accessor.get)(record)))
        .collect();
    Value::Record(fields)
}

/// Instance of a schema only known at runtime.
#[derive(Debug, Clone)]
pub struct DynRecord {
    schema: SchemaRef,
    fields: Fields,
}

impl DynRecord {
    pub fn new(schema: SchemaRef) -> Self {
        Self { schema, fields: Fields::new() }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl Instance for DynRecord {
    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn set_field(&mut self, index: usize, value: Value) -> Result<(), Mismatch> {
        let Some(field) = self.schema.get().fields().get(index) else {
            return Err(Mismatch { expected: "declared field", found: "field index" });
        };
        let name = field.name().to_owned();
        self.fields.insert(name, value);
        Ok(())
    }

    fn field(&self, index: usize) -> Option<Value> {
        let field = self.schema.get().fields().get(index)?;
        self.fields.get(field.name()).cloned()
    }
}

/// Declare a record type together with its field descriptors.
///
/// ```
/// config_loader::record! {
///     #[derive(Debug, Default, Clone, PartialEq)]
///     pub struct Point {
///         pub x: f64,
///         pub y: f64,
///     }
/// }
/// ```
///
/// `#[name = "..."]` before a field sets the name used in documents.
#[macro_export]
macro_rules! record {
    (@name $field:ident) => { stringify!($field) };
    (@name $field:ident $alias:literal) => { $alias };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[name = $alias:literal])?
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $fvis $field: $ty, )*
        }

        impl $crate::record::Record for $name {
            fn layout() -> &'static $crate::schema::Schema {
                static LAYOUT: $crate::__private::OnceCell<$crate::schema::Schema> =
                    $crate::__private::OnceCell::new();
                LAYOUT.get_or_init(|| {
                    $crate::schema::Schema::new(stringify!($name), vec![
                        $(
                            $crate::schema::Field::new(
                                $crate::record!(@name $field $($alias)?),
                                <$ty as $crate::value::Describe>::shape(),
                            ),
                        )*
                    ])
                })
            }

            fn accessors() -> &'static [$crate::record::Accessor<Self>] {
                const ACCESSORS: &[$crate::record::Accessor<$name>] = &[
                    $({
                        fn get(record: &$name) -> $crate::value::Value {
                            $crate::value::IntoValue::to_value(&record.$field)
                        }
                        fn set(
                            record: &mut $name,
                            value: $crate::value::Value,
                        ) -> ::std::result::Result<(), $crate::value::Mismatch> {
                            record.$field = $crate::value::FromValue::from_value(value)?;
                            Ok(())
                        }
                        $crate::record::Accessor { get, set }
                    },)*
                ];
                ACCESSORS
            }
        }

        impl $crate::record::Instance for $name {
            fn schema(&self) -> $crate::schema::SchemaRef {
                $crate::schema::SchemaRef::Static(<Self as $crate::record::Record>::layout)
            }
            fn set_field(
                &mut self,
                index: usize,
                value: $crate::value::Value,
            ) -> ::std::result::Result<(), $crate::value::Mismatch> {
                $crate::record::set_with_accessor(self, index, value)
            }
            fn field(&self, index: usize) -> Option<$crate::value::Value> {
                $crate::record::get_with_accessor(self, index)
            }
        }

        impl $crate::value::Describe for $name {
            fn shape() -> $crate::schema::Shape {
                $crate::schema::Shape::Record($crate::schema::SchemaRef::Static(
                    <$name as $crate::record::Record>::layout,
                ))
            }
        }

        impl $crate::value::FromValue for $name {
            fn from_value(
                value: $crate::value::Value,
            ) -> ::std::result::Result<Self, $crate::value::Mismatch> {
                $crate::record::record_from_value(value)
            }
        }

        impl $crate::value::IntoValue for $name {
            fn to_value(&self) -> $crate::value::Value {
                $crate::record::record_to_value(self)
            }
        }
    };
}

/// Declare a tagged union whose alternatives are tried in declaration order.
///
/// The default value is the first alternative's default.
#[macro_export]
macro_rules! variant {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $first:ident($first_ty:ty) $(, $alt:ident($alt_ty:ty))* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $first($first_ty),
            $( $alt($alt_ty), )*
        }

        impl $name {
            const ALTERNATIVES: &'static [&'static str] = &[stringify!($first) $(, stringify!($alt))*];

            /// Position of the active alternative in declaration order.
            pub fn index(&self) -> usize {
                let active = match self {
                    Self::$first(_) => stringify!($first),
                    $( Self::$alt(_) => stringify!($alt), )*
                };
                Self::ALTERNATIVES.iter().position(|name| *name == active).unwrap_or_default()
            }
        }

        impl ::std::default::Default for $name {
            fn default() -> Self {
                Self::$first(::std::default::Default::default())
            }
        }

        impl $crate::value::Describe for $name {
            fn shape() -> $crate::schema::Shape {
                $crate::schema::Shape::Variant(vec![
                    <$first_ty as $crate::value::Describe>::shape(),
                    $( <$alt_ty as $crate::value::Describe>::shape(), )*
                ])
            }
        }

        impl $crate::value::FromValue for $name {
            fn from_value(
                value: $crate::value::Value,
            ) -> ::std::result::Result<Self, $crate::value::Mismatch> {
                let (index, value) = match value {
                    $crate::value::Value::Variant { index, value } => (index, *value),
                    other => return Err($crate::value::Mismatch::new(stringify!($name), &other)),
                };
                let active = Self::ALTERNATIVES.get(index).copied().unwrap_or_default();
                if active == stringify!($first) {
                    return $crate::value::FromValue::from_value(value).map(Self::$first);
                }
                $(
                    if active == stringify!($alt) {
                        return $crate::value::FromValue::from_value(value).map(Self::$alt);
                    }
                )*
                Err($crate::value::Mismatch { expected: stringify!($name), found: "alternative index" })
            }
        }

        impl $crate::value::IntoValue for $name {
            fn to_value(&self) -> $crate::value::Value {
                let value = match self {
                    Self::$first(inner) => $crate::value::IntoValue::to_value(inner),
                    $( Self::$alt(inner) => $crate::value::IntoValue::to_value(inner), )*
                };
                $crate::value::Value::Variant { index: self.index(), value: Box::new(value) }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, ScalarKind, Shape};
    use crate::value::{FromValue, IntoValue};
    use once_cell::sync::OnceCell;
    use pretty_assertions::assert_eq;

    crate::record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct Point {
            x: f64,
            y: f64,
        }
    }

    crate::variant! {
        #[derive(Debug, Clone, PartialEq)]
        enum Sum {
            Point(Point),
            Int(i32),
            Text(String),
        }
    }

    crate::record! {
        #[derive(Debug, Default)]
        struct Renamed {
            #[name = "sumType"]
            sum_type: Sum,
            note: Option<String>,
        }
    }

    #[test]
    fn descriptor_table_follows_declaration() {
        let schema = Renamed::layout();
        assert_eq!(schema.name(), "Renamed");
        let names: Vec<_> = schema.fields().iter().map(Field::name).collect();
        assert_eq!(names, ["sumType", "note"]);
        assert_eq!(schema.fields()[0].shape().to_string(), "variant<Point, i32, string>");
        assert!(schema.fields()[1].is_optional());
        assert_eq!(Renamed::accessors().len(), 2);
    }

    #[test]
    fn accessors_set_and_get_fields() {
        let mut point = Point::default();
        point.set_field(1, Value::Float(3.4)).unwrap();
        assert_eq!(point, Point { x: 0.0, y: 3.4 });
        assert_eq!(point.field(1), Some(Value::Float(3.4)));
        assert_eq!(point.field(2), None);
        assert!(point.set_field(0, Value::Str("nope".into())).is_err());
    }

    #[test]
    fn variant_index_and_default() {
        assert_eq!(Sum::default(), Sum::Point(Point::default()));
        assert_eq!(Sum::Int(3).index(), 1);
        assert_eq!(Sum::Text("a".into()).index(), 2);

        let value = Sum::Int(987654).to_value();
        assert_eq!(value, Value::Variant { index: 1, value: Box::new(Value::Int(987654)) });
        assert_eq!(Sum::from_value(value), Ok(Sum::Int(987654)));
        let out_of_range = Value::Variant { index: 7, value: Box::new(Value::Int(1)) };
        assert!(Sum::from_value(out_of_range).is_err());
    }

    #[test]
    fn records_round_trip_through_values() {
        let point = Point { x: 1.2, y: 3.4 };
        let value = point.to_value();
        assert_eq!(Point::from_value(value), Ok(point));
    }

    #[test]
    fn dyn_record_stores_by_field_name() {
        static SCHEMA: OnceCell<Schema> = OnceCell::new();
        fn schema() -> &'static Schema {
            SCHEMA.get_or_init(|| {
                Schema::new(
                    "Pair",
                    vec![
                        Field::new("a", Shape::Scalar(ScalarKind::I32)),
                        Field::new("b", Shape::Scalar(ScalarKind::String)),
                    ],
                )
            })
        }
        let mut record = DynRecord::new(SchemaRef::Static(schema));
        record.set_field(1, Value::Str("hi".into())).unwrap();
        assert_eq!(record.get("b"), Some(&Value::Str("hi".into())));
        assert_eq!(record.field(0), None);
        assert!(record.set_field(5, Value::Int(1)).is_err());
    }
}

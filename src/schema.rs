// Field descriptor model: the type-erased layout every engine walks.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

/// Scalar categories a text token can be converted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 12] = [
        Self::Bool,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::F32,
        Self::F64,
        Self::String,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String => "string",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Self::Bool | Self::F32 | Self::F64 | Self::String)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape of a field: the tag the engines dispatch on.
#[derive(Debug, Clone)]
pub enum Shape {
    Scalar(ScalarKind),
    Sequence(Box<Shape>),
    /// Keys come from each child's label and are converted with the key kind.
    Map(ScalarKind, Box<Shape>),
    Optional(Box<Shape>),
    /// Alternatives in declaration order; first match wins.
    Variant(Vec<Shape>),
    Record(SchemaRef),
    /// Exclusively owned, possibly self-referential record.
    OwnedNode(SchemaRef),
}

impl Shape {
    /// Shapes that are matched against element children rather than text.
    pub fn is_structural(&self) -> bool {
        match self {
            Shape::Scalar(_) => false,
            Shape::Optional(inner) => inner.is_structural(),
            Shape::Variant(alternatives) => alternatives.iter().any(Shape::is_structural),
            Shape::Sequence(_) | Shape::Map(..) | Shape::Record(_) | Shape::OwnedNode(_) => true,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar(kind) => write!(f, "{kind}"),
            Shape::Sequence(inner) => write!(f, "seq<{inner}>"),
            Shape::Map(key, inner) => write!(f, "map<{key}, {inner}>"),
            Shape::Optional(inner) => write!(f, "opt<{inner}>"),
            Shape::Variant(alternatives) => {
                f.write_str("variant<")?;
                for (ix, alternative) in alternatives.iter().enumerate() {
                    if ix > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{alternative}")?;
                }
                f.write_str(">")
            }
            Shape::Record(schema) => f.write_str(schema.get().name()),
            Shape::OwnedNode(schema) => write!(f, "owned<{}>", schema.get().name()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    shape: Shape,
    optional: bool,
}

impl Field {
    /// Optionality follows the shape: only `Optional(_)` fields may be absent.
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        let optional = matches!(shape, Shape::Optional(_));
        Self { name: name.into(), shape, optional }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn shape(&self) -> &Shape {
        &self.shape
    }
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// Ordered field descriptors of one record type. Immutable once built.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self { name: name.into(), fields }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
    pub fn field(&self, name: &str) -> Option<(usize, &Field)> {
        self.fields.iter().enumerate().find(|(_, field)| field.name == name)
    }
}

/// Reference from a shape to a record schema.
///
/// Resolution is lazy so a schema may refer to itself (tree nodes) without
/// building the cycle up front.
#[derive(Clone)]
pub enum SchemaRef {
    /// Schema of a type declared in Rust.
    Static(fn() -> &'static Schema),
    /// Schema declared at runtime; filled once the whole catalog is lowered.
    ///
    /// Recursive catalogs keep their slots alive for the life of the process.
    Slot(Arc<OnceCell<Schema>>),
}

impl SchemaRef {
    pub fn get(&self) -> &Schema {
        match self {
            SchemaRef::Static(schema) => schema(),
            SchemaRef::Slot(slot) => slot.get().unwrap_or(&UNRESOLVED),
        }
    }
}

impl fmt::Debug for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SchemaRef").field(&self.get().name()).finish()
    }
}

// A slot is filled before any document is loaded against it; an empty slot
// behaves as a record without fields.
static UNRESOLVED: Schema = Schema { name: String::new(), fields: Vec::new() };

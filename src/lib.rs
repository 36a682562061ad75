//! Schema-driven loading of tree-shaped documents into typed instances.
//!
//! A schema is an ordered list of field descriptors (name, shape,
//! optionality). The deserialization engine walks it against a parsed
//! document through a small parser capability ([`parser::Node`]) so XML, JSON
//! and any other tree format share one interpreter; the serialization engine
//! walks it the other way through [`parser::Emit`].
//!
//! ```
//! use config_loader::{Json, Status, load_from_text, record};
//!
//! record! {
//!     #[derive(Debug, Default)]
//!     pub struct Point {
//!         pub x: f64,
//!         pub y: f64,
//!     }
//! }
//!
//! let mut point = Point::default();
//! let result = load_from_text(Json, &mut point, r#"{"x": 1.2, "y": 3.4}"#);
//! assert_eq!(Status::of(&result), Status::Success);
//! assert_eq!(point.y, 3.4);
//! ```

pub mod catalog;
pub mod convert;
pub mod de;
pub mod error;
pub mod loader;
pub mod lower;
pub mod parser;
pub mod path_de;
pub mod record;
pub mod schema;
pub mod ser;
pub mod value;

pub use error::{Error, FieldPath, Status};
pub use loader::{
    DEFAULT_MAX_DEPTH, Loader, Options, load_from_source, load_from_text, save_to_text,
};
pub use parser::{Backend, Json, Unsupported, Xml};
pub use record::{DynRecord, Instance, Record};
pub use schema::{Field, ScalarKind, Schema, SchemaRef, Shape};
pub use value::Value;

#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::OnceCell;
}

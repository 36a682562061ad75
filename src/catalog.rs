//! Runtime schema catalogs.
//!
//! A catalog declares record types in JSON so documents can be checked or
//! converted without compiling a Rust type for them:
//!
//! ```json
//! {
//!   "root": "Rect",
//!   "records": {
//!     "Point": { "x": "f64", "y": "f64" },
//!     "Rect":  { "p1": "Point", "p2": "Point", "color": "i32" }
//!   }
//! }
//! ```
//!
//! Field order in the file is declaration order. See [`crate::lower`] for how
//! type expressions become shapes.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::path_de::{PathError, from_str_with_path};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    /// Record used for documents when the caller does not name one.
    #[serde(default)]
    pub root: Option<String>,
    pub records: IndexMap<String, IndexMap<String, TypeExpr>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeExpr {
    /// A scalar name (`bool`, `i8`..`u64`, `f32`, `f64`, `string`) or a record name.
    Named(String),
    Compound(Compound),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum Compound {
    Seq(Box<TypeExpr>),
    Map {
        #[serde(default = "default_key")]
        key: String,
        value: Box<TypeExpr>,
    },
    Opt(Box<TypeExpr>),
    Variant(Vec<TypeExpr>),
    Owned(String),
}

fn default_key() -> String {
    "string".to_owned()
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog: {0}")]
    Parse(#[from] PathError),
    #[error("`{name}` is not a valid record or field name")]
    InvalidName { name: String },
    #[error("{record}.{field}: unknown type `{name}`")]
    UnknownType { record: String, field: String, name: String },
    #[error("{record}.{field}: map key `{key}` must be a scalar type")]
    NonScalarKey { record: String, field: String, key: String },
    #[error("{record}.{field}: a variant needs at least one alternative")]
    EmptyVariant { record: String, field: String },
    #[error("root record `{name}` is not declared")]
    UnknownRoot { name: String },
    #[error("catalog declares {count} records and no root; pick one")]
    NoRoot { count: usize },
}

impl Catalog {
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        Ok(from_str_with_path(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| CatalogError::Io { path: path.to_owned(), source })?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_and_compound_types() {
        let catalog = Catalog::from_json(r#"{
            "records": {
                "Tree": {
                    "name": "string",
                    "children": {"seq": {"owned": "Tree"}},
                    "tags": {"map": {"value": "u8"}},
                    "note": {"opt": "string"},
                    "sum": {"variant": ["Tree", "i32", "string"]}
                }
            }
        }"#)
        .unwrap();
        let tree = &catalog.records["Tree"];
        let names: Vec<_> = tree.keys().map(String::as_str).collect();
        assert_eq!(names, ["name", "children", "tags", "note", "sum"]);
        assert!(matches!(
            &tree["tags"],
            TypeExpr::Compound(Compound::Map { key, .. }) if key == "string"
        ));
        assert!(catalog.root.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected_with_a_path() {
        let error = Catalog::from_json(r#"{"records": {}, "extra": 1}"#).unwrap_err();
        assert!(matches!(error, CatalogError::Parse(_)));
    }
}

use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use tracing::debug;

use crate::catalog::{Catalog, CatalogError, Compound, TypeExpr};
use crate::record::DynRecord;
use crate::schema::{Field, ScalarKind, Schema, SchemaRef, Shape};

// Element names both backends can carry.
static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").unwrap());

/// Lowered catalog: one resolved schema per declared record.
#[derive(Debug, Clone)]
pub struct SchemaSet {
    schemas: IndexMap<String, SchemaRef>,
    root: Option<String>,
}

impl SchemaSet {
    pub fn get(&self, name: &str) -> Option<&SchemaRef> {
        self.schemas.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Pick the document root: `name` if given, else the catalog's `root`,
    /// else the only declared record.
    pub fn root(&self, name: Option<&str>) -> Result<SchemaRef, CatalogError> {
        let name = match name.or(self.root.as_deref()) {
            Some(name) => name,
            None if self.schemas.len() == 1 => return Ok(self.schemas[0].clone()),
            None => return Err(CatalogError::NoRoot { count: self.schemas.len() }),
        };
        self.schemas
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownRoot { name: name.to_owned() })
    }

    /// Empty instance of the root record.
    pub fn instance(&self, name: Option<&str>) -> Result<DynRecord, CatalogError> {
        Ok(DynRecord::new(self.root(name)?))
    }
}

// Where a type expression sits, for error messages.
struct Site<'a> {
    record: &'a str,
    field: &'a str,
}

impl Site<'_> {
    fn unknown(&self, name: &str) -> CatalogError {
        CatalogError::UnknownType {
            record: self.record.to_owned(),
            field: self.field.to_owned(),
            name: name.to_owned(),
        }
    }
}

pub fn lower_catalog(catalog: &Catalog) -> Result<SchemaSet, CatalogError> {
    // Slots first so records can name each other (and themselves) in any order.
    let slots: IndexMap<String, Arc<OnceCell<Schema>>> = catalog
        .records
        .keys()
        .map(|name| (name.clone(), Arc::new(OnceCell::new())))
        .collect();

    for (record, fields) in &catalog.records {
        check_name(record)?;
        let mut lowered = Vec::with_capacity(fields.len());
        for (field, expr) in fields {
            check_name(field)?;
            let site = Site { record, field };
            lowered.push(Field::new(field.clone(), lower_type(expr, &slots, &site)?));
        }
        let _ = slots[record.as_str()].set(Schema::new(record.clone(), lowered));
    }

    if let Some(root) = &catalog.root {
        if !slots.contains_key(root) {
            return Err(CatalogError::UnknownRoot { name: root.clone() });
        }
    }
    debug!(records = slots.len(), root = ?catalog.root, "lowered catalog");

    let schemas = slots.into_iter().map(|(name, slot)| (name, SchemaRef::Slot(slot))).collect();
    Ok(SchemaSet { schemas, root: catalog.root.clone() })
}

fn lower_type(
    expr: &TypeExpr,
    slots: &IndexMap<String, Arc<OnceCell<Schema>>>,
    site: &Site<'_>,
) -> Result<Shape, CatalogError> {
    let record = |name: &str| {
        slots.get(name).map(|slot| SchemaRef::Slot(slot.clone())).ok_or_else(|| site.unknown(name))
    };
    let compound = match expr {
        TypeExpr::Named(name) => {
            return match ScalarKind::from_name(name) {
                Some(kind) => Ok(Shape::Scalar(kind)),
                None => record(name.as_str()).map(Shape::Record),
            };
        }
        TypeExpr::Compound(compound) => compound,
    };
    Ok(match compound {
        Compound::Seq(inner) => Shape::Sequence(Box::new(lower_type(inner, slots, site)?)),
        Compound::Map { key, value } => {
            let Some(kind) = ScalarKind::from_name(key) else {
                return Err(CatalogError::NonScalarKey {
                    record: site.record.to_owned(),
                    field: site.field.to_owned(),
                    key: key.clone(),
                });
            };
            Shape::Map(kind, Box::new(lower_type(value, slots, site)?))
        }
        Compound::Opt(inner) => Shape::Optional(Box::new(lower_type(inner, slots, site)?)),
        Compound::Variant(alternatives) => {
            if alternatives.is_empty() {
                return Err(CatalogError::EmptyVariant {
                    record: site.record.to_owned(),
                    field: site.field.to_owned(),
                });
            }
            let alternatives = alternatives
                .iter()
                .map(|alternative| lower_type(alternative, slots, site))
                .collect::<Result<Vec<_>, _>>()?;
            Shape::Variant(alternatives)
        }
        Compound::Owned(name) => Shape::OwnedNode(record(name.as_str())?),
    })
}

fn check_name(name: &str) -> Result<(), CatalogError> {
    if NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(CatalogError::InvalidName { name: name.to_owned() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lower(text: &str) -> Result<SchemaSet, CatalogError> {
        lower_catalog(&Catalog::from_json(text).unwrap())
    }

    #[test]
    fn records_may_refer_forward_and_to_themselves() {
        let set = lower(r#"{
            "root": "Tree",
            "records": {
                "Tree": {"name": "string", "children": {"seq": {"owned": "Tree"}}, "at": "Point"},
                "Point": {"x": "f64", "y": "f64"}
            }
        }"#)
        .unwrap();
        let tree = set.root(None).unwrap();
        let tree = tree.get();
        assert_eq!(tree.name(), "Tree");
        assert_eq!(tree.fields()[1].shape().to_string(), "seq<owned<Tree>>");
        assert_eq!(tree.fields()[2].shape().to_string(), "Point");
        let Shape::Sequence(inner) = tree.fields()[1].shape() else { panic!("not a sequence") };
        let Shape::OwnedNode(child) = &**inner else { panic!("not owned") };
        assert_eq!(child.get().fields().len(), 3);
    }

    #[test]
    fn compound_shapes_lower() {
        let set = lower(r#"{"records": {"Bag": {
            "m": {"map": {"key": "u32", "value": {"variant": ["i32", "string"]}}},
            "o": {"opt": "bool"}
        }}}"#)
        .unwrap();
        let bag = set.root(None).unwrap();
        let fields = bag.get().fields();
        assert_eq!(fields[0].shape().to_string(), "map<u32, variant<i32, string>>");
        assert!(fields[1].is_optional());
    }

    #[test]
    fn errors_name_the_record_and_field() {
        let error = lower(r#"{"records": {"A": {"b": "Nope"}}}"#).unwrap_err();
        assert_eq!(error.to_string(), "A.b: unknown type `Nope`");

        let error =
            lower(r#"{"records": {"A": {"b": {"map": {"key": "A", "value": "i8"}}}}}"#).unwrap_err();
        assert!(matches!(error, CatalogError::NonScalarKey { .. }));

        let error = lower(r#"{"records": {"A": {"b": {"variant": []}}}}"#).unwrap_err();
        assert!(matches!(error, CatalogError::EmptyVariant { .. }));

        let error = lower(r#"{"records": {"A": {"has space": "i8"}}}"#).unwrap_err();
        assert!(matches!(error, CatalogError::InvalidName { .. }));
    }

    #[test]
    fn root_selection() {
        let set = lower(r#"{"records": {"A": {"x": "i8"}, "B": {"y": "i8"}}}"#).unwrap();
        assert!(matches!(set.root(None), Err(CatalogError::NoRoot { count: 2 })));
        assert_eq!(set.root(Some("B")).unwrap().get().name(), "B");
        assert!(matches!(set.root(Some("C")), Err(CatalogError::UnknownRoot { .. })));
        assert_eq!(set.names().collect::<Vec<_>>(), ["A", "B"]);

        let error = lower(r#"{"root": "Z", "records": {"A": {"x": "i8"}}}"#).unwrap_err();
        assert!(matches!(error, CatalogError::UnknownRoot { .. }));
    }
}

//! Update specifications for modifying stored documents.
//!
//! An [UpdateSpec] carries two ordered groups of mutations: assignments
//! (`set`) and numeric increments (`inc`). All assignments render before
//! any increment, and within each group the arrival order of fields is
//! preserved.

use crate::common::Value;
use crate::document::Document;
use crate::errors::{ErrorKind, ReldocError, ReldocResult};

const SET_OPERATOR: &str = "set";
const INC_OPERATOR: &str = "inc";

/// An ordered set of field mutations to apply to matching documents.
///
/// # Examples
///
/// ```ignore
/// let spec = UpdateSpec::new()
///     .set("status", "archived")
///     .inc("revision", 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSpec {
    pub(crate) set_fields: Vec<(String, Value)>,
    pub(crate) inc_fields: Vec<(String, Value)>,
}

impl UpdateSpec {
    /// Creates an empty update specification.
    pub fn new() -> UpdateSpec {
        UpdateSpec::default()
    }

    /// Adds an assignment of `value` to `field`.
    pub fn set<T: Into<Value>>(mut self, field: &str, value: T) -> UpdateSpec {
        self.set_fields.push((field.to_string(), value.into()));
        self
    }

    /// Adds a numeric increment of `field` by `amount`.
    pub fn inc<T: Into<Value>>(mut self, field: &str, amount: T) -> UpdateSpec {
        self.inc_fields.push((field.to_string(), amount.into()));
        self
    }

    /// Parses a Mongo-style update document of the form
    /// `{"$set": {..}, "$inc": {..}}`.
    ///
    /// Every top-level key must be `set` or `inc` (with or without a
    /// leading `$`) and map to a nested document; anything else rejects
    /// the whole call with `UnsupportedOperator`, nothing is silently
    /// dropped.
    pub fn from_document(document: &Document) -> ReldocResult<UpdateSpec> {
        let mut spec = UpdateSpec::new();
        for (key, value) in document.iter() {
            let fields = match value {
                Value::Document(doc) => doc,
                other => {
                    return Err(ReldocError::new(
                        format!(
                            "update operator {} requires a document operand, found {}",
                            key,
                            other.type_name()
                        ),
                        ErrorKind::UnsupportedOperator,
                    ));
                }
            };

            match key.strip_prefix('$').unwrap_or(key.as_str()) {
                SET_OPERATOR => {
                    for (field, value) in fields.iter() {
                        spec.set_fields.push((field.clone(), value.clone()));
                    }
                }
                INC_OPERATOR => {
                    for (field, value) in fields.iter() {
                        spec.inc_fields.push((field.clone(), value.clone()));
                    }
                }
                other => {
                    return Err(ReldocError::new(
                        format!("unsupported update operator: {}", other),
                        ErrorKind::UnsupportedOperator,
                    ));
                }
            }
        }
        Ok(spec)
    }

    /// Returns true if the specification carries no mutations.
    pub fn is_empty(&self) -> bool {
        self.set_fields.is_empty() && self.inc_fields.is_empty()
    }

    /// Number of mutations across both groups.
    pub fn len(&self) -> usize {
        self.set_fields.len() + self.inc_fields.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn test_fluent_builders() {
        let spec = UpdateSpec::new().set("status", "archived").inc("revision", 1i64);
        assert_eq!(
            spec.set_fields,
            vec![("status".to_string(), Value::String("archived".to_string()))]
        );
        assert_eq!(spec.inc_fields, vec![("revision".to_string(), Value::I64(1))]);
    }

    #[test]
    fn test_from_document_set_and_inc() {
        let mut set_doc = Document::new();
        set_doc.put("name", "Bob").unwrap();
        let mut inc_doc = Document::new();
        inc_doc.put("age", 1i64).unwrap();

        let mut update = Document::new();
        update.put("$set", Value::Document(set_doc)).unwrap();
        update.put("$inc", Value::Document(inc_doc)).unwrap();

        let spec = UpdateSpec::from_document(&update).unwrap();
        assert_eq!(spec.set_fields.len(), 1);
        assert_eq!(spec.inc_fields.len(), 1);
        assert_eq!(spec.set_fields[0].0, "name");
        assert_eq!(spec.inc_fields[0].0, "age");
    }

    #[test]
    fn test_from_document_accepts_bare_operator_keys() {
        let mut set_doc = Document::new();
        set_doc.put("name", "Bob").unwrap();
        let mut inc_doc = Document::new();
        inc_doc.put("age", 1i64).unwrap();

        let mut update = Document::new();
        update.put("set", Value::Document(set_doc)).unwrap();
        update.put("inc", Value::Document(inc_doc)).unwrap();

        let spec = UpdateSpec::from_document(&update).unwrap();
        assert_eq!(
            spec.set_fields,
            vec![("name".to_string(), Value::String("Bob".to_string()))]
        );
        assert_eq!(spec.inc_fields, vec![("age".to_string(), Value::I64(1))]);
    }

    #[test]
    fn test_from_document_rejects_unknown_operator() {
        let mut push_doc = Document::new();
        push_doc.put("tags", "new").unwrap();
        let mut update = Document::new();
        update.put("$push", Value::Document(push_doc)).unwrap();

        let result = UpdateSpec::from_document(&update);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::UnsupportedOperator);
    }

    #[test]
    fn test_from_document_rejects_scalar_operand() {
        let mut update = Document::new();
        update.put("$set", "oops").unwrap();

        let result = UpdateSpec::from_document(&update);
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::UnsupportedOperator);
    }

    #[test]
    fn test_preserves_arrival_order_within_groups() {
        let spec = UpdateSpec::new()
            .set("b", 2i64)
            .set("a", 1i64)
            .inc("z", 1i64)
            .inc("y", 1i64);
        let set_order: Vec<&str> = spec.set_fields.iter().map(|(f, _)| f.as_str()).collect();
        let inc_order: Vec<&str> = spec.inc_fields.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(set_order, vec!["b", "a"]);
        assert_eq!(inc_order, vec!["z", "y"]);
    }

    #[test]
    fn test_empty_spec() {
        assert!(UpdateSpec::new().is_empty());
        assert_eq!(UpdateSpec::new().len(), 0);
    }
}

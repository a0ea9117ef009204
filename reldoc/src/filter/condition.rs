use indexmap::IndexMap;
use std::fmt::{Display, Formatter};

use crate::common::Value;
use crate::document::Document;
use crate::errors::{ErrorKind, ReldocError, ReldocResult};

/// The fixed set of filter operators.
///
/// Each variant maps to exactly one parameterized SQL fragment. The
/// dispatch is an exhaustive match, so adding or removing an operator is
/// a compile-time-checked change rather than a mapping lookup that can
/// silently miss keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Ne,
    In,
    ContainsAny,
    Lt,
    Lte,
    Gt,
    Gte,
    Regex,
}

impl FilterOperator {
    /// Parses a Mongo-style operator key, with or without a leading `$`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperator` for any key outside the fixed set.
    pub fn from_key(key: &str) -> ReldocResult<FilterOperator> {
        let key = key.strip_prefix('$').unwrap_or(key);
        match key {
            "eq" => Ok(FilterOperator::Eq),
            "ne" => Ok(FilterOperator::Ne),
            "in" => Ok(FilterOperator::In),
            "containsAny" => Ok(FilterOperator::ContainsAny),
            "lt" => Ok(FilterOperator::Lt),
            "lte" => Ok(FilterOperator::Lte),
            "gt" => Ok(FilterOperator::Gt),
            "gte" => Ok(FilterOperator::Gte),
            "regex" => Ok(FilterOperator::Regex),
            other => {
                log::error!("Unsupported filter operator: {}", other);
                Err(ReldocError::new(
                    &format!("Unsupported filter operator: {}", other),
                    ErrorKind::UnsupportedOperator,
                ))
            }
        }
    }

    /// The canonical operator key.
    pub fn key(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Ne => "ne",
            FilterOperator::In => "in",
            FilterOperator::ContainsAny => "containsAny",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Regex => "regex",
        }
    }

    /// Renders the SQL fragment for this operator against a quoted
    /// column identifier and a 1-based positional parameter index.
    pub(crate) fn fragment(&self, column: &str, index: usize) -> String {
        match self {
            FilterOperator::Eq => format!("{} = ${}", column, index),
            FilterOperator::Ne => format!("{} <> ${}", column, index),
            FilterOperator::In | FilterOperator::ContainsAny => {
                format!("{} = ANY(${})", column, index)
            }
            FilterOperator::Lt => format!("{} < ${}", column, index),
            FilterOperator::Lte => format!("{} <= ${}", column, index),
            FilterOperator::Gt => format!("{} > ${}", column, index),
            FilterOperator::Gte => format!("{} >= ${}", column, index),
            FilterOperator::Regex => format!("{} ILIKE ${}", column, index),
        }
    }
}

impl Display for FilterOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A single field condition inside a [Filter].
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// A bare scalar, implying equality.
    Value(Value),
    /// An explicit operator with its operand.
    Operator(FilterOperator, Value),
    /// A regular-expression-literal condition, compiled to a
    /// case-insensitive pattern match.
    Pattern(String),
}

/// Caller-supplied mapping selecting documents, field to [Condition].
///
/// Conditions keep their arrival order. Multiple fields are joined with
/// logical AND by the compiler; OR is never emitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: IndexMap<String, Condition>,
}

impl Filter {
    /// Creates an empty filter that matches all documents.
    pub fn new() -> Self {
        Filter {
            conditions: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Adds a condition for a field, replacing any previous condition
    /// for the same field.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFieldName` if the field name is empty.
    pub fn add(&mut self, field: &str, condition: Condition) -> ReldocResult<()> {
        if field.is_empty() {
            log::error!("Filter does not support empty field name");
            return Err(ReldocError::new(
                "Filter does not support empty field name",
                ErrorKind::InvalidFieldName,
            ));
        }
        self.conditions.insert(field.to_string(), condition);
        Ok(())
    }

    /// Iterates conditions in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Condition)> {
        self.conditions.iter()
    }

    /// Iterates field names in arrival order.
    pub fn fields(&self) -> impl Iterator<Item = &String> {
        self.conditions.keys()
    }

    /// Parses a Mongo-style condition document into a filter.
    ///
    /// Each field maps either to a bare scalar (equality) or to a
    /// nested document with exactly one recognized operator key
    /// (accepted with or without a `$` prefix).
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperator` when a condition object carries an
    /// unrecognized operator key or more than one key. The whole filter
    /// is rejected; conditions are never dropped.
    pub fn from_document(document: &Document) -> ReldocResult<Filter> {
        let mut filter = Filter::new();
        for (field, value) in document.iter() {
            let condition = match value {
                Value::Document(node) => {
                    let mut entries = node.iter();
                    let (key, operand) = match (entries.next(), entries.next()) {
                        (Some(entry), None) => entry,
                        _ => {
                            log::error!(
                                "Condition object for field '{}' must contain exactly one operator key",
                                field
                            );
                            return Err(ReldocError::new(
                                &format!(
                                    "Condition object for field '{}' must contain exactly one operator key",
                                    field
                                ),
                                ErrorKind::UnsupportedOperator,
                            ));
                        }
                    };
                    let operator = FilterOperator::from_key(key)?;
                    Condition::Operator(operator, operand.clone())
                }
                scalar => Condition::Value(scalar.clone()),
            };
            filter.add(field, condition)?;
        }
        Ok(filter)
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, (field, condition)) in self.conditions.iter().enumerate() {
            if i > 0 {
                write!(f, " && ")?;
            }
            match condition {
                Condition::Value(value) => write!(f, "{} == {}", field, value)?,
                Condition::Operator(op, value) => write!(f, "{} {} {}", field, op, value)?,
                Condition::Pattern(pattern) => write!(f, "{} ~ {}", field, pattern)?,
            }
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_key_all_operators() {
        assert_eq!(FilterOperator::from_key("eq").unwrap(), FilterOperator::Eq);
        assert_eq!(FilterOperator::from_key("ne").unwrap(), FilterOperator::Ne);
        assert_eq!(FilterOperator::from_key("in").unwrap(), FilterOperator::In);
        assert_eq!(
            FilterOperator::from_key("containsAny").unwrap(),
            FilterOperator::ContainsAny
        );
        assert_eq!(FilterOperator::from_key("lt").unwrap(), FilterOperator::Lt);
        assert_eq!(FilterOperator::from_key("lte").unwrap(), FilterOperator::Lte);
        assert_eq!(FilterOperator::from_key("gt").unwrap(), FilterOperator::Gt);
        assert_eq!(FilterOperator::from_key("gte").unwrap(), FilterOperator::Gte);
        assert_eq!(
            FilterOperator::from_key("regex").unwrap(),
            FilterOperator::Regex
        );
    }

    #[test]
    fn test_from_key_dollar_prefix() {
        assert_eq!(FilterOperator::from_key("$in").unwrap(), FilterOperator::In);
        assert_eq!(
            FilterOperator::from_key("$regex").unwrap(),
            FilterOperator::Regex
        );
    }

    #[test]
    fn test_from_key_unknown_operator() {
        let result = FilterOperator::from_key("$nor");
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            &ErrorKind::UnsupportedOperator
        );
    }

    #[test]
    fn test_fragments() {
        assert_eq!(FilterOperator::Eq.fragment("\"a\"", 1), "\"a\" = $1");
        assert_eq!(FilterOperator::Ne.fragment("\"a\"", 2), "\"a\" <> $2");
        assert_eq!(FilterOperator::In.fragment("\"a\"", 3), "\"a\" = ANY($3)");
        assert_eq!(
            FilterOperator::ContainsAny.fragment("\"a\"", 3),
            "\"a\" = ANY($3)"
        );
        assert_eq!(FilterOperator::Lt.fragment("\"a\"", 4), "\"a\" < $4");
        assert_eq!(FilterOperator::Lte.fragment("\"a\"", 4), "\"a\" <= $4");
        assert_eq!(FilterOperator::Gt.fragment("\"a\"", 5), "\"a\" > $5");
        assert_eq!(FilterOperator::Gte.fragment("\"a\"", 5), "\"a\" >= $5");
        assert_eq!(
            FilterOperator::Regex.fragment("\"a\"", 6),
            "\"a\" ILIKE $6"
        );
    }

    #[test]
    fn test_filter_add_rejects_empty_field() {
        let mut filter = Filter::new();
        let result = filter.add("", Condition::Value(Value::I64(1)));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::InvalidFieldName);
    }

    #[test]
    fn test_filter_keeps_arrival_order() {
        let mut filter = Filter::new();
        filter.add("b", Condition::Value(Value::I64(1))).unwrap();
        filter.add("a", Condition::Value(Value::I64(2))).unwrap();
        let fields: Vec<&String> = filter.fields().collect();
        assert_eq!(fields, vec!["b", "a"]);
    }

    #[test]
    fn test_from_document_bare_scalar_is_equality() {
        let mut doc = Document::new();
        doc.put("title", "Dune").unwrap();
        let filter = Filter::from_document(&doc).unwrap();
        assert_eq!(filter.len(), 1);
        let (field, condition) = filter.iter().next().unwrap();
        assert_eq!(field, "title");
        assert_eq!(
            condition,
            &Condition::Value(Value::String("Dune".to_string()))
        );
    }

    #[test]
    fn test_from_document_operator_node() {
        let mut node = Document::new();
        node.put("gt", 5i64).unwrap();
        let mut doc = Document::new();
        doc.put("qty", node).unwrap();

        let filter = Filter::from_document(&doc).unwrap();
        let (_, condition) = filter.iter().next().unwrap();
        assert_eq!(
            condition,
            &Condition::Operator(FilterOperator::Gt, Value::I64(5))
        );
    }

    #[test]
    fn test_from_document_unknown_operator_rejects_call() {
        let mut node = Document::new();
        node.put("$exists", true).unwrap();
        let mut doc = Document::new();
        doc.put("qty", node).unwrap();

        let result = Filter::from_document(&doc);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            &ErrorKind::UnsupportedOperator
        );
    }

    #[test]
    fn test_from_document_multiple_operator_keys_rejected() {
        let mut node = Document::new();
        node.put("gt", 1i64).unwrap();
        node.put("lt", 10i64).unwrap();
        let mut doc = Document::new();
        doc.put("qty", node).unwrap();

        let result = Filter::from_document(&doc);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            &ErrorKind::UnsupportedOperator
        );
    }

    #[test]
    fn test_display() {
        let mut filter = Filter::new();
        filter.add("age", Condition::Operator(FilterOperator::Gt, Value::I64(30))).unwrap();
        assert_eq!(format!("{}", filter), "(age gt 30)");
    }
}

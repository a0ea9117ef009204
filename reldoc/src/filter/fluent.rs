use crate::common::Value;
use crate::filter::{Condition, Filter, FilterOperator};

/// Creates a fluent filter builder for the specified field name.
///
/// The returned [FluentFilter] provides methods for building equality,
/// comparison, containment, and pattern-matching conditions.
///
/// # Examples
///
/// ```ignore
/// let filter = field("age").gt(30).and(field("status").eq("active"));
/// let filter = field("edition").in_array(vec![2, 3]);
/// ```
pub fn field(field_name: &str) -> FluentFilter {
    FluentFilter {
        field_name: field_name.to_string(),
    }
}

/// Creates a filter that matches all documents.
pub fn all() -> Filter {
    Filter::new()
}

/// A fluent builder for constructing a condition on a specific field.
///
/// Each method returns a [Filter] that can be passed directly to the
/// CRUD operations or combined with other filters via [Filter::and].
pub struct FluentFilter {
    field_name: String,
}

impl FluentFilter {
    fn build(self, condition: Condition) -> Filter {
        let mut filter = Filter::new();
        // field name validity is re-checked at compile time; a fluent
        // builder with an empty name produces an empty filter
        if filter.add(&self.field_name, condition).is_err() {
            log::warn!("Ignoring fluent condition with empty field name");
        }
        filter
    }

    /// Matches documents where the field equals the specified value.
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Filter {
        self.build(Condition::Operator(FilterOperator::Eq, value.into()))
    }

    /// Matches documents where the field differs from the specified value.
    #[inline]
    pub fn ne<T: Into<Value>>(self, value: T) -> Filter {
        self.build(Condition::Operator(FilterOperator::Ne, value.into()))
    }

    /// Matches documents where the field is greater than the value.
    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> Filter {
        self.build(Condition::Operator(FilterOperator::Gt, value.into()))
    }

    /// Matches documents where the field is greater than or equal to the value.
    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> Filter {
        self.build(Condition::Operator(FilterOperator::Gte, value.into()))
    }

    /// Matches documents where the field is less than the value.
    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> Filter {
        self.build(Condition::Operator(FilterOperator::Lt, value.into()))
    }

    /// Matches documents where the field is less than or equal to the value.
    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> Filter {
        self.build(Condition::Operator(FilterOperator::Lte, value.into()))
    }

    /// Matches documents where the field equals any of the given values.
    pub fn in_array<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        let operand = Value::Array(values.into_iter().map(Into::into).collect());
        self.build(Condition::Operator(FilterOperator::In, operand))
    }

    /// Matches documents where the field contains any of the given values.
    pub fn contains_any<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        let operand = Value::Array(values.into_iter().map(Into::into).collect());
        self.build(Condition::Operator(FilterOperator::ContainsAny, operand))
    }

    /// Matches documents where the field matches the pattern through the
    /// `regex` operator (case-insensitive substring containment).
    pub fn regex(self, pattern: &str) -> Filter {
        self.build(Condition::Operator(
            FilterOperator::Regex,
            Value::String(pattern.to_string()),
        ))
    }

    /// Matches documents against a regular-expression-literal condition.
    pub fn matches(self, pattern: &str) -> Filter {
        self.build(Condition::Pattern(pattern.to_string()))
    }
}

impl Filter {
    /// Combines two filters into a conjunction. Conditions of `other`
    /// are appended after the conditions of `self`, preserving order;
    /// a later condition on the same field replaces the earlier one.
    pub fn and(mut self, other: Filter) -> Filter {
        for (field, condition) in other.iter() {
            // add only fails on empty names, which other cannot contain
            let _ = self.add(field, condition.clone());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_eq() {
        let filter = field("name").eq("Alice");
        let (name, condition) = filter.iter().next().unwrap();
        assert_eq!(name, "name");
        assert_eq!(
            condition,
            &Condition::Operator(FilterOperator::Eq, Value::String("Alice".to_string()))
        );
    }

    #[test]
    fn test_comparison_builders() {
        assert!(matches!(
            field("a").gt(1).iter().next().unwrap().1,
            Condition::Operator(FilterOperator::Gt, _)
        ));
        assert!(matches!(
            field("a").gte(1).iter().next().unwrap().1,
            Condition::Operator(FilterOperator::Gte, _)
        ));
        assert!(matches!(
            field("a").lt(1).iter().next().unwrap().1,
            Condition::Operator(FilterOperator::Lt, _)
        ));
        assert!(matches!(
            field("a").lte(1).iter().next().unwrap().1,
            Condition::Operator(FilterOperator::Lte, _)
        ));
        assert!(matches!(
            field("a").ne(1).iter().next().unwrap().1,
            Condition::Operator(FilterOperator::Ne, _)
        ));
    }

    #[test]
    fn test_in_array() {
        let filter = field("edition").in_array(vec![2i64, 3]);
        let (_, condition) = filter.iter().next().unwrap();
        assert_eq!(
            condition,
            &Condition::Operator(
                FilterOperator::In,
                Value::Array(vec![Value::I64(2), Value::I64(3)])
            )
        );
    }

    #[test]
    fn test_matches_builds_pattern_condition() {
        let filter = field("title").matches("^adventure$");
        let (_, condition) = filter.iter().next().unwrap();
        assert_eq!(condition, &Condition::Pattern("^adventure$".to_string()));
    }

    #[test]
    fn test_and_appends_in_order() {
        let filter = field("a").eq(1).and(field("b").gt(2));
        let fields: Vec<&String> = filter.fields().collect();
        assert_eq!(fields, vec!["a", "b"]);
        assert_eq!(filter.len(), 2);
    }

    #[test]
    fn test_all_is_empty() {
        assert!(all().is_empty());
    }
}

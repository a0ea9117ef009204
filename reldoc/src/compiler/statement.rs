use crate::common::Value;
use crate::errors::{ErrorKind, ReldocError, ReldocResult};
use crate::filter::{Condition, FilterOperator};

/// A compiled SQL statement: the text plus its ordered parameter list.
///
/// `params[i]` binds to the positional placeholder `$(i + 1)` in `sql`.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: String, params: Vec<Value>) -> Statement {
        Statement { sql, params }
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{} params]", self.sql, self.params.len())
    }
}

/// Renders a field name as a double-quoted SQL identifier, doubling any
/// embedded quote characters.
///
/// # Errors
///
/// Returns `InvalidFieldName` for an empty name.
pub(crate) fn quote_ident(name: &str) -> ReldocResult<String> {
    if name.is_empty() {
        log::error!("Rejecting empty field name in statement");
        return Err(ReldocError::new(
            "field names must not be empty",
            ErrorKind::InvalidFieldName,
        ));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Converts a regular-expression-style pattern into the parameter bound
/// against ILIKE: leading/trailing anchors are stripped and the rest is
/// wrapped in `%` wildcards for substring containment.
pub(crate) fn like_pattern(pattern: &str) -> String {
    let stripped = pattern.trim_start_matches('^').trim_end_matches('$');
    format!("%{}%", stripped)
}

/// Resolves a condition into its operator and the value to bind.
///
/// Bare scalars imply equality. `in`/`containsAny` operands are
/// normalized to arrays, a scalar operand becoming a one-element array.
/// Regex operands must be strings and are rewritten via [like_pattern].
pub(crate) fn resolve_condition(
    field: &str,
    condition: &Condition,
) -> ReldocResult<(FilterOperator, Value)> {
    match condition {
        Condition::Value(value) => Ok((FilterOperator::Eq, value.clone())),
        Condition::Pattern(pattern) => Ok((
            FilterOperator::Regex,
            Value::String(like_pattern(pattern)),
        )),
        Condition::Operator(operator, operand) => {
            let bound = match operator {
                FilterOperator::In | FilterOperator::ContainsAny => match operand {
                    Value::Array(_) => operand.clone(),
                    scalar => Value::Array(vec![scalar.clone()]),
                },
                FilterOperator::Regex => match operand {
                    Value::String(pattern) => Value::String(like_pattern(pattern)),
                    other => {
                        return Err(ReldocError::new(
                            format!(
                                "regex condition on field {} requires a string pattern, found {}",
                                field,
                                other.type_name()
                            ),
                            ErrorKind::InvalidDataType,
                        ));
                    }
                },
                _ => operand.clone(),
            };
            Ok((*operator, bound))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("title").unwrap(), "\"title\"");
        assert_eq!(quote_ident("_createdAt").unwrap(), "\"_createdAt\"");
    }

    #[test]
    fn test_quote_ident_doubles_embedded_quotes() {
        assert_eq!(quote_ident("a\"b").unwrap(), "\"a\"\"b\"");
    }

    #[test]
    fn test_quote_ident_rejects_empty() {
        let err = quote_ident("").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidFieldName);
    }

    #[test]
    fn test_like_pattern_strips_anchors() {
        assert_eq!(like_pattern("^adventure$"), "%adventure%");
        assert_eq!(like_pattern("adventure"), "%adventure%");
        assert_eq!(like_pattern("^^start"), "%start%");
    }

    #[test]
    fn test_resolve_bare_scalar_is_equality() {
        let (op, value) = resolve_condition("a", &Condition::Value(Value::I64(5))).unwrap();
        assert_eq!(op, FilterOperator::Eq);
        assert_eq!(value, Value::I64(5));
    }

    #[test]
    fn test_resolve_in_wraps_scalar() {
        let condition = Condition::Operator(FilterOperator::In, Value::I64(2));
        let (op, value) = resolve_condition("edition", &condition).unwrap();
        assert_eq!(op, FilterOperator::In);
        assert_eq!(value, Value::Array(vec![Value::I64(2)]));
    }

    #[test]
    fn test_resolve_regex_requires_string() {
        let condition = Condition::Operator(FilterOperator::Regex, Value::I64(1));
        let err = resolve_condition("title", &condition).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidDataType);
    }

    #[test]
    fn test_resolve_pattern_condition() {
        let (op, value) = resolve_condition("t", &Condition::Pattern("^x$".into())).unwrap();
        assert_eq!(op, FilterOperator::Regex);
        assert_eq!(value, Value::String("%x%".to_string()));
    }
}

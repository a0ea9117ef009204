//! Dissection of the statement grammar the compiler emits.
//!
//! The in-memory backend does not embed a general SQL parser; it
//! recognizes exactly the statement shapes this crate produces and
//! evaluates them against in-memory rows.

use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

use crate::common::{SortOrder, Value};
use crate::errors::{ErrorKind, ReldocError, ReldocResult};

static INSERT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^INSERT INTO "((?:[^"]|"")+)" \((.+)\) VALUES \((.+)\) RETURNING \*$"#)
        .unwrap()
});

static COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^SELECT COUNT\(\*\) FROM "((?:[^"]|"")+)"(?: WHERE (.+))?$"#).unwrap()
});

static SELECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^SELECT (.+) FROM "((?:[^"]|"")+)"(?: WHERE (.+?))? ORDER BY (.+?)(?: LIMIT (\d+))?(?: OFFSET (\d+))?$"#,
    )
    .unwrap()
});

static UPDATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^UPDATE "((?:[^"]|"")+)" SET (.+?)(?: WHERE (.+))? RETURNING \*$"#).unwrap()
});

static DELETE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^DELETE FROM "((?:[^"]|"")+)"(?: WHERE (.+))? RETURNING \*$"#).unwrap()
});

static PREDICATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^"((?:[^"]|"")+)" (=|<>|<=|>=|<|>|ILIKE) \$(\d+)$"#).unwrap()
});

static ANY_PREDICATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"((?:[^"]|"")+)" = ANY\(\$(\d+)\)$"#).unwrap());

static ASSIGNMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^"((?:[^"]|"")+)" = (?:to_timestamp\(\$(\d+)\)|"(?:[^"]|"")+" \+ \$(\d+)|\$(\d+))$"#)
        .unwrap()
});

static ORDER_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"((?:[^"]|"")+)" (ASC|DESC)$"#).unwrap())
;

pub(crate) fn malformed(sql: &str) -> ReldocError {
    log::error!("Statement does not match the supported grammar: {}", sql);
    ReldocError::new(
        format!("unsupported statement shape: {}", sql),
        ErrorKind::BackendError,
    )
}

fn unquote(ident: &str) -> String {
    ident.replace("\"\"", "\"")
}

fn param<'a>(params: &'a [Value], index_text: &str, sql: &str) -> ReldocResult<&'a Value> {
    let index: usize = index_text
        .parse()
        .map_err(|_| malformed(sql))?;
    params
        .get(index - 1)
        .ok_or_else(|| {
            ReldocError::new(
                format!("statement references parameter ${} but only {} bound", index, params.len()),
                ErrorKind::BackendError,
            )
        })
}

/// A single WHERE predicate, parsed back from its SQL fragment.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Predicate {
    Compare { column: String, op: CompareOp, value: Value },
    AnyOf { column: String, values: Vec<Value> },
    Like { column: String, pattern: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Predicate {
    pub(crate) fn matches(&self, row: &IndexMap<String, Value>) -> bool {
        match self {
            Predicate::Compare { column, op, value } => {
                let stored = row.get(column).unwrap_or(&Value::Null);
                match stored.compare(value) {
                    None => false,
                    Some(ordering) => match op {
                        CompareOp::Eq => ordering == Ordering::Equal,
                        CompareOp::Ne => ordering != Ordering::Equal,
                        CompareOp::Lt => ordering == Ordering::Less,
                        CompareOp::Lte => ordering != Ordering::Greater,
                        CompareOp::Gt => ordering == Ordering::Greater,
                        CompareOp::Gte => ordering != Ordering::Less,
                    },
                }
            }
            Predicate::AnyOf { column, values } => {
                let stored = row.get(column).unwrap_or(&Value::Null);
                values
                    .iter()
                    .any(|candidate| stored.compare(candidate) == Some(Ordering::Equal))
            }
            Predicate::Like { column, pattern } => {
                let stored = row.get(column).unwrap_or(&Value::Null);
                match stored {
                    Value::String(text) => ilike_matches(text, pattern),
                    _ => false,
                }
            }
        }
    }
}

/// Case-insensitive LIKE with the `%` wildcards the compiler emits
/// (leading and trailing; the body is matched literally).
fn ilike_matches(text: &str, pattern: &str) -> bool {
    let text = text.to_lowercase();
    let pattern = pattern.to_lowercase();
    let leading = pattern.starts_with('%');
    let trailing = pattern.len() > leading as usize && pattern.ends_with('%');
    let body = &pattern[leading as usize..pattern.len() - trailing as usize];
    match (leading, trailing) {
        (true, true) => text.contains(body),
        (true, false) => text.ends_with(body),
        (false, true) => text.starts_with(body),
        (false, false) => text == body,
    }
}

pub(crate) fn parse_where(
    clause: &str,
    params: &[Value],
    sql: &str,
) -> ReldocResult<Vec<Predicate>> {
    clause
        .split(" AND ")
        .map(|fragment| parse_predicate(fragment, params, sql))
        .collect()
}

fn parse_predicate(fragment: &str, params: &[Value], sql: &str) -> ReldocResult<Predicate> {
    if let Some(captures) = ANY_PREDICATE_RE.captures(fragment) {
        let value = param(params, &captures[2], sql)?;
        let values = match value {
            Value::Array(items) => items.clone(),
            scalar => vec![scalar.clone()],
        };
        return Ok(Predicate::AnyOf {
            column: unquote(&captures[1]),
            values,
        });
    }

    let captures = PREDICATE_RE.captures(fragment).ok_or_else(|| malformed(sql))?;
    let column = unquote(&captures[1]);
    let value = param(params, &captures[3], sql)?.clone();
    match &captures[2] {
        "ILIKE" => {
            let pattern = match value {
                Value::String(pattern) => pattern,
                other => {
                    return Err(ReldocError::new(
                        format!("ILIKE requires a string parameter, found {}", other.type_name()),
                        ErrorKind::BackendError,
                    ));
                }
            };
            Ok(Predicate::Like { column, pattern })
        }
        op_text => {
            let op = match op_text {
                "=" => CompareOp::Eq,
                "<>" => CompareOp::Ne,
                "<" => CompareOp::Lt,
                "<=" => CompareOp::Lte,
                ">" => CompareOp::Gt,
                ">=" => CompareOp::Gte,
                _ => return Err(malformed(sql)),
            };
            Ok(Predicate::Compare { column, op, value })
        }
    }
}

/// One SET-clause assignment parsed back from its SQL fragment.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Assignment {
    Set { column: String, value: Value },
    SetTimestamp { column: String, value: Value },
    Increment { column: String, amount: Value },
}

impl Assignment {
    pub(crate) fn apply(&self, row: &mut IndexMap<String, Value>) -> ReldocResult<()> {
        match self {
            Assignment::Set { column, value } => {
                row.insert(column.clone(), value.clone());
                Ok(())
            }
            Assignment::SetTimestamp { column, value } => {
                row.insert(column.clone(), Value::DateTime(coerce_timestamp(value)?));
                Ok(())
            }
            Assignment::Increment { column, amount } => {
                let current = row.get(column).cloned().unwrap_or(Value::I64(0));
                let next = match (&current, amount) {
                    (Value::I64(a), Value::I64(b)) => {
                        Value::I64(a.checked_add(*b).ok_or_else(|| {
                            ReldocError::new(
                                format!("increment of column {} overflows", column),
                                ErrorKind::BackendError,
                            )
                        })?)
                    }
                    (Value::Null, Value::I64(b)) => Value::I64(*b),
                    (a, b) => match (a.as_f64(), b.as_f64()) {
                        (Some(a), Some(b)) => Value::F64(a + b),
                        _ => {
                            return Err(ReldocError::new(
                                format!(
                                    "cannot increment column {} of type {}",
                                    column,
                                    current.type_name()
                                ),
                                ErrorKind::BackendError,
                            ));
                        }
                    },
                };
                row.insert(column.clone(), next);
                Ok(())
            }
        }
    }
}

/// Interprets `to_timestamp` over the bound value: numbers are epoch
/// seconds, strings must parse as RFC 3339.
fn coerce_timestamp(value: &Value) -> ReldocResult<DateTime<Utc>> {
    match value {
        Value::DateTime(dt) => Ok(*dt),
        Value::I64(seconds) => Utc.timestamp_opt(*seconds, 0).single().ok_or_else(|| {
            ReldocError::new(
                format!("epoch value out of range: {}", seconds),
                ErrorKind::BackendError,
            )
        }),
        Value::F64(seconds) => Utc
            .timestamp_opt(*seconds as i64, 0)
            .single()
            .ok_or_else(|| {
                ReldocError::new(
                    format!("epoch value out of range: {}", seconds),
                    ErrorKind::BackendError,
                )
            }),
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                ReldocError::new(
                    format!("cannot interpret {} as a timestamp: {}", text, e),
                    ErrorKind::BackendError,
                )
            }),
        other => Err(ReldocError::new(
            format!("cannot interpret {} as a timestamp", other.type_name()),
            ErrorKind::BackendError,
        )),
    }
}

pub(crate) fn parse_assignments(
    clause: &str,
    params: &[Value],
    sql: &str,
) -> ReldocResult<Vec<Assignment>> {
    clause
        .split(", ")
        .map(|fragment| {
            let captures = ASSIGNMENT_RE.captures(fragment).ok_or_else(|| malformed(sql))?;
            let column = unquote(&captures[1]);
            if let Some(index) = captures.get(2) {
                let value = param(params, index.as_str(), sql)?.clone();
                Ok(Assignment::SetTimestamp { column, value })
            } else if let Some(index) = captures.get(3) {
                let amount = param(params, index.as_str(), sql)?.clone();
                Ok(Assignment::Increment { column, amount })
            } else if let Some(index) = captures.get(4) {
                let value = param(params, index.as_str(), sql)?.clone();
                Ok(Assignment::Set { column, value })
            } else {
                Err(malformed(sql))
            }
        })
        .collect()
}

pub(crate) fn parse_order_by(clause: &str, sql: &str) -> ReldocResult<Vec<(String, SortOrder)>> {
    clause
        .split(", ")
        .map(|item| {
            let captures = ORDER_ITEM_RE.captures(item).ok_or_else(|| malformed(sql))?;
            let order = if &captures[2] == "ASC" {
                SortOrder::Ascending
            } else {
                SortOrder::Descending
            };
            Ok((unquote(&captures[1]), order))
        })
        .collect()
}

/// Total order over stored values for ORDER BY: NULLs sort first,
/// incomparable values keep their relative position.
pub(crate) fn order_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => a.compare(b).unwrap_or(Ordering::Equal),
    }
}

pub(crate) fn sort_rows(rows: &mut [IndexMap<String, Value>], keys: &[(String, SortOrder)]) {
    rows.sort_by(|a, b| {
        for (column, order) in keys {
            let left = a.get(column).unwrap_or(&Value::Null);
            let right = b.get(column).unwrap_or(&Value::Null);
            let ordering = match order {
                SortOrder::Ascending => order_values(left, right),
                SortOrder::Descending => order_values(right, left),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// The statement shapes the backend recognizes.
#[derive(Debug)]
pub(crate) enum Parsed {
    Insert {
        table: String,
        columns: Vec<(String, Value)>,
    },
    Count {
        table: String,
        predicates: Vec<Predicate>,
    },
    Select {
        table: String,
        projection: Option<Vec<String>>,
        predicates: Vec<Predicate>,
        order_by: Vec<(String, SortOrder)>,
        limit: Option<usize>,
        offset: Option<usize>,
    },
    Update {
        table: String,
        assignments: Vec<Assignment>,
        predicates: Vec<Predicate>,
    },
    Delete {
        table: String,
        predicates: Vec<Predicate>,
    },
}

pub(crate) fn parse(sql: &str, params: &[Value]) -> ReldocResult<Parsed> {
    if let Some(captures) = INSERT_RE.captures(sql) {
        let names: Vec<String> = captures[2]
            .split(", ")
            .map(|name| {
                name.strip_prefix('"')
                    .and_then(|n| n.strip_suffix('"'))
                    .map(unquote)
                    .ok_or_else(|| malformed(sql))
            })
            .collect::<ReldocResult<_>>()?;
        let mut columns = Vec::with_capacity(names.len());
        for (name, placeholder) in names.into_iter().zip(captures[3].split(", ")) {
            let index = placeholder.strip_prefix('$').ok_or_else(|| malformed(sql))?;
            columns.push((name, param(params, index, sql)?.clone()));
        }
        return Ok(Parsed::Insert {
            table: unquote(&captures[1]),
            columns,
        });
    }

    if let Some(captures) = COUNT_RE.captures(sql) {
        let predicates = match captures.get(2) {
            Some(clause) => parse_where(clause.as_str(), params, sql)?,
            None => Vec::new(),
        };
        return Ok(Parsed::Count {
            table: unquote(&captures[1]),
            predicates,
        });
    }

    if let Some(captures) = SELECT_RE.captures(sql) {
        let projection = match &captures[1] {
            "*" => None,
            columns => Some(
                columns
                    .split(", ")
                    .map(|name| {
                        name.strip_prefix('"')
                            .and_then(|n| n.strip_suffix('"'))
                            .map(unquote)
                            .ok_or_else(|| malformed(sql))
                    })
                    .collect::<ReldocResult<_>>()?,
            ),
        };
        let predicates = match captures.get(3) {
            Some(clause) => parse_where(clause.as_str(), params, sql)?,
            None => Vec::new(),
        };
        let order_by = parse_order_by(&captures[4], sql)?;
        let limit = captures
            .get(5)
            .map(|m| m.as_str().parse::<usize>().map_err(|_| malformed(sql)))
            .transpose()?;
        let offset = captures
            .get(6)
            .map(|m| m.as_str().parse::<usize>().map_err(|_| malformed(sql)))
            .transpose()?;
        return Ok(Parsed::Select {
            table: unquote(&captures[2]),
            projection,
            predicates,
            order_by,
            limit,
            offset,
        });
    }

    if let Some(captures) = UPDATE_RE.captures(sql) {
        let assignments = parse_assignments(&captures[2], params, sql)?;
        let predicates = match captures.get(3) {
            Some(clause) => parse_where(clause.as_str(), params, sql)?,
            None => Vec::new(),
        };
        return Ok(Parsed::Update {
            table: unquote(&captures[1]),
            assignments,
            predicates,
        });
    }

    if let Some(captures) = DELETE_RE.captures(sql) {
        let predicates = match captures.get(2) {
            Some(clause) => parse_where(clause.as_str(), params, sql)?,
            None => Vec::new(),
        };
        return Ok(Parsed::Delete {
            table: unquote(&captures[1]),
            predicates,
        });
    }

    Err(malformed(sql))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_parse_insert() {
        let parsed = parse(
            "INSERT INTO \"books\" (\"title\", \"_id\") VALUES ($1, $2) RETURNING *",
            &[Value::String("W".into()), Value::String("id1".into())],
        )
        .unwrap();
        match parsed {
            Parsed::Insert { table, columns } => {
                assert_eq!(table, "books");
                assert_eq!(columns[0].0, "title");
                assert_eq!(columns[1].1, Value::String("id1".into()));
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_parse_select_full_shape() {
        let parsed = parse(
            "SELECT \"_id\", \"title\" FROM \"books\" WHERE \"edition\" = ANY($1) \
             ORDER BY \"edition\" ASC LIMIT 5 OFFSET 2",
            &[Value::Array(vec![Value::I64(2), Value::I64(3)])],
        )
        .unwrap();
        match parsed {
            Parsed::Select {
                table,
                projection,
                predicates,
                order_by,
                limit,
                offset,
            } => {
                assert_eq!(table, "books");
                assert_eq!(projection, Some(vec!["_id".to_string(), "title".to_string()]));
                assert_eq!(predicates.len(), 1);
                assert_eq!(order_by, vec![("edition".to_string(), SortOrder::Ascending)]);
                assert_eq!(limit, Some(5));
                assert_eq!(offset, Some(2));
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_predicate_comparisons() {
        let predicate = Predicate::Compare {
            column: "age".to_string(),
            op: CompareOp::Gt,
            value: Value::I64(30),
        };
        assert!(predicate.matches(&row(&[("age", Value::I64(31))])));
        assert!(!predicate.matches(&row(&[("age", Value::I64(30))])));
        // NULL never satisfies a comparison
        assert!(!predicate.matches(&row(&[("age", Value::Null)])));
        assert!(!predicate.matches(&row(&[])));
    }

    #[test]
    fn test_any_predicate() {
        let predicate = Predicate::AnyOf {
            column: "edition".to_string(),
            values: vec![Value::I64(2), Value::I64(3)],
        };
        assert!(predicate.matches(&row(&[("edition", Value::I64(3))])));
        assert!(!predicate.matches(&row(&[("edition", Value::I64(1))])));
    }

    #[test]
    fn test_ilike_is_case_insensitive_containment() {
        let predicate = Predicate::Like {
            column: "title".to_string(),
            pattern: "%adventure%".to_string(),
        };
        assert!(predicate.matches(&row(&[(
            "title",
            Value::String("Amazon Adventure 1".to_string())
        )])));
        assert!(!predicate.matches(&row(&[(
            "title",
            Value::String("War and Peace".to_string())
        )])));
    }

    #[test]
    fn test_parse_update_assignments() {
        let sql = "UPDATE \"books\" SET \"status\" = $1, \"_lastModifiedAt\" = to_timestamp($2), \
                   \"reviews\" = \"reviews\" + $3 WHERE \"title\" = $4 RETURNING *";
        let params = vec![
            Value::String("read".into()),
            Value::I64(1700000000),
            Value::I64(1),
            Value::String("X".into()),
        ];
        let parsed = parse(sql, &params).unwrap();
        match parsed {
            Parsed::Update {
                assignments,
                predicates,
                ..
            } => {
                assert_eq!(assignments.len(), 3);
                assert!(matches!(assignments[0], Assignment::Set { .. }));
                assert!(matches!(assignments[1], Assignment::SetTimestamp { .. }));
                assert!(matches!(assignments[2], Assignment::Increment { .. }));
                assert_eq!(predicates.len(), 1);
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_increment_applies_to_integer() {
        let assignment = Assignment::Increment {
            column: "reviews".to_string(),
            amount: Value::I64(1),
        };
        let mut stored = row(&[("reviews", Value::I64(0))]);
        assignment.apply(&mut stored).unwrap();
        assert_eq!(stored["reviews"], Value::I64(1));
    }

    #[test]
    fn test_increment_overflow_is_backend_error() {
        let assignment = Assignment::Increment {
            column: "reviews".to_string(),
            amount: Value::I64(1),
        };
        let mut stored = row(&[("reviews", Value::I64(i64::MAX))]);
        let err = assignment.apply(&mut stored).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::BackendError);
    }

    #[test]
    fn test_sort_rows_multi_key() {
        let mut rows = vec![
            row(&[("a", Value::I64(1)), ("b", Value::I64(2))]),
            row(&[("a", Value::I64(1)), ("b", Value::I64(1))]),
            row(&[("a", Value::I64(0)), ("b", Value::I64(9))]),
        ];
        sort_rows(
            &mut rows,
            &[
                ("a".to_string(), SortOrder::Ascending),
                ("b".to_string(), SortOrder::Descending),
            ],
        );
        assert_eq!(rows[0]["a"], Value::I64(0));
        assert_eq!(rows[1]["b"], Value::I64(2));
        assert_eq!(rows[2]["b"], Value::I64(1));
    }

    #[test]
    fn test_unrecognized_statement_is_rejected() {
        let err = parse("TRUNCATE TABLE \"books\"", &[]).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::BackendError);
    }
}

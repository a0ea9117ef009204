use itertools::Itertools;

use crate::common::{is_reference_field, Value, TIMESTAMP_FIELDS};
use crate::compiler::{quote_ident, Statement};
use crate::errors::{ErrorKind, ReldocError, ReldocResult};
use crate::filter::{Condition, Filter, FilterOperator};
use crate::update::UpdateSpec;

/// Renders an equality-only WHERE clause for mutation statements.
///
/// Update and delete offer no operator richness: every filter field
/// must be a bare value or an explicit `eq` condition.
fn compile_eq_where(filter: &Filter, start_index: usize) -> ReldocResult<(String, Vec<Value>)> {
    let mut fragments = Vec::with_capacity(filter.len());
    let mut params = Vec::with_capacity(filter.len());

    for (field, condition) in filter.iter() {
        let value = match condition {
            Condition::Value(value) => value.clone(),
            Condition::Operator(FilterOperator::Eq, value) => value.clone(),
            other => {
                log::error!(
                    "Mutation filters support equality only, field {} uses {:?}",
                    field,
                    other
                );
                return Err(ReldocError::new(
                    format!("mutation filters support equality only, field: {}", field),
                    ErrorKind::UnsupportedOperator,
                ));
            }
        };
        let index = start_index + params.len();
        fragments.push(format!("{} = ${}", quote_ident(field)?, index));
        params.push(value);
    }

    Ok((fragments.join(" AND "), params))
}

/// Compiles one parameterized `INSERT ... RETURNING *` for the given
/// ordered column/value pairs.
pub fn compile_insert(table: &str, columns: &[(String, Value)]) -> ReldocResult<Statement> {
    if columns.is_empty() {
        return Err(ReldocError::new(
            "insert requires at least one column",
            ErrorKind::InvalidOperation,
        ));
    }

    let names = columns
        .iter()
        .map(|(name, _)| quote_ident(name))
        .collect::<ReldocResult<Vec<String>>>()?
        .join(", ");
    let placeholders = (1..=columns.len()).map(|n| format!("${}", n)).join(", ");
    let params = columns.iter().map(|(_, value)| value.clone()).collect();

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        quote_ident(table)?,
        names,
        placeholders
    );
    Ok(Statement::new(sql, params))
}

/// Compiles a parameterized `UPDATE ... RETURNING *`.
///
/// `set` assignments render before `inc` increments, each group in its
/// own key order. Timestamp-typed internal fields are wrapped in the
/// backend timestamp constructor; reference-prefixed targets are
/// skipped. The WHERE clause is equality-per-field in filter order,
/// with parameter numbering continuing after the assignment parameters.
pub fn compile_update(
    filter: &Filter,
    table: &str,
    update: &UpdateSpec,
) -> ReldocResult<Statement> {
    let mut assignments = Vec::with_capacity(update.len());
    let mut params: Vec<Value> = Vec::with_capacity(update.len() + filter.len());

    for (field, value) in &update.set_fields {
        if is_reference_field(field) {
            log::warn!("Skipping update of reference field: {}", field);
            continue;
        }
        let column = quote_ident(field)?;
        let index = params.len() + 1;
        if TIMESTAMP_FIELDS.contains(&field.as_str()) {
            assignments.push(format!("{} = to_timestamp(${})", column, index));
        } else {
            assignments.push(format!("{} = ${}", column, index));
        }
        params.push(value.clone());
    }

    for (field, amount) in &update.inc_fields {
        if is_reference_field(field) {
            log::warn!("Skipping increment of reference field: {}", field);
            continue;
        }
        let column = quote_ident(field)?;
        let index = params.len() + 1;
        assignments.push(format!("{} = {} + ${}", column, column, index));
        params.push(amount.clone());
    }

    if assignments.is_empty() {
        return Err(ReldocError::new(
            "update specification contains no applicable mutations",
            ErrorKind::InvalidOperation,
        ));
    }

    let (where_clause, where_params) = compile_eq_where(filter, params.len() + 1)?;
    params.extend(where_params);

    let mut sql = format!(
        "UPDATE {} SET {}",
        quote_ident(table)?,
        assignments.join(", ")
    );
    if !where_clause.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_clause);
    }
    sql.push_str(" RETURNING *");

    Ok(Statement::new(sql, params))
}

/// Compiles a parameterized `DELETE ... RETURNING *` with an
/// equality-per-field WHERE clause.
pub fn compile_delete(filter: &Filter, table: &str) -> ReldocResult<Statement> {
    let (where_clause, params) = compile_eq_where(filter, 1)?;
    let mut sql = format!("DELETE FROM {}", quote_ident(table)?);
    if !where_clause.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_clause);
    }
    sql.push_str(" RETURNING *");
    Ok(Statement::new(sql, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{all, field};

    #[test]
    fn test_compile_insert() {
        let columns = vec![
            ("title".to_string(), Value::String("War and Peace".to_string())),
            ("_id".to_string(), Value::String("abc".to_string())),
        ];
        let statement = compile_insert("books", &columns).unwrap();
        assert_eq!(
            statement.sql,
            "INSERT INTO \"books\" (\"title\", \"_id\") VALUES ($1, $2) RETURNING *"
        );
        assert_eq!(statement.params.len(), 2);
    }

    #[test]
    fn test_compile_insert_rejects_empty_columns() {
        let err = compile_insert("books", &[]).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_update_set_before_inc() {
        let update = UpdateSpec::new().inc("reviews", 1i64).set("status", "read");
        let statement = compile_update(&field("title").eq("X"), "books", &update).unwrap();
        assert_eq!(
            statement.sql,
            "UPDATE \"books\" SET \"status\" = $1, \"reviews\" = \"reviews\" + $2 \
             WHERE \"title\" = $3 RETURNING *"
        );
        assert_eq!(
            statement.params,
            vec![
                Value::String("read".to_string()),
                Value::I64(1),
                Value::String("X".to_string()),
            ]
        );
    }

    #[test]
    fn test_update_wraps_timestamp_fields() {
        let update = UpdateSpec::new().set("_lastModifiedAt", 1700000000i64);
        let statement = compile_update(&all(), "books", &update).unwrap();
        assert!(statement
            .sql
            .contains("\"_lastModifiedAt\" = to_timestamp($1)"));
    }

    #[test]
    fn test_update_skips_reference_fields() {
        let update = UpdateSpec::new().set("ref_author", "a1").set("title", "Y");
        let statement = compile_update(&all(), "books", &update).unwrap();
        assert!(!statement.sql.contains("ref_author"));
        assert!(statement.sql.contains("\"title\" = $1"));
        assert_eq!(statement.params, vec![Value::String("Y".to_string())]);
    }

    #[test]
    fn test_update_with_only_reference_targets_is_invalid() {
        let update = UpdateSpec::new().set("ref_author", "a1");
        let err = compile_update(&all(), "books", &update).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_update_rejects_non_equality_filter() {
        let update = UpdateSpec::new().set("title", "Y");
        let err = compile_update(&field("age").gt(30), "books", &update).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UnsupportedOperator);
    }

    #[test]
    fn test_compile_delete() {
        let statement = compile_delete(&field("title").eq("X"), "books").unwrap();
        assert_eq!(
            statement.sql,
            "DELETE FROM \"books\" WHERE \"title\" = $1 RETURNING *"
        );
        assert_eq!(statement.params, vec![Value::String("X".to_string())]);
    }

    #[test]
    fn test_compile_delete_without_filter() {
        let statement = compile_delete(&all(), "books").unwrap();
        assert_eq!(statement.sql, "DELETE FROM \"books\" RETURNING *");
        assert!(statement.params.is_empty());
    }
}

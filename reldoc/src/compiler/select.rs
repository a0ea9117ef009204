use itertools::Itertools;

use crate::common::{Value, DOC_CREATED_AT, DOC_ID};
use crate::compiler::{quote_ident, resolve_condition, Statement};
use crate::errors::ReldocResult;
use crate::filter::Filter;
use crate::options::FindOptions;

/// Renders the WHERE clause for a filter, assigning positional
/// parameters starting at `start_index` in the filter's field order.
///
/// Returns the clause without the `WHERE` keyword, empty for an empty
/// filter, along with the bound parameter values.
pub(crate) fn compile_where(
    filter: &Filter,
    start_index: usize,
) -> ReldocResult<(String, Vec<Value>)> {
    let mut fragments = Vec::with_capacity(filter.len());
    let mut params = Vec::with_capacity(filter.len());

    for (position, (field, condition)) in filter.iter().enumerate() {
        let column = quote_ident(field)?;
        let (operator, value) = resolve_condition(field, condition)?;
        fragments.push(operator.fragment(&column, start_index + position));
        params.push(value);
    }

    Ok((fragments.join(" AND "), params))
}

fn compile_order_by(filter: &Filter, options: &FindOptions) -> ReldocResult<String> {
    let explicit = options.sort_by.as_ref().filter(|fields| !fields.is_empty());

    let clause = if let Some(fields) = explicit {
        fields
            .iter()
            .map(|(field, order)| Ok(format!("{} {}", quote_ident(field)?, order.as_sql())))
            .collect::<ReldocResult<Vec<String>>>()?
            .join(", ")
    } else if filter.is_empty() {
        // default sort for an unfiltered find
        format!("{} ASC", quote_ident(DOC_CREATED_AT)?)
    } else {
        filter
            .fields()
            .map(|field| Ok(format!("{} ASC", quote_ident(field)?)))
            .collect::<ReldocResult<Vec<String>>>()?
            .join(", ")
    };

    Ok(clause)
}

fn compile_projection(options: &FindOptions) -> ReldocResult<String> {
    match &options.projection {
        None => Ok("*".to_string()),
        Some(fields) => {
            let mut columns = vec![quote_ident(DOC_ID)?];
            for field in fields {
                if field == DOC_ID {
                    continue;
                }
                columns.push(quote_ident(field)?);
            }
            Ok(columns.iter().join(", "))
        }
    }
}

/// Compiles a filter and find options into a parameterized SELECT.
///
/// The statement always carries an ORDER BY clause: explicit sort if
/// given, otherwise ascending `_createdAt` for an empty filter, or
/// ascending by each filter field in filter order. LIMIT and OFFSET
/// follow ORDER BY, in that order.
pub fn compile_select(
    filter: &Filter,
    table: &str,
    options: &FindOptions,
) -> ReldocResult<Statement> {
    let columns = compile_projection(options)?;
    let (where_clause, params) = compile_where(filter, 1)?;

    let mut sql = format!("SELECT {} FROM {}", columns, quote_ident(table)?);
    if !where_clause.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_clause);
    }
    sql.push_str(" ORDER BY ");
    sql.push_str(&compile_order_by(filter, options)?);

    if let Some(limit) = options.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
    if let Some(skip) = options.skip {
        sql.push_str(&format!(" OFFSET {}", skip));
    }

    Ok(Statement::new(sql, params))
}

/// Compiles a `SELECT COUNT(*)` over the same WHERE clause as the
/// paired find, so pagination totals reflect the filter.
pub fn compile_count(filter: &Filter, table: &str) -> ReldocResult<Statement> {
    let (where_clause, params) = compile_where(filter, 1)?;
    let mut sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table)?);
    if !where_clause.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_clause);
    }
    Ok(Statement::new(sql, params))
}

use indexmap::IndexMap;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;
use uuid::Uuid;

use crate::common::Value;
use crate::errors::{ErrorKind, ReldocError, ReldocResult};

static CREATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^CREATE TABLE IF NOT EXISTS "((?:[^"]|"")+)" \((.+)\)$"#).unwrap()
});

static COLUMN_DEF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^"((?:[^"]|"")+)" ([A-Z]+(?:\(\d+\))?)( PRIMARY KEY)?( DEFAULT gen_random_uuid\(\))?( NOT NULL)?$"#,
    )
    .unwrap()
});

static ALTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^ALTER TABLE "((?:[^"]|"")+)" ADD COLUMN "((?:[^"]|"")+)" ([A-Z]+(?:\(\d+\))?)( NOT NULL)?$"#,
    )
    .unwrap()
});

fn unquote(ident: &str) -> String {
    ident.replace("\"\"", "\"")
}

fn ddl_error(sql: &str) -> ReldocError {
    log::error!("DDL statement does not match the supported grammar: {}", sql);
    ReldocError::new(
        format!("unsupported DDL statement: {}", sql),
        ErrorKind::BackendError,
    )
}

/// Physical column metadata tracked per table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ColumnDef {
    pub(crate) sql_type: String,
    pub(crate) not_null: bool,
    pub(crate) primary_key: bool,
    pub(crate) generated_default: bool,
}

/// One in-memory table: column definitions plus stored rows.
#[derive(Debug, Default)]
pub(crate) struct MemTable {
    pub(crate) columns: IndexMap<String, ColumnDef>,
    pub(crate) rows: Vec<IndexMap<String, Value>>,
}

impl MemTable {
    /// Inserts one row from its ordered column/value pairs, enforcing
    /// column existence, NOT NULL constraints, primary key uniqueness,
    /// and the generated default for omitted key columns. Returns the
    /// stored row in table column order.
    pub(crate) fn insert_row(
        &mut self,
        values: Vec<(String, Value)>,
    ) -> ReldocResult<IndexMap<String, Value>> {
        let mut provided: IndexMap<String, Value> = IndexMap::new();
        for (name, value) in values {
            if !self.columns.contains_key(&name) {
                return Err(ReldocError::new(
                    format!("column does not exist: {}", name),
                    ErrorKind::BackendError,
                ));
            }
            provided.insert(name, value);
        }

        let mut row = IndexMap::with_capacity(self.columns.len());
        for (name, def) in &self.columns {
            let mut value = provided.shift_remove(name).unwrap_or(Value::Null);
            if value == Value::Null && def.generated_default {
                value = Value::String(Uuid::new_v4().to_string());
            }
            if value == Value::Null && def.not_null {
                return Err(ReldocError::new(
                    format!("null value in column {} violates not-null constraint", name),
                    ErrorKind::BackendError,
                ));
            }
            row.insert(name.clone(), value);
        }

        for (name, def) in &self.columns {
            if !def.primary_key {
                continue;
            }
            let key = &row[name];
            let duplicate = self
                .rows
                .iter()
                .any(|existing| existing[name].compare(key) == Some(Ordering::Equal));
            if duplicate {
                return Err(ReldocError::new(
                    format!("duplicate key value violates unique constraint on {}", name),
                    ErrorKind::BackendError,
                ));
            }
        }

        self.rows.push(row.clone());
        Ok(row)
    }
}

/// A DDL statement recognized by the in-memory backend.
pub(crate) enum ParsedDdl {
    CreateTable {
        table: String,
        columns: IndexMap<String, ColumnDef>,
    },
    AddColumn {
        table: String,
        column: String,
        def: ColumnDef,
    },
}

pub(crate) fn parse_ddl(sql: &str) -> ReldocResult<ParsedDdl> {
    if let Some(captures) = CREATE_RE.captures(sql) {
        let mut columns = IndexMap::new();
        for definition in captures[2].split(", ") {
            let parts = COLUMN_DEF_RE
                .captures(definition)
                .ok_or_else(|| ddl_error(sql))?;
            columns.insert(
                unquote(&parts[1]),
                ColumnDef {
                    sql_type: parts[2].to_string(),
                    not_null: parts.get(5).is_some(),
                    primary_key: parts.get(3).is_some(),
                    generated_default: parts.get(4).is_some(),
                },
            );
        }
        return Ok(ParsedDdl::CreateTable {
            table: unquote(&captures[1]),
            columns,
        });
    }

    if let Some(captures) = ALTER_RE.captures(sql) {
        return Ok(ParsedDdl::AddColumn {
            table: unquote(&captures[1]),
            column: unquote(&captures[2]),
            def: ColumnDef {
                sql_type: captures[3].to_string(),
                not_null: captures.get(4).is_some(),
                primary_key: false,
                generated_default: false,
            },
        });
    }

    Err(ddl_error(sql))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn books_table() -> MemTable {
        let ddl = "CREATE TABLE IF NOT EXISTS \"books\" (\
                   \"_id\" VARCHAR(255) PRIMARY KEY DEFAULT gen_random_uuid(), \
                   \"title\" VARCHAR(255) NOT NULL, \
                   \"reviews\" INTEGER)";
        match parse_ddl(ddl).unwrap() {
            ParsedDdl::CreateTable { columns, .. } => MemTable {
                columns,
                rows: Vec::new(),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_parse_create_table() {
        let table = books_table();
        assert_eq!(table.columns.len(), 3);
        let id = &table.columns["_id"];
        assert!(id.primary_key);
        assert!(id.generated_default);
        assert!(!id.not_null);
        assert!(table.columns["title"].not_null);
        assert_eq!(table.columns["reviews"].sql_type, "INTEGER");
    }

    #[test]
    fn test_parse_add_column() {
        let ddl = "ALTER TABLE \"books\" ADD COLUMN \"pages\" INTEGER NOT NULL";
        match parse_ddl(ddl).unwrap() {
            ParsedDdl::AddColumn { table, column, def } => {
                assert_eq!(table, "books");
                assert_eq!(column, "pages");
                assert_eq!(def.sql_type, "INTEGER");
                assert!(def.not_null);
            }
            _ => panic!("expected AddColumn"),
        }
    }

    #[test]
    fn test_insert_generates_missing_id() {
        let mut table = books_table();
        let row = table
            .insert_row(vec![("title".to_string(), Value::String("W".into()))])
            .unwrap();
        assert!(matches!(row["_id"], Value::String(_)));
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_insert_enforces_not_null() {
        let mut table = books_table();
        let err = table
            .insert_row(vec![("reviews".to_string(), Value::I64(1))])
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::BackendError);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_insert_rejects_duplicate_key() {
        let mut table = books_table();
        let columns = vec![
            ("title".to_string(), Value::String("W".into())),
            ("_id".to_string(), Value::String("same".into())),
        ];
        table.insert_row(columns.clone()).unwrap();
        let err = table.insert_row(columns).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::BackendError);
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_insert_rejects_unknown_column() {
        let mut table = books_table();
        let err = table
            .insert_row(vec![("nope".to_string(), Value::I64(1))])
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::BackendError);
    }
}

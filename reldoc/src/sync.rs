//! Additive reconciliation of physical tables against field schemas.

use itertools::Itertools;

use crate::backend::SqlBackend;
use crate::common::{
    is_reserved_field, LockRegistry, DOC_CREATED_AT, DOC_HISTORY, DOC_ID, DOC_LAST_MODIFIED_AT,
    RESERVED_FIELDS,
};
use crate::compiler::quote_ident;
use crate::errors::ReldocResult;
use crate::schema::{FieldSchema, FieldSpec};

/// Keeps a table's columns a superset of a declared field schema.
///
/// Reconciliation is additive only: columns are created, never
/// altered, narrowed, or dropped. The read-then-act race on first
/// creation is removed twice over: the table's named write lock is
/// held for the duration of the call, and creation itself uses the
/// idempotent `IF NOT EXISTS` form.
#[derive(Clone)]
pub struct SchemaSynchronizer {
    backend: SqlBackend,
    locks: LockRegistry,
}

/// Physical type of an internal bookkeeping column.
fn internal_column_type(field: &str) -> &'static str {
    if field == DOC_CREATED_AT || field == DOC_LAST_MODIFIED_AT {
        "TIMESTAMP"
    } else if field == DOC_HISTORY {
        "JSON"
    } else {
        "VARCHAR(255)"
    }
}

fn column_definition(name: &str, spec: &FieldSpec) -> ReldocResult<String> {
    let mut definition = format!("{} {}", quote_ident(name)?, spec.field_type.column_type());
    if spec.required {
        definition.push_str(" NOT NULL");
    }
    Ok(definition)
}

impl SchemaSynchronizer {
    pub fn new(backend: SqlBackend) -> SchemaSynchronizer {
        SchemaSynchronizer {
            backend,
            locks: LockRegistry::new(),
        }
    }

    /// Ensures `table` exists with at least the eight internal columns
    /// plus one column per schema field.
    pub fn reconcile(&self, table: &str, schema: &FieldSchema) -> ReldocResult<()> {
        let lock = self.locks.get_lock(table);
        let _guard = lock.write();

        if !self.backend.table_exists(table)? {
            self.create_table(table, schema)
        } else {
            self.add_missing_columns(table, schema)
        }
    }

    fn create_table(&self, table: &str, schema: &FieldSchema) -> ReldocResult<()> {
        let mut definitions = Vec::with_capacity(RESERVED_FIELDS.len() + schema.len());
        for field in RESERVED_FIELDS {
            let column = quote_ident(field)?;
            if field == DOC_ID {
                definitions.push(format!(
                    "{} VARCHAR(255) PRIMARY KEY DEFAULT gen_random_uuid()",
                    column
                ));
            } else {
                definitions.push(format!("{} {}", column, internal_column_type(field)));
            }
        }
        for (name, spec) in schema.iter() {
            if is_reserved_field(name) {
                continue;
            }
            definitions.push(column_definition(name, spec)?);
        }

        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(table)?,
            definitions.iter().join(", ")
        );
        log::debug!("Creating table {}: {}", table, sql);
        self.backend.execute_ddl(&sql)
    }

    fn add_missing_columns(&self, table: &str, schema: &FieldSchema) -> ReldocResult<()> {
        for (name, spec) in schema.iter() {
            if is_reserved_field(name) || self.backend.column_exists(table, name)? {
                continue;
            }
            let sql = format!(
                "ALTER TABLE {} ADD COLUMN {}",
                quote_ident(table)?,
                column_definition(name, spec)?
            );
            log::debug!("Adding column {} to {}", name, table);
            self.backend.execute_ddl(&sql)?;
        }
        Ok(())
    }
}

//! Backend abstraction: the SQL surface a physical store must provide.
//!
//! A backend executes the statements the compiler emits and answers
//! catalog-existence questions for the schema synchronizer. The core
//! crate ships [memory::InMemoryBackend]; the Postgres adapter crate
//! implements the same trait over a real server.

pub mod memory;

use indexmap::IndexMap;
use std::ops::Deref;
use std::sync::Arc;

use crate::common::Value;
use crate::compiler::Statement;
use crate::connection::ConnectionConfig;
use crate::document::Document;
use crate::errors::ReldocResult;

/// One result row returned by a backend, columns in SELECT order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: IndexMap<String, Value>,
}

impl Row {
    pub fn new() -> Row {
        Row::default()
    }

    /// Sets a column value, replacing any previous value for the name.
    pub fn set(&mut self, name: &str, value: Value) {
        self.columns.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Value {
        self.columns.get(name).cloned().unwrap_or(Value::Null)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Converts the row into a document, dropping NULL columns so the
    /// result mirrors what the caller originally stored.
    pub fn into_document(self) -> Document {
        self.columns
            .into_iter()
            .filter(|(_, value)| *value != Value::Null)
            .collect()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Row {
            columns: iter.into_iter().collect(),
        }
    }
}

/// Low-level interface every physical backend must implement.
///
/// # Key Responsibilities
/// - **Lifecycle**: open the one physical connection, close it
/// - **Catalog checks**: table and column existence for reconciliation
/// - **DDL**: `CREATE TABLE IF NOT EXISTS` / `ALTER TABLE ... ADD COLUMN`
/// - **DML**: parameterized statements with `RETURNING *` semantics
///
/// # Thread Safety
/// Implementers must be `Send + Sync`; statements are issued
/// sequentially by the connector, single-flight per connection.
pub trait SqlBackendProvider: Send + Sync {
    /// Opens the physical connection described by the configuration.
    fn open(&self, config: &ConnectionConfig) -> ReldocResult<()>;

    /// Closes the backend. Further statements fail.
    fn close(&self) -> ReldocResult<()>;

    /// Returns true if a table with the given name exists.
    fn table_exists(&self, table: &str) -> ReldocResult<bool>;

    /// Returns true if the table has a column with the given name.
    fn column_exists(&self, table: &str, column: &str) -> ReldocResult<bool>;

    /// Executes a DDL statement that produces no rows.
    fn execute_ddl(&self, sql: &str) -> ReldocResult<()>;

    /// Executes a parameterized statement, returning any result rows.
    ///
    /// For `RETURNING *` statements the rows are the affected records;
    /// for `SELECT COUNT(*)` a single row with a single numeric column.
    fn execute(&self, statement: &Statement) -> ReldocResult<Vec<Row>>;

    /// A short name identifying the backend implementation.
    fn backend_name(&self) -> &'static str;
}

/// Handle to a backend implementation.
///
/// Wraps `Arc<dyn SqlBackendProvider>` and dereferences to it, so all
/// provider methods are callable directly on the handle.
#[derive(Clone)]
pub struct SqlBackend {
    inner: Arc<dyn SqlBackendProvider>,
}

impl SqlBackend {
    pub fn new(provider: impl SqlBackendProvider + 'static) -> Self {
        SqlBackend {
            inner: Arc::new(provider),
        }
    }
}

impl Deref for SqlBackend {
    type Target = Arc<dyn SqlBackendProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl std::fmt::Debug for SqlBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlBackend")
            .field("backend", &self.inner.backend_name())
            .finish()
    }
}

/// Supplies a backend to the connector builder.
///
/// Adapter crates expose a module type implementing this trait; the
/// builder's `load_backend` accepts any of them.
pub trait BackendModule {
    fn backend(&self) -> ReldocResult<SqlBackend>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_into_document_drops_nulls() {
        let mut row = Row::new();
        row.set("_id", Value::String("abc".to_string()));
        row.set("title", Value::String("War and Peace".to_string()));
        row.set("reviews", Value::Null);
        let document = row.into_document();
        assert_eq!(document.len(), 2);
        assert_eq!(document.id(), Some("abc"));
        assert!(!document.contains_key("reviews"));
    }

    #[test]
    fn test_row_set_replaces() {
        let mut row = Row::new();
        row.set("a", Value::I64(1));
        row.set("a", Value::I64(2));
        assert_eq!(row.get("a"), Value::I64(2));
        assert_eq!(row.len(), 1);
    }

    #[test]
    fn test_backend_handle_derefs_to_provider() {
        struct StubBackend;

        impl SqlBackendProvider for StubBackend {
            fn open(&self, _config: &ConnectionConfig) -> ReldocResult<()> {
                Ok(())
            }
            fn close(&self) -> ReldocResult<()> {
                Ok(())
            }
            fn table_exists(&self, _table: &str) -> ReldocResult<bool> {
                Ok(false)
            }
            fn column_exists(&self, _table: &str, _column: &str) -> ReldocResult<bool> {
                Ok(false)
            }
            fn execute_ddl(&self, _sql: &str) -> ReldocResult<()> {
                Ok(())
            }
            fn execute(&self, _statement: &Statement) -> ReldocResult<Vec<Row>> {
                Ok(Vec::new())
            }
            fn backend_name(&self) -> &'static str {
                "stub"
            }
        }

        let backend = SqlBackend::new(StubBackend);
        assert_eq!(backend.backend_name(), "stub");
        assert!(!backend.table_exists("books").unwrap());
    }
}

use parking_lot::Mutex;
use postgres::types::ToSql;
use postgres::{Client, NoTls};

use reldoc::backend::{Row, SqlBackendProvider};
use reldoc::compiler::Statement;
use reldoc::{ConnectionConfig, ErrorKind, ReldocError, ReldocResult};

use crate::config::PostgresConfig;
use crate::convert::{decode_row, value_to_param, PgParam};

const TABLE_EXISTS_SQL: &str = "SELECT 1 FROM information_schema.tables \
     WHERE table_schema = current_schema() AND table_name = $1";

const COLUMN_EXISTS_SQL: &str = "SELECT 1 FROM information_schema.columns \
     WHERE table_schema = current_schema() AND table_name = $1 AND column_name = $2";

/// PostgreSQL implementation of the backend contract.
///
/// Wraps one blocking `postgres::Client` behind a mutex: the connector
/// issues statements sequentially, so a single connection with
/// single-flight discipline is sufficient. Catalog checks go through
/// `information_schema`.
pub struct PostgresBackend {
    config: PostgresConfig,
    client: Mutex<Option<Client>>,
}

impl PostgresBackend {
    pub fn new(config: PostgresConfig) -> PostgresBackend {
        PostgresBackend {
            config,
            client: Mutex::new(None),
        }
    }

    fn with_client<R>(&self, f: impl FnOnce(&mut Client) -> ReldocResult<R>) -> ReldocResult<R> {
        let mut guard = self.client.lock();
        let client = guard.as_mut().ok_or_else(|| {
            ReldocError::new(
                "postgres backend is not open",
                ErrorKind::BackendError,
            )
        })?;
        f(client)
    }
}

fn driver_error(context: &str, e: postgres::Error) -> ReldocError {
    log::error!("{}: {}", context, e);
    ReldocError::new(format!("{}: {}", context, e), ErrorKind::BackendError)
}

impl SqlBackendProvider for PostgresBackend {
    fn open(&self, config: &ConnectionConfig) -> ReldocResult<()> {
        let dsn = self.config.dsn(config);
        log::debug!(
            "Connecting to postgres at {}:{}/{}",
            config.host,
            config.port,
            config.database
        );
        let client = Client::connect(&dsn, NoTls)
            .map_err(|e| driver_error("failed to connect to postgres", e))?;
        *self.client.lock() = Some(client);
        Ok(())
    }

    fn close(&self) -> ReldocResult<()> {
        // dropping the client closes the connection
        self.client.lock().take();
        Ok(())
    }

    fn table_exists(&self, table: &str) -> ReldocResult<bool> {
        self.with_client(|client| {
            let rows = client
                .query(TABLE_EXISTS_SQL, &[&table])
                .map_err(|e| driver_error("table existence check failed", e))?;
            Ok(!rows.is_empty())
        })
    }

    fn column_exists(&self, table: &str, column: &str) -> ReldocResult<bool> {
        self.with_client(|client| {
            let rows = client
                .query(COLUMN_EXISTS_SQL, &[&table, &column])
                .map_err(|e| driver_error("column existence check failed", e))?;
            Ok(!rows.is_empty())
        })
    }

    fn execute_ddl(&self, sql: &str) -> ReldocResult<()> {
        self.with_client(|client| {
            client
                .batch_execute(sql)
                .map_err(|e| driver_error("DDL execution failed", e))
        })
    }

    fn execute(&self, statement: &Statement) -> ReldocResult<Vec<Row>> {
        let params: Vec<PgParam> = statement
            .params
            .iter()
            .map(value_to_param)
            .collect::<ReldocResult<_>>()?;
        let param_refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(PgParam::as_tosql).collect();

        self.with_client(|client| {
            let rows = client
                .query(&statement.sql, &param_refs)
                .map_err(|e| driver_error("statement execution failed", e))?;
            rows.iter().map(decode_row).collect()
        })
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_fail_before_open() {
        let backend = PostgresBackend::new(PostgresConfig::new());
        let err = backend.table_exists("books").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::BackendError);

        let statement = Statement::new("SELECT 1".to_string(), Vec::new());
        assert!(backend.execute(&statement).is_err());
    }

    #[test]
    fn test_close_without_open_is_harmless() {
        let backend = PostgresBackend::new(PostgresConfig::new());
        backend.close().unwrap();
    }
}

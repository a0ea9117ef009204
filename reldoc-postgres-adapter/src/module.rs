use reldoc::backend::{BackendModule, SqlBackend};
use reldoc::ReldocResult;

use crate::backend::PostgresBackend;
use crate::config::PostgresConfig;

/// Backend module supplying a [PostgresBackend] to the connector
/// builder.
///
/// # Usage
/// ```ignore
/// use reldoc::Connector;
/// use reldoc_postgres_adapter::PostgresBackendModule;
///
/// let connector = Connector::builder()
///     .host("db.internal")
///     .database("catalog")
///     .load_backend(PostgresBackendModule::new())
///     .open()?;
/// ```
#[derive(Default)]
pub struct PostgresBackendModule {
    config: PostgresConfig,
}

impl PostgresBackendModule {
    pub fn new() -> PostgresBackendModule {
        PostgresBackendModule::default()
    }

    pub fn with_config(config: PostgresConfig) -> PostgresBackendModule {
        PostgresBackendModule { config }
    }
}

impl BackendModule for PostgresBackendModule {
    fn backend(&self) -> ReldocResult<SqlBackend> {
        Ok(SqlBackend::new(PostgresBackend::new(self.config.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_supplies_backend() {
        let backend = PostgresBackendModule::new().backend().unwrap();
        assert_eq!(backend.backend_name(), "postgres");
    }
}

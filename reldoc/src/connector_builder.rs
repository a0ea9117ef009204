use crate::backend::memory::InMemoryBackendModule;
use crate::backend::{BackendModule, SqlBackend};
use crate::connection::ConnectionConfig;
use crate::connector::Connector;
use crate::errors::{ReldocError, ReldocResult};

/// Builder for configuring and opening a [Connector].
///
/// Carries the five-field connection configuration plus the backend
/// module. The default configuration targets a local Postgres server;
/// without a loaded backend module, the in-memory backend is used.
///
/// # Examples
///
/// ```rust,ignore
/// use reldoc::backend::memory::InMemoryBackendModule;
/// use reldoc::Connector;
///
/// let connector = Connector::builder()
///     .host("db.internal")
///     .port(5433)
///     .database("catalog")
///     .user("svc")
///     .password("secret")
///     .load_backend(InMemoryBackendModule::new())
///     .open()?;
/// ```
#[derive(Default)]
pub struct ConnectorBuilder {
    error: Option<ReldocError>,
    config: ConnectionConfig,
    backend: Option<SqlBackend>,
}

impl ConnectorBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        ConnectorBuilder {
            error: None,
            config: ConnectionConfig::default(),
            backend: None,
        }
    }

    pub fn host(mut self, host: &str) -> Self {
        self.config.host = host.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn database(mut self, database: &str) -> Self {
        self.config.database = database.to_string();
        self
    }

    pub fn user(mut self, user: &str) -> Self {
        self.config.user = user.to_string();
        self
    }

    pub fn password(mut self, password: &str) -> Self {
        self.config.password = password.to_string();
        self
    }

    /// Loads the backend module supplying the physical store.
    pub fn load_backend<T: BackendModule>(mut self, module: T) -> Self {
        if self.error.is_none() {
            match module.backend() {
                Ok(backend) => self.backend = Some(backend),
                Err(e) => self.error = Some(e),
            }
        }
        self
    }

    /// Opens the connector and connects it with the configured
    /// connection parameters.
    pub fn open(self) -> ReldocResult<Connector> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let backend = match self.backend {
            Some(backend) => backend,
            None => {
                log::debug!("No backend module loaded, using the in-memory backend");
                InMemoryBackendModule::new().backend()?
            }
        };
        let connector = Connector::new(backend);
        connector.connect(&self.config)?;
        Ok(connector)
    }
}

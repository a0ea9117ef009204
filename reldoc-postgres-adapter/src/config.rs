use std::env;

use reldoc::ConnectionConfig;

const ENV_HOST: &str = "RELDOC_PG_HOST";
const ENV_PORT: &str = "RELDOC_PG_PORT";
const ENV_DATABASE: &str = "RELDOC_PG_DATABASE";
const ENV_USER: &str = "RELDOC_PG_USER";
const ENV_PASSWORD: &str = "RELDOC_PG_PASSWORD";

/// Adapter-level settings layered on top of the core connection
/// configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostgresConfig {
    /// Reported to the server as `application_name`.
    pub application_name: Option<String>,
    /// Connect timeout in seconds; unset means the driver default.
    pub connect_timeout_secs: Option<u64>,
}

impl PostgresConfig {
    pub fn new() -> PostgresConfig {
        PostgresConfig::default()
    }

    pub fn application_name(mut self, name: &str) -> PostgresConfig {
        self.application_name = Some(name.to_string());
        self
    }

    pub fn connect_timeout_secs(mut self, seconds: u64) -> PostgresConfig {
        self.connect_timeout_secs = Some(seconds);
        self
    }

    /// Builds the libpq-style connection string for a configuration.
    pub(crate) fn dsn(&self, config: &ConnectionConfig) -> String {
        let mut dsn = format!(
            "host={} port={} dbname={} user={}",
            config.host, config.port, config.database, config.user
        );
        if !config.password.is_empty() {
            dsn.push_str(&format!(" password={}", config.password));
        }
        if let Some(name) = &self.application_name {
            dsn.push_str(&format!(" application_name={}", name));
        }
        if let Some(seconds) = self.connect_timeout_secs {
            dsn.push_str(&format!(" connect_timeout={}", seconds));
        }
        dsn
    }
}

/// Reads connection parameters from `RELDOC_PG_*` environment
/// variables, falling back to the defaults for anything unset.
pub fn config_from_env() -> ConnectionConfig {
    let mut config = ConnectionConfig::default();
    if let Ok(host) = env::var(ENV_HOST) {
        config.host = host;
    }
    if let Ok(port) = env::var(ENV_PORT) {
        match port.parse() {
            Ok(port) => config.port = port,
            Err(_) => log::warn!("Ignoring non-numeric {}: {}", ENV_PORT, port),
        }
    }
    if let Ok(database) = env::var(ENV_DATABASE) {
        config.database = database;
    }
    if let Ok(user) = env::var(ENV_USER) {
        config.user = user;
    }
    if let Ok(password) = env::var(ENV_PASSWORD) {
        config.password = password;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dsn_without_password() {
        let config = ConnectionConfig::default();
        let dsn = PostgresConfig::new().dsn(&config);
        assert_eq!(dsn, "host=localhost port=5432 dbname=postgres user=postgres");
    }

    #[test]
    fn test_dsn_with_all_settings() {
        let config = ConnectionConfig::new()
            .host("db.internal")
            .port(5433)
            .database("catalog")
            .user("svc")
            .password("secret");
        let dsn = PostgresConfig::new()
            .application_name("reldoc")
            .connect_timeout_secs(5)
            .dsn(&config);
        assert_eq!(
            dsn,
            "host=db.internal port=5433 dbname=catalog user=svc password=secret \
             application_name=reldoc connect_timeout=5"
        );
    }
}

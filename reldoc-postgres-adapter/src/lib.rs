//! PostgreSQL backend adapter for reldoc.
//!
//! Implements the core crate's `SqlBackendProvider` contract over the
//! blocking `postgres` driver, with `chrono` timestamp and
//! `serde_json` JSON integrations. Catalog checks for schema
//! reconciliation go through `information_schema`.

mod backend;
mod config;
mod convert;
mod module;

pub use backend::PostgresBackend;
pub use config::{config_from_env, PostgresConfig};
pub use module::PostgresBackendModule;

#[cfg(test)]
mod tests {
    // It will take effect during test, project wide
    #[ctor::ctor]
    fn init() {
        colog::init();
    }
}

use crate::backend::memory::InMemoryBackend;
use crate::backend::{BackendModule, SqlBackend};
use crate::errors::ReldocResult;

/// Backend module supplying an [InMemoryBackend] to the connector
/// builder.
///
/// # Usage
/// ```ignore
/// let connector = Connector::builder()
///     .load_backend(InMemoryBackendModule::new())
///     .open()?;
/// ```
#[derive(Default)]
pub struct InMemoryBackendModule;

impl InMemoryBackendModule {
    pub fn new() -> InMemoryBackendModule {
        InMemoryBackendModule
    }
}

impl BackendModule for InMemoryBackendModule {
    fn backend(&self) -> ReldocResult<SqlBackend> {
        Ok(SqlBackend::new(InMemoryBackend::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_supplies_backend() {
        let backend = InMemoryBackendModule::new().backend().unwrap();
        assert_eq!(backend.backend_name(), "in-memory");
    }
}

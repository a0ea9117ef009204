//! In-memory reference backend.

mod backend;
mod interpret;
mod module;
mod table;

pub use backend::InMemoryBackend;
pub use module::InMemoryBackendModule;

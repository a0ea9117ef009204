//! # Reldoc - Document CRUD over a relational backend
//!
//! Reldoc gives callers document-style CRUD semantics on top of a
//! relational database: Mongo-like filter queries, sort, projection,
//! and pagination options, and schema-described documents are compiled
//! into parameterized SQL, while the backing table's columns are kept
//! synchronized (additively) with the declared field schema.
//!
//! ## Key Properties
//!
//! - **Parameterized always**: caller values are bound through
//!   positional parameters, never interpolated into statement text
//! - **Deterministic**: filter order drives parameter order and the
//!   default sort order
//! - **Additive schemas**: reconciliation only ever adds columns,
//!   idempotently and race-free
//! - **Explicit failure**: unsupported operators reject the call, and
//!   multi-document inserts report each document's outcome separately
//! - **Pluggable backends**: an in-memory reference backend ships in
//!   this crate; the Postgres adapter lives in
//!   `reldoc-postgres-adapter`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reldoc::backend::memory::InMemoryBackendModule;
//! use reldoc::{field, Connector, Document, FieldSchema, FieldSpec, FieldType, FindOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let connector = Connector::builder()
//!     .load_backend(InMemoryBackendModule::new())
//!     .open()?;
//!
//! let schema = FieldSchema::new()
//!     .field("title", FieldSpec::new(FieldType::String).required());
//!
//! let mut doc = Document::new();
//! doc.put("title", "War and Peace")?;
//! let inserted = connector.insert_one(doc, "books", &schema)?;
//!
//! let found = connector.find(
//!     &field("title").eq("War and Peace"),
//!     "books",
//!     &FindOptions::new(),
//!     &schema,
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`backend`] - Backend abstraction and the in-memory backend
//! - [`common`] - Common types, traits, and utilities
//! - [`compiler`] - Filter/options/update to SQL compilation
//! - [`connection`] - Connection state, configuration, and events
//! - [`connector`] - The CRUD entry point
//! - [`document`] - Insertion-ordered documents
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - Query filters and the fluent filter API
//! - [`options`] - Find options: sort, projection, pagination
//! - [`schema`] - Field schemas and physical type mapping
//! - [`sync`] - Additive schema reconciliation
//! - [`update`] - Update specifications

pub mod backend;
pub mod common;
pub mod compiler;
pub mod connection;
pub mod connector;
pub mod connector_builder;
pub mod document;
pub mod errors;
pub mod filter;
pub mod options;
pub mod schema;
pub mod sync;
pub mod update;

pub use common::{PageMetadata, SortOrder, SubscriberRef, Value, RELDOC_VERSION};
pub use connection::{
    ConnectionConfig, ConnectionEventListener, ConnectionEvents, ConnectionState,
};
pub use connector::{Connector, DeleteResult, FindResult, InsertResult, UpdateResult};
pub use connector_builder::ConnectorBuilder;
pub use document::Document;
pub use errors::{ErrorKind, ReldocError, ReldocResult};
pub use filter::{all, field, Filter};
pub use options::{limit_to, order_by, project, skip_by, FindOptions};
pub use schema::{FieldSchema, FieldSpec, FieldType};
pub use update::UpdateSpec;

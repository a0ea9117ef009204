use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::backend::{Row, SqlBackend};
use crate::common::{
    atomic, Atomic, PageMetadata, ReadExecutor, ReldocEventBus, SubscriberRef, WriteExecutor,
    DOC_CREATED_AT, DOC_HISTORY, DOC_ID,
};
use crate::common::{is_reference_field, Value};
use crate::compiler::{
    compile_count, compile_delete, compile_insert, compile_select, compile_update,
};
use crate::connection::{
    ConnectionConfig, ConnectionEventListener, ConnectionEvents, ConnectionState,
};
use crate::connector_builder::ConnectorBuilder;
use crate::document::Document;
use crate::errors::{ErrorKind, ReldocError, ReldocResult};
use crate::filter::Filter;
use crate::options::FindOptions;
use crate::schema::{FieldSchema, FieldType};
use crate::sync::SchemaSynchronizer;
use crate::update::UpdateSpec;

/// Per-document outcomes of a multi-document insert.
///
/// `outcomes[i]` is the result for the i-th input document, indexed by
/// its originating position regardless of execution order. Partial
/// failure is explicit: a failed document never hides an earlier
/// success.
#[derive(Debug)]
pub struct InsertResult {
    pub outcomes: Vec<ReldocResult<Document>>,
}

impl InsertResult {
    /// The successfully inserted documents, in input order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.outcomes.iter().filter_map(|outcome| outcome.as_ref().ok())
    }

    /// Input positions and errors of the failed documents.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &ReldocError)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(index, outcome)| outcome.as_ref().err().map(|e| (index, e)))
    }

    pub fn is_fully_successful(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.is_ok())
    }
}

/// Result of a find: the matching documents plus pagination metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct FindResult {
    pub documents: Vec<Document>,
    pub metadata: PageMetadata,
}

/// Result of an update: the rows after modification. Empty when the
/// filter matched nothing, which is not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateResult {
    pub documents: Vec<Document>,
}

/// Result of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteResult {
    pub deleted_count: u64,
}

/// Document CRUD over a relational backend.
///
/// `Connector` is the entry point: it owns the one physical backend
/// connection, its tri-state lifecycle, the schema synchronizer, and
/// the connection event bus. It uses the PIMPL pattern internally;
/// clones share the same connection and state.
///
/// # Examples
///
/// ```rust,ignore
/// use reldoc::backend::memory::InMemoryBackendModule;
/// use reldoc::{field, Connector, ConnectionConfig};
///
/// let connector = Connector::builder()
///     .load_backend(InMemoryBackendModule::new())
///     .open()?;
/// connector.connect(&ConnectionConfig::default())?;
///
/// let result = connector.insert_one(document, "books", &schema)?;
/// let found = connector.find(&field("title").eq("War and Peace"),
///                            "books", &FindOptions::new(), &schema)?;
/// ```
#[derive(Clone)]
pub struct Connector {
    inner: Arc<ConnectorInner>,
}

impl Connector {
    /// Creates a builder for configuring and opening a connector.
    pub fn builder() -> ConnectorBuilder {
        ConnectorBuilder::new()
    }

    pub(crate) fn new(backend: SqlBackend) -> Connector {
        Connector {
            inner: Arc::new(ConnectorInner::new(backend)),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    /// Opens the physical connection and moves the lifecycle forward
    /// through `Connecting` to `Connected`, publishing both events.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if the connector is already connected or a
    /// connect attempt is in flight.
    pub fn connect(&self, config: &ConnectionConfig) -> ReldocResult<()> {
        self.inner.connect(config)
    }

    /// Registers a listener for connection lifecycle events.
    pub fn subscribe(
        &self,
        listener: ConnectionEventListener,
    ) -> ReldocResult<Option<SubscriberRef>> {
        self.inner.event_bus.register(listener)
    }

    /// Removes a previously registered listener.
    pub fn unsubscribe(&self, subscriber: SubscriberRef) -> ReldocResult<()> {
        self.inner.event_bus.deregister(subscriber)
    }

    /// Releases the backend connection and the event bus. The lifecycle
    /// state is not rolled back; a closed connector is done.
    pub fn close(&self) -> ReldocResult<()> {
        self.inner.event_bus.close()?;
        self.inner.backend.close()
    }

    /// Inserts a single document. Convenience over [Connector::insert]
    /// for the one-document case.
    pub fn insert_one(
        &self,
        document: Document,
        collection: &str,
        schema: &FieldSchema,
    ) -> ReldocResult<Document> {
        let mut result = self.insert(vec![document], collection, schema)?;
        result.outcomes.remove(0)
    }

    /// Inserts documents, reconciling the collection's table against
    /// the schema first.
    ///
    /// Documents are processed independently and sequentially, not in a
    /// transaction; each outcome lands in the slot of its originating
    /// document.
    pub fn insert(
        &self,
        documents: Vec<Document>,
        collection: &str,
        schema: &FieldSchema,
    ) -> ReldocResult<InsertResult> {
        self.inner.ensure_connected()?;
        self.inner.synchronizer.reconcile(collection, schema)?;

        let mut outcomes = Vec::with_capacity(documents.len());
        for document in documents {
            let outcome = self.inner.insert_document(document, collection, schema);
            if let Err(e) = &outcome {
                log::error!("Insert into {} failed: {}", collection, e);
            }
            outcomes.push(outcome);
        }
        Ok(InsertResult { outcomes })
    }

    /// Finds documents matching the filter, with sort, projection, and
    /// pagination applied per the options. The metadata total reflects
    /// the filter, not the page.
    pub fn find(
        &self,
        filter: &Filter,
        collection: &str,
        options: &FindOptions,
        _schema: &FieldSchema,
    ) -> ReldocResult<FindResult> {
        self.inner.ensure_connected()?;

        let select = compile_select(filter, collection, options)?;
        let documents = self
            .inner
            .backend
            .execute(&select)?
            .into_iter()
            .map(Row::into_document)
            .collect();

        let count = compile_count(filter, collection)?;
        let total_count = self.inner.scalar_count(&count)?;

        Ok(FindResult {
            documents,
            metadata: PageMetadata::compute(options, total_count),
        })
    }

    /// Applies an update specification to all matching documents and
    /// returns the rows after modification.
    pub fn update(
        &self,
        filter: &Filter,
        collection: &str,
        update: &UpdateSpec,
        _schema: &FieldSchema,
    ) -> ReldocResult<UpdateResult> {
        self.inner.ensure_connected()?;

        let statement = compile_update(filter, collection, update)?;
        let documents = self
            .inner
            .backend
            .execute(&statement)?
            .into_iter()
            .map(Row::into_document)
            .collect();
        Ok(UpdateResult { documents })
    }

    /// Deletes all documents matching the filter.
    pub fn delete(
        &self,
        filter: &Filter,
        collection: &str,
        _schema: &FieldSchema,
    ) -> ReldocResult<DeleteResult> {
        self.inner.ensure_connected()?;

        let statement = compile_delete(filter, collection)?;
        let rows = self.inner.backend.execute(&statement)?;
        Ok(DeleteResult {
            deleted_count: rows.len() as u64,
        })
    }
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("state", &self.state())
            .field("backend", &self.inner.backend.backend_name())
            .finish()
    }
}

struct ConnectorInner {
    state: Atomic<ConnectionState>,
    backend: SqlBackend,
    synchronizer: SchemaSynchronizer,
    event_bus: ReldocEventBus<ConnectionEvents, ConnectionEventListener>,
}

impl ConnectorInner {
    fn new(backend: SqlBackend) -> ConnectorInner {
        ConnectorInner {
            state: atomic(ConnectionState::Disconnected),
            synchronizer: SchemaSynchronizer::new(backend.clone()),
            backend,
            event_bus: ReldocEventBus::new(),
        }
    }

    fn state(&self) -> ConnectionState {
        self.state.read_with(|state| *state)
    }

    fn ensure_connected(&self) -> ReldocResult<()> {
        if self.state() != ConnectionState::Connected {
            log::error!("Operation attempted while not connected");
            return Err(ReldocError::new(
                "connector is not connected",
                ErrorKind::NotConnected,
            ));
        }
        Ok(())
    }

    fn connect(&self, config: &ConnectionConfig) -> ReldocResult<()> {
        self.state.write_with(|state| match *state {
            ConnectionState::Disconnected => {
                *state = ConnectionState::Connecting;
                Ok(())
            }
            _ => Err(ReldocError::new(
                "connector is already connected",
                ErrorKind::InvalidOperation,
            )),
        })?;
        self.event_bus.publish(ConnectionEvents::Connecting)?;

        if let Err(e) = self.backend.open(config) {
            self.state
                .write_with(|state| *state = ConnectionState::Disconnected);
            return Err(ReldocError::new_with_cause(
                "failed to open backend connection",
                ErrorKind::BackendError,
                e,
            ));
        }

        self.state
            .write_with(|state| *state = ConnectionState::Connected);
        log::info!("Connected to {} backend", self.backend.backend_name());
        self.event_bus.publish(ConnectionEvents::Connected)
    }

    /// Builds the ordered column list for one document and executes its
    /// INSERT. Reference-prefixed keys are dropped, internal fields are
    /// coerced, schema-declared date-times are stringified, and the
    /// synthetic `_id` column comes last.
    fn insert_document(
        &self,
        document: Document,
        collection: &str,
        schema: &FieldSchema,
    ) -> ReldocResult<Document> {
        let mut columns: Vec<(String, Value)> = Vec::with_capacity(document.len() + 2);
        let mut has_created_at = false;
        let mut has_history = false;
        let mut id = None;

        for (field, value) in document.iter() {
            if is_reference_field(field) {
                log::debug!("Dropping reference key from insert: {}", field);
                continue;
            }
            match field.as_str() {
                DOC_ID => {
                    id = match value {
                        Value::String(supplied) => Some(supplied.clone()),
                        other => {
                            return Err(ReldocError::new(
                                format!(
                                    "document id must be a string, found {}",
                                    other.type_name()
                                ),
                                ErrorKind::InvalidDataType,
                            ));
                        }
                    };
                    continue;
                }
                DOC_CREATED_AT => {
                    has_created_at = true;
                    columns.push((
                        field.clone(),
                        Value::DateTime(coerce_created_at(value)?),
                    ));
                    continue;
                }
                DOC_HISTORY => {
                    has_history = true;
                    columns.push((field.clone(), Value::Array(Vec::new())));
                    continue;
                }
                _ => {}
            }

            let value = match (schema.get(field), value) {
                (Some(spec), Value::DateTime(dt)) if spec.field_type == FieldType::DateTime => {
                    Value::String(dt.to_rfc3339())
                }
                (_, value) => value.clone(),
            };
            columns.push((field.clone(), value));
        }

        if !has_created_at {
            columns.push((DOC_CREATED_AT.to_string(), Value::DateTime(Utc::now())));
        }
        if !has_history {
            columns.push((DOC_HISTORY.to_string(), Value::Array(Vec::new())));
        }
        columns.push((
            DOC_ID.to_string(),
            Value::String(id.unwrap_or_else(|| Uuid::new_v4().to_string())),
        ));

        let statement = compile_insert(collection, &columns)?;
        let mut rows = self.backend.execute(&statement)?;
        if rows.is_empty() {
            return Err(ReldocError::new(
                "insert returned no row",
                ErrorKind::BackendError,
            ));
        }
        Ok(rows.remove(0).into_document())
    }

    /// Reads the single numeric cell a COUNT statement returns.
    fn scalar_count(&self, statement: &crate::compiler::Statement) -> ReldocResult<u64> {
        let rows = self.backend.execute(statement)?;
        let value = rows
            .first()
            .and_then(|row| row.columns().next().map(|(_, value)| value.clone()))
            .unwrap_or(Value::Null);
        value
            .as_i64()
            .map(|count| count.max(0) as u64)
            .ok_or_else(|| {
                ReldocError::new(
                    format!("count query returned a non-numeric value: {}", value),
                    ErrorKind::BackendError,
                )
            })
    }
}

/// Interprets a caller-supplied `_createdAt` value: date-times pass
/// through, integers are epoch seconds, strings must parse as RFC 3339.
fn coerce_created_at(value: &Value) -> ReldocResult<DateTime<Utc>> {
    match value {
        Value::DateTime(dt) => Ok(*dt),
        Value::I64(seconds) => Utc.timestamp_opt(*seconds, 0).single().ok_or_else(|| {
            ReldocError::new(
                format!("epoch value out of range: {}", seconds),
                ErrorKind::InvalidDataType,
            )
        }),
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                ReldocError::new(
                    format!("invalid _createdAt value {}: {}", text, e),
                    ErrorKind::InvalidDataType,
                )
            }),
        other => Err(ReldocError::new(
            format!("cannot use {} as _createdAt", other.type_name()),
            ErrorKind::InvalidDataType,
        )),
    }
}

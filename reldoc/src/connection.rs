use anyhow::Error;
use basu::error::BasuError;
use basu::event::Event;
use basu::Handle;
use std::fmt::Debug;
use std::sync::Arc;

use crate::errors::ReldocResult;

/// Lifecycle state of a connector.
///
/// The lifecycle only moves forward: `Disconnected` to `Connecting` to
/// `Connected`. No `Connected` to `Disconnected` transition is modeled;
/// there is no graceful shutdown or reconnect at this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Connection lifecycle notifications published on the event bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvents {
    Connecting,
    Connected,
}

/// Configuration for opening the one physical backend connection.
///
/// `Default` gives localhost Postgres defaults; field setters allow
/// builder-style construction.
///
/// # Examples
///
/// ```ignore
/// let config = ConnectionConfig::new()
///     .host("db.internal")
///     .port(5433)
///     .database("catalog")
///     .user("svc")
///     .password("secret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            host: "localhost".to_string(),
            port: 5432,
            database: "postgres".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
        }
    }
}

impl ConnectionConfig {
    pub fn new() -> Self {
        ConnectionConfig::default()
    }

    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn database(mut self, database: &str) -> Self {
        self.database = database.to_string();
        self
    }

    pub fn user(mut self, user: &str) -> Self {
        self.user = user.to_string();
        self
    }

    pub fn password(mut self, password: &str) -> Self {
        self.password = password.to_string();
        self
    }
}

/// Trait for closure-based connection event handlers.
///
/// Any closure with the signature
/// `Fn(ConnectionEvents) -> ReldocResult<()>` implements this trait.
pub trait ConnectionEventCallback:
    Send + Sync + Fn(ConnectionEvents) -> ReldocResult<()>
{
}

impl<F> ConnectionEventCallback for F where
    F: Send + Sync + Fn(ConnectionEvents) -> ReldocResult<()>
{
}

/// Listener for connection lifecycle events.
///
/// Wraps an event handler callback; register it with
/// `Connector::subscribe` to receive lifecycle notifications.
#[derive(Clone)]
pub struct ConnectionEventListener {
    on_event: Arc<dyn ConnectionEventCallback>,
}

impl ConnectionEventListener {
    pub fn new(on_event: impl ConnectionEventCallback + 'static) -> Self {
        ConnectionEventListener {
            on_event: Arc::new(on_event),
        }
    }
}

impl Handle<ConnectionEvents> for ConnectionEventListener {
    fn handle(&self, event: &Event<ConnectionEvents>) -> Result<(), BasuError> {
        match (self.on_event)(event.data.clone()) {
            Ok(_) => Ok(()),
            Err(e) => Err(BasuError::HandlerError(Error::from(e))),
        }
    }
}

impl Debug for ConnectionEventListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionEventListener").finish()
    }
}

//! Database gateway: connection lifecycle and schema bootstrap.
//!
//! A [`Gateway`] hands out one [`DbConn`] per request. The guard releases its
//! connection when dropped, so every exit path of a handler closes it.
//! Storage engines implement [`DocumentConnection`]; they store JSON documents
//! and know nothing about tasks.

pub mod memory;
pub mod redis;

use async_trait::async_trait;

pub use self::memory::MemoryGateway;
pub use self::redis::RedisGateway;

/// A stored JSON document.
pub type Document = serde_json::Map<String, serde_json::Value>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database unreachable: {0}")]
    Connect(#[source] BoxError),

    #[error("database command failed: {0}")]
    Command(#[source] BoxError),

    #[error("could not encode document: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("connection already released")]
    Released,
}

impl DbError {
    pub(crate) fn connect(err: impl Into<BoxError>) -> Self {
        Self::Connect(err.into())
    }

    pub(crate) fn command(err: impl Into<BoxError>) -> Self {
        Self::Command(err.into())
    }
}

/// What [`Gateway::bootstrap`] found and created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapOutcome {
    pub database_created: bool,
    pub collection_created: bool,
}

impl BootstrapOutcome {
    /// Both the database and the collection were already there.
    pub fn already_existed(&self) -> bool {
        !self.database_created && !self.collection_created
    }
}

/// Owns the database client and opens connections on demand.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Create the target database and `collection` if they are absent.
    ///
    /// Existing objects are not an error. The bootstrap connection is not
    /// scoped to any collection and is closed before returning.
    async fn bootstrap(&self, collection: &str) -> Result<BootstrapOutcome, DbError>;

    /// Open a connection scoped to the target database.
    async fn acquire(&self) -> Result<DbConn, DbError>;
}

/// A connection scoped to one database.
#[async_trait]
pub trait DocumentConnection: Send {
    /// All documents of `collection`, in store order.
    async fn fetch_all(&mut self, collection: &str) -> Result<Vec<Document>, DbError>;

    /// Store `doc` under a freshly generated id and return that id.
    async fn insert(&mut self, collection: &str, doc: Document) -> Result<String, DbError>;

    /// Remove the document with `id`, returning how many were removed (0 or 1).
    async fn delete_by_id(&mut self, collection: &str, id: &str) -> Result<u64, DbError>;
}

/// Request-scoped connection guard.
pub struct DbConn {
    conn: Option<Box<dyn DocumentConnection>>,
}

impl DbConn {
    pub fn new(conn: Box<dyn DocumentConnection>) -> Self {
        Self { conn: Some(conn) }
    }

    /// A guard that never held a connection. Releasing it does nothing.
    pub fn empty() -> Self {
        Self { conn: None }
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    pub fn connection(&mut self) -> Result<&mut (dyn DocumentConnection + 'static), DbError> {
        self.conn.as_deref_mut().ok_or(DbError::Released)
    }

    /// Close the connection. No-op when nothing is held.
    pub fn release(&mut self) {
        if let Some(conn) = self.conn.take() {
            drop(conn);
            tracing::debug!("database connection released");
        }
    }
}

impl Drop for DbConn {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for DbConn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConn").field("open", &self.is_open()).finish()
    }
}

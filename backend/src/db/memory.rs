//! In-process document store.
//!
//! [`MemoryGateway`] mirrors the Redis gateway's semantics without a server:
//! databases and collections must be bootstrapped before use, documents keep
//! insertion order, and ids are UUIDv4 strings. Clones share the same store,
//! which lets tests keep a handle to inspect it or take it offline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use uuid::Uuid;

use super::{BootstrapOutcome, DbConn, DbError, Document, DocumentConnection, Gateway};

/// database name -> collection name -> documents
type Databases = HashMap<String, HashMap<String, Vec<Document>>>;

#[derive(Default)]
struct Shared {
    databases: Mutex<Databases>,
    offline: AtomicBool,
    open: AtomicUsize,
}

#[derive(Clone)]
pub struct MemoryGateway {
    database: String,
    shared: Arc<Shared>,
}

impl MemoryGateway {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            shared: Arc::default(),
        }
    }

    /// Simulate the database becoming unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.shared.offline.store(offline, Ordering::SeqCst);
    }

    /// Connections acquired and not yet released.
    pub fn open_connections(&self) -> usize {
        self.shared.open.load(Ordering::SeqCst)
    }

    /// Number of collections registered in this gateway's database.
    pub fn collection_count(&self) -> usize {
        self.shared
            .databases
            .lock()
            .get(&self.database)
            .map_or(0, HashMap::len)
    }

    fn check_online(&self) -> Result<(), DbError> {
        if self.shared.offline.load(Ordering::SeqCst) {
            return Err(DbError::connect("in-memory database is offline"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for MemoryGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryGateway")
            .field("database", &self.database)
            .field("open_connections", &self.open_connections())
            .finish()
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn bootstrap(&self, collection: &str) -> Result<BootstrapOutcome, DbError> {
        self.check_online()?;
        let mut databases = self.shared.databases.lock();

        let database_created = !databases.contains_key(&self.database);
        let collections = databases.entry(self.database.clone()).or_default();

        let collection_created = !collections.contains_key(collection);
        collections.entry(collection.to_string()).or_default();

        Ok(BootstrapOutcome {
            database_created,
            collection_created,
        })
    }

    async fn acquire(&self) -> Result<DbConn, DbError> {
        self.check_online()?;
        self.shared.open.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(database = %self.database, "memory connection opened");
        Ok(DbConn::new(Box::new(MemoryConnection {
            gateway: self.clone(),
        })))
    }
}

struct MemoryConnection {
    gateway: MemoryGateway,
}

impl MemoryConnection {
    fn with_collection<T>(
        &self,
        collection: &str,
        f: impl FnOnce(&mut Vec<Document>) -> T,
    ) -> Result<T, DbError> {
        self.gateway.check_online()?;
        let mut databases = self.gateway.shared.databases.lock();
        let docs = databases
            .get_mut(&self.gateway.database)
            .ok_or_else(|| {
                DbError::command(format!("database '{}' does not exist", self.gateway.database))
            })?
            .get_mut(collection)
            .ok_or_else(|| DbError::command(format!("collection '{collection}' does not exist")))?;
        Ok(f(docs))
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.gateway.shared.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentConnection for MemoryConnection {
    async fn fetch_all(&mut self, collection: &str) -> Result<Vec<Document>, DbError> {
        self.with_collection(collection, |docs| docs.clone())
    }

    async fn insert(&mut self, collection: &str, mut doc: Document) -> Result<String, DbError> {
        let id = Uuid::new_v4().to_string();
        doc.insert("id".to_string(), Value::String(id.clone()));
        self.with_collection(collection, |docs| docs.push(doc))?;
        Ok(id)
    }

    async fn delete_by_id(&mut self, collection: &str, id: &str) -> Result<u64, DbError> {
        self.with_collection(collection, |docs| {
            let before = docs.len();
            docs.retain(|doc| doc.get("id").and_then(Value::as_str) != Some(id));
            (before - docs.len()) as u64
        })
    }
}

//! Redis-backed document store.
//!
//! # Key Schema
//!
//! | Key | Type | Purpose |
//! |-----|------|---------|
//! | `listy:databases` | Set | Registered database names |
//! | `{db}:collections` | Set | Collections registered in `db` |
//! | `{db}:{collection}:ids` | List | Document ids in insertion order |
//! | `{db}:{collection}:doc:{id}` | String (JSON) | One document |
//!
//! Documents sit under their own `doc:` segment so no id can name the
//! `ids` list.
//!
//! Inserts and deletes touch the document and the id list in one
//! `MULTI`/`EXEC` pipeline.

use ::redis::aio::Connection;
use ::redis::{AsyncCommands, Client, RedisError};
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::{BootstrapOutcome, DbConn, DbError, Document, DocumentConnection, Gateway};

const DATABASES_KEY: &str = "listy:databases";

pub struct RedisGateway {
    client: Client,
    database: String,
}

impl RedisGateway {
    /// Build a gateway for `url`. No connection is made until
    /// [`Gateway::bootstrap`] or [`Gateway::acquire`].
    ///
    /// The URL format is `redis://[<user>][:<password>@]<host>:<port>`.
    pub fn open(url: &str, database: impl Into<String>) -> Result<Self, DbError> {
        let client = Client::open(url).map_err(DbError::connect)?;
        Ok(Self {
            client,
            database: database.into(),
        })
    }

    async fn connect(&self) -> Result<Connection, DbError> {
        self.client
            .get_async_connection()
            .await
            .map_err(DbError::connect)
    }
}

impl std::fmt::Debug for RedisGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisGateway")
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Gateway for RedisGateway {
    async fn bootstrap(&self, collection: &str) -> Result<BootstrapOutcome, DbError> {
        let mut conn = self.connect().await?;

        let added_db: u64 = conn
            .sadd(DATABASES_KEY, &self.database)
            .await
            .map_err(DbError::command)?;
        let added_collection: u64 = conn
            .sadd(collections_key(&self.database), collection)
            .await
            .map_err(DbError::command)?;

        Ok(BootstrapOutcome {
            database_created: added_db > 0,
            collection_created: added_collection > 0,
        })
    }

    async fn acquire(&self) -> Result<DbConn, DbError> {
        let conn = self.connect().await?;
        tracing::debug!(database = %self.database, "redis connection opened");
        Ok(DbConn::new(Box::new(RedisConnection {
            conn,
            database: self.database.clone(),
        })))
    }
}

struct RedisConnection {
    conn: Connection,
    database: String,
}

fn collections_key(database: &str) -> String {
    format!("{database}:collections")
}

fn ids_key(database: &str, collection: &str) -> String {
    format!("{database}:{collection}:ids")
}

fn doc_key(database: &str, collection: &str, id: &str) -> String {
    format!("{database}:{collection}:doc:{id}")
}

fn map_command_error(err: RedisError) -> DbError {
    DbError::command(err)
}

#[async_trait]
impl DocumentConnection for RedisConnection {
    async fn fetch_all(&mut self, collection: &str) -> Result<Vec<Document>, DbError> {
        let ids: Vec<String> = self
            .conn
            .lrange(ids_key(&self.database, collection), 0, -1)
            .await
            .map_err(map_command_error)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids
            .iter()
            .map(|id| doc_key(&self.database, collection, id))
            .collect();
        let raw: Vec<Option<String>> = ::redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut self.conn)
            .await
            .map_err(map_command_error)?;

        let docs = raw
            .into_iter()
            .zip(&keys)
            .filter_map(|(json, key)| match serde_json::from_str(json.as_deref()?) {
                Ok(Value::Object(doc)) => Some(doc),
                Ok(_) => {
                    tracing::warn!(%key, "skipping non-object document");
                    None
                }
                Err(e) => {
                    tracing::warn!(%key, error = %e, "skipping undecodable document");
                    None
                }
            })
            .collect();
        Ok(docs)
    }

    async fn insert(&mut self, collection: &str, mut doc: Document) -> Result<String, DbError> {
        let id = Uuid::new_v4().to_string();
        doc.insert("id".to_string(), Value::String(id.clone()));
        let json = serde_json::to_string(&doc)?;

        let _: () = ::redis::pipe()
            .atomic()
            .set(doc_key(&self.database, collection, &id), json)
            .ignore()
            .rpush(ids_key(&self.database, collection), &id)
            .ignore()
            .query_async(&mut self.conn)
            .await
            .map_err(map_command_error)?;
        Ok(id)
    }

    async fn delete_by_id(&mut self, collection: &str, id: &str) -> Result<u64, DbError> {
        let removed: Vec<u64> = ::redis::pipe()
            .atomic()
            .del(doc_key(&self.database, collection, id))
            .lrem(ids_key(&self.database, collection), 0, id)
            .ignore()
            .query_async(&mut self.conn)
            .await
            .map_err(map_command_error)?;
        Ok(removed.first().copied().unwrap_or(0))
    }
}

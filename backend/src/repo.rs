//! Task repository
//!
//! Maps tasks to documents in the `todos` collection over a request's
//! connection. Handlers go through here and never touch the connection.

use listy_shared::{Task, TaskName};
use serde_json::Value;

use crate::db::{DbConn, DbError, Document};

/// Collection holding task documents.
pub const TASK_COLLECTION: &str = "todos";

/// Task repository
pub struct TaskRepo<'a> {
    conn: &'a mut DbConn,
}

impl<'a> TaskRepo<'a> {
    pub fn new(conn: &'a mut DbConn) -> Self {
        Self { conn }
    }

    /// All tasks in the order the store returns them.
    ///
    /// Documents that do not decode as a task are skipped.
    pub async fn list_all(&mut self) -> Result<Vec<Task>, DbError> {
        let docs = self
            .conn
            .connection()?
            .fetch_all(TASK_COLLECTION)
            .await?;

        Ok(docs
            .into_iter()
            .filter_map(|doc| match serde_json::from_value::<Task>(Value::Object(doc)) {
                Ok(task) => Some(task),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed task document");
                    None
                }
            })
            .collect())
    }

    pub async fn insert(&mut self, name: TaskName) -> Result<Task, DbError> {
        let name = name.into_string();
        let mut doc = Document::new();
        doc.insert("name".to_string(), Value::String(name.clone()));

        let id = self
            .conn
            .connection()?
            .insert(TASK_COLLECTION, doc)
            .await?;
        Ok(Task { id, name })
    }

    /// Delete the task with `id`. Deleting a missing id is not an error.
    pub async fn delete_by_id(&mut self, id: &str) -> Result<(), DbError> {
        let removed = self
            .conn
            .connection()?
            .delete_by_id(TASK_COLLECTION, id)
            .await?;
        tracing::debug!(%id, removed, "delete by id");
        Ok(())
    }
}

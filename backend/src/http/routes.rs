//! Task endpoints
//!
//! - `GET /` lists tasks and shows the form
//! - `POST /` creates a task, or re-renders the form on an empty label
//! - `GET /delete/:id` deletes a task and always redirects home

use axum::{
    extract::Path,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use listy_shared::NewTaskForm;
use listy_views::IndexPage;

use super::error::ApiError;
use super::server::AppState;
use crate::db::DbConn;
use crate::repo::TaskRepo;

/// GET / - list tasks with the create form
async fn list_tasks(mut conn: DbConn) -> Result<Html<String>, ApiError> {
    let tasks = TaskRepo::new(&mut conn).list_all().await?;
    Ok(Html(IndexPage::new(&tasks).render()))
}

/// POST / - create a task from the `label` field
async fn create_task(
    mut conn: DbConn,
    Form(form): Form<NewTaskForm>,
) -> Result<Response, ApiError> {
    let mut repo = TaskRepo::new(&mut conn);

    match form.validate() {
        Ok(name) => {
            let task = repo.insert(name).await?;
            tracing::info!(id = %task.id, "task created");
            Ok(Redirect::to("/").into_response())
        }
        Err(err) => {
            let tasks = repo.list_all().await?;
            let page = IndexPage::new(&tasks).with_error(&form.label, &err);
            Ok(Html(page.render()).into_response())
        }
    }
}

/// GET /delete/:id - delete a task, whether or not it exists
async fn delete_task(mut conn: DbConn, Path(id): Path<String>) -> Result<Redirect, ApiError> {
    TaskRepo::new(&mut conn).delete_by_id(&id).await?;
    Ok(Redirect::to("/"))
}

/// Task routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/delete/:id", get(delete_task))
}

//! Request-boundary errors rendered as small HTML pages.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use listy_views::error_page;

use crate::db::DbError;

pub const UNAVAILABLE_MESSAGE: &str = "Database connection could not be established.";

#[derive(Debug)]
pub enum ApiError {
    /// No connection could be opened at request start (503)
    Unavailable,

    /// A storage call failed mid-request (500, logged)
    Database(DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE_MESSAGE),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred. Please try again.",
                )
            }
        };

        let heading = status.canonical_reason().unwrap_or("Error");
        (status, Html(error_page(heading, message))).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        Self::Database(e)
    }
}

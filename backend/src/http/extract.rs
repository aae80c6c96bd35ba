//! Per-request connection extractor.
//!
//! Taking a [`DbConn`] in a handler acquires the connection before the
//! handler body runs; if that fails the request ends with a 503. The guard is
//! dropped when the handler returns, which releases the connection.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::error::ApiError;
use super::server::AppState;
use crate::db::DbConn;

#[async_trait]
impl FromRequestParts<AppState> for DbConn {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state.gateway().acquire().await.map_err(|e| {
            tracing::warn!(method = %parts.method, uri = %parts.uri, error = %e, "rejecting request");
            ApiError::Unavailable
        })
    }
}

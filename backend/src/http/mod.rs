//! HTTP layer: router, handlers, and error responses.

pub mod error;
mod extract;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, serve, AppState};

//! listy: a minimal to-do list web application.
//!
//! One page lists tasks, a form adds one, and a link deletes one. Tasks live
//! in a document store reached through a [`db::Gateway`], which opens one
//! connection per request.

pub mod config;
pub mod db;
pub mod http;
pub mod repo;

pub use config::Config;
pub use http::{build_router, serve, AppState};

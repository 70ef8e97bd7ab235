//! HTTP surface: routes, extractors, error mapping, and the serve loop
//!
//! Handlers only see [`AppState`]: the shared store and the token service.

pub mod error;
pub mod extractors;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, AppState, ServerConfig, ServerError};

//! postline-server: blog-style HTTP backend
//!
//! Posts CRUD, user registration, and password login issuing bearer tokens.
//! Storage sits behind the [`store::Store`] trait with raw-SQL, ORM, and
//! in-memory backends.

pub mod auth;
pub mod config;
pub mod http;
pub mod models;
pub mod store;

pub use config::Settings;
pub use http::{run_server, ServerConfig};
pub use store::{open_store, Backend, Store, StoreError};

//! Storage layer - one trait, three backends
//!
//! # Backends
//!
//! - [`SqlStore`]: hand-written SQL over a sqlx `PgPool`
//! - [`OrmStore`]: sea-orm entities over a `DatabaseConnection`
//! - [`MemoryStore`]: non-persistent fallback when the SQL backend can't connect
//!
//! Every backend has the same observable semantics. Mutations are atomic per
//! call: single statements, or a transaction where a read precedes the write.

pub mod memory;
pub mod migrations;
pub mod orm;
pub mod pool;
pub mod sql;

#[cfg(test)]
mod conformance;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::models::{NewPost, NewUser, Post, User};

pub use memory::MemoryStore;
pub use orm::OrmStore;
pub use pool::{connect_with_retry, create_pool};
pub use sql::SqlStore;

/// Storage error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {resource} with this {field} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
    },

    #[error("incompatible schema: {table}.{column} is {found}, expected {expected}")]
    IncompatibleSchema {
        table: String,
        column: &'static str,
        found: String,
        expected: &'static str,
    },

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("orm error: {0}")]
    Orm(#[from] sea_orm::DbErr),
}

impl StoreError {
    pub(crate) fn post_not_found(id: i32) -> Self {
        Self::NotFound {
            resource: "post",
            id: id.to_string(),
        }
    }

    pub(crate) fn user_not_found(id: impl fmt::Display) -> Self {
        Self::NotFound {
            resource: "user",
            id: id.to_string(),
        }
    }

    pub(crate) fn email_taken() -> Self {
        Self::Conflict {
            resource: "user",
            field: "email",
        }
    }
}

/// Which storage implementation is serving requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sql,
    Orm,
    Memory,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::Orm => "orm",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sql" => Ok(Self::Sql),
            "orm" => Ok(Self::Orm),
            "memory" => Ok(Self::Memory),
            other => Err(format!(
                "unknown backend '{}' (expected sql, orm, or memory)",
                other
            )),
        }
    }
}

/// Post and user persistence
#[async_trait]
pub trait Store: Send + Sync {
    /// Backend serving this store
    fn backend(&self) -> Backend;

    /// All posts, ascending by id
    async fn list_posts(&self) -> Result<Vec<Post>, StoreError>;

    /// Post with the highest id
    async fn latest_post(&self) -> Result<Post, StoreError>;

    async fn get_post(&self, id: i32) -> Result<Post, StoreError>;

    async fn create_post(&self, post: &NewPost) -> Result<Post, StoreError>;

    /// Full replace of title/content/published/rating; id and created_at are kept
    async fn update_post(&self, id: i32, post: &NewPost) -> Result<Post, StoreError>;

    async fn delete_post(&self, id: i32) -> Result<(), StoreError>;

    async fn get_user(&self, id: i32) -> Result<User, StoreError>;

    /// Fails with `Conflict` when the email is already registered
    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError>;

    /// Release connections. Called once at process stop.
    async fn close(&self);
}

/// Startup options for opening a store
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub backend: Backend,
    pub database_url: String,
    pub max_connections: u32,
    /// Connection attempts before the SQL backend falls back to memory
    pub connect_retries: u32,
    pub retry_delay: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            backend: Backend::Sql,
            database_url: crate::config::Settings::default().database_url(),
            max_connections: pool::DEFAULT_MAX_CONNECTIONS,
            connect_retries: pool::DEFAULT_CONNECT_RETRIES,
            retry_delay: pool::DEFAULT_RETRY_DELAY,
        }
    }
}

/// Open the configured backend and bootstrap its tables.
///
/// The SQL backend retries the initial connection and then falls back to an
/// in-memory store. The ORM backend fails on connection error.
pub async fn open_store(options: &StoreOptions) -> Result<Arc<dyn Store>, StoreError> {
    match options.backend {
        Backend::Sql => {
            let pool = match connect_with_retry(
                &options.database_url,
                options.max_connections,
                options.connect_retries,
                options.retry_delay,
            )
            .await
            {
                Ok(pool) => pool,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to connect to database after all retries");
                    tracing::warn!("Using in-memory storage as fallback");
                    return Ok(Arc::new(MemoryStore::new()));
                }
            };

            migrations::run(&pool).await?;
            Ok(Arc::new(SqlStore::new(pool)))
        }
        Backend::Orm => {
            let store = OrmStore::connect(&options.database_url, options.max_connections).await?;
            migrations::run_orm(store.connection()).await?;
            Ok(Arc::new(store))
        }
        Backend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("SQL".parse::<Backend>().unwrap(), Backend::Sql);
        assert_eq!("orm".parse::<Backend>().unwrap(), Backend::Orm);
        assert_eq!("Memory".parse::<Backend>().unwrap(), Backend::Memory);
        assert!("mongo".parse::<Backend>().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn sql_backend_falls_back_to_memory() {
        let options = StoreOptions {
            backend: Backend::Sql,
            database_url: "not-a-database-url".into(),
            connect_retries: 3,
            retry_delay: Duration::from_secs(2),
            ..StoreOptions::default()
        };

        let store = open_store(&options).await.unwrap();
        assert_eq!(store.backend(), Backend::Memory);
    }

    #[tokio::test]
    async fn orm_backend_connection_failure_is_fatal() {
        let options = StoreOptions {
            backend: Backend::Orm,
            database_url: "not-a-database-url".into(),
            ..StoreOptions::default()
        };

        assert!(open_store(&options).await.is_err());
    }
}

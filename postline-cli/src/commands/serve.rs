//! HTTP server command
//!
//! Opens the configured storage backend, serves the API until SIGTERM or
//! Ctrl+C, then closes the store.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use postline_server::auth::TokenService;
use postline_server::store::StoreOptions;
use postline_server::{open_store, run_server, Backend, ServerConfig, Settings};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "POSTLINE_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Storage backend: sql (raw queries), orm, or memory
    #[arg(long, env = "POSTLINE_BACKEND", default_value = "sql")]
    pub backend: Backend,

    /// Connection attempts before the sql backend falls back to memory
    #[arg(long, default_value_t = 3)]
    pub connect_retries: u32,

    /// Seconds to wait between connection attempts
    #[arg(long, default_value_t = 2)]
    pub retry_delay_secs: u64,

    /// Maximum pooled database connections
    #[arg(long, default_value_t = 5)]
    pub max_connections: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,
}

impl ServeArgs {
    fn store_options(&self, settings: &Settings) -> StoreOptions {
        StoreOptions {
            backend: self.backend,
            database_url: settings.database_url(),
            max_connections: self.max_connections,
            connect_retries: self.connect_retries,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
        }
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind,
            cors_permissive: self.cors_permissive,
            request_timeout: Duration::from_secs(self.timeout),
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let settings = Settings::from_env();

    let tokens = TokenService::new(
        &settings.secret_key,
        &settings.algorithm,
        settings.access_token_expire_seconds,
    )
    .context("Invalid token settings (check SECRET_KEY, ALGORITHM, ACCESS_TOKEN_EXPIRE_SECONDS)")?;

    tracing::info!(
        backend = %args.backend,
        host = %settings.database_host,
        database = %settings.database_name,
        "Opening storage"
    );
    let store = open_store(&args.store_options(&settings))
        .await
        .context("Failed to open storage backend")?;

    tracing::info!("Starting postline server on {}", args.bind);
    let served = run_server(store.clone(), tokens, args.server_config()).await;

    store.close().await;
    tracing::info!("Storage closed");

    served.context("Server error")
}

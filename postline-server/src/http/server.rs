//! Router assembly and the serve loop
//!
//! Middleware, outermost first: request tracing, CORS, per-request timeout.
//! CORS only admits local origins unless `cors_permissive` is set.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, StatusCode};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::routes;
use crate::auth::TokenService;
use crate::store::Store;

/// Dev frontend port admitted by the local CORS policy alongside the API's own port
const FRONTEND_DEV_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,

    /// Admit any origin. Off by default.
    pub cors_permissive: bool,

    /// Requests running longer than this get 408
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            cors_permissive: false,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// State shared by every handler
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }
}

fn local_origins(api_port: u16) -> Vec<HeaderValue> {
    let mut ports = vec![FRONTEND_DEV_PORT, api_port];
    ports.dedup();

    ports
        .into_iter()
        .flat_map(|port| {
            ["localhost", "127.0.0.1"]
                .into_iter()
                .filter_map(move |host| HeaderValue::try_from(format!("http://{host}:{port}")).ok())
        })
        .collect()
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.cors_permissive {
        tracing::warn!("CORS: permissive mode, all origins allowed");
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(local_origins(config.bind_addr.port()))
        .allow_methods(Any)
        .allow_headers(Any)
}

fn timeout_layer(config: &ServerConfig) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, config.request_timeout)
}

pub fn build_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .merge(routes::root::router())
        .merge(routes::posts::router())
        .merge(routes::users::router())
        .merge(routes::auth::router())
        .layer(timeout_layer(config))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl+C or SIGTERM.
///
/// The store stays open; whoever opened it closes it after this returns:
///
/// ```ignore
/// let store = open_store(&options).await?;
/// run_server(store.clone(), tokens, ServerConfig::default()).await?;
/// store.close().await;
/// ```
pub async fn run_server(
    store: Arc<dyn Store>,
    tokens: TokenService,
    config: ServerConfig,
) -> Result<(), ServerError> {
    let backend = store.backend();
    let app = build_router(Arc::new(AppState::new(store, tokens)), &config);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.bind_addr,
            source,
        })?;
    tracing::info!(addr = %config.bind_addr, %backend, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "Ctrl+C",
            Err(e) => {
                tracing::error!(error = %e, "Ctrl+C handler unavailable");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler unavailable");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    let received = tokio::select! {
        name = ctrl_c => name,
        name = terminate => name,
    };
    tracing::info!(signal = received, "Shutting down");
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_local() {
        let config = ServerConfig::default();
        assert!(config.bind_addr.ip().is_loopback());
        assert_eq!(config.bind_addr.port(), 8000);
        assert!(!config.cors_permissive);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_requests_get_408() {
        use axum::body::Body;
        use axum::http::Request;
        use axum::routing::get;
        use tower::ServiceExt;

        let config = ServerConfig {
            request_timeout: Duration::from_secs(1),
            ..ServerConfig::default()
        };
        let app = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "done"
                }),
            )
            .layer(timeout_layer(&config));

        let response = app
            .oneshot(Request::get("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[test]
    fn local_origins_cover_frontend_and_api_ports() {
        let origins = local_origins(8000);
        assert_eq!(origins.len(), 4);
        assert!(origins.contains(&HeaderValue::from_static("http://localhost:3000")));
        assert!(origins.contains(&HeaderValue::from_static("http://127.0.0.1:8000")));

        assert_eq!(local_origins(FRONTEND_DEV_PORT).len(), 2);
    }
}

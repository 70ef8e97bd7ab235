//! Root and liveness endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::Data;
use crate::http::server::AppState;

/// Liveness response, naming the backend actually in use
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub backend: &'static str,
}

/// GET /
async fn root() -> Json<Data<&'static str>> {
    Json(Data::new("Server is running"))
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backend: state.store.backend().as_str(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenService;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn root_reports_running() {
        let Json(body) = root().await;
        assert_eq!(body.data, "Server is running");
    }

    #[tokio::test]
    async fn health_names_backend() {
        let state = Arc::new(AppState::new(
            Arc::new(MemoryStore::new()),
            TokenService::new("secret", "HS256", 60).unwrap(),
        ));

        let Json(body) = health(State(state)).await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.backend, "memory");
    }
}

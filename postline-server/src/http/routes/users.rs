//! User endpoints - registration and lookup
//!
//! Responses never include the password hash.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::Data;
use crate::auth::hash_password;
use crate::http::error::ApiError;
use crate::http::extractors::{JsonBody, ValidId};
use crate::http::server::AppState;
use crate::models::{Email, NewUser, User, ValidationError};

/// Registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// POST /users/ - register a user
async fn create_user(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let email = Email::new(&req.email)?;
    if req.password.is_empty() {
        return Err(ValidationError::Empty { field: "password" }.into());
    }

    // Argon2 is CPU-bound; keep it off the async workers
    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal {
            message: format!("password hashing task failed: {}", e),
        })?
        .map_err(|e| ApiError::Internal {
            message: e.to_string(),
        })?;

    let user = state
        .store
        .create_user(&NewUser {
            email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users/{id}
async fn get_user(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<Data<User>>, ApiError> {
    let user = state.store.get_user(id).await?;
    Ok(Json(Data::new(user)))
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/", post(create_user))
        .route("/users/{id}", get(get_user))
}

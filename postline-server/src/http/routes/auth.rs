//! Login endpoint
//!
//! Unknown email and wrong password produce the same 403 response, and both
//! run one Argon2 verification so they also take about the same time.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::auth::{hash_password, verify_password};
use crate::http::error::ApiError;
use crate::http::extractors::LoginCredentials;
use crate::http::server::AppState;
use crate::models::User;
use crate::store::StoreError;

/// Issued access token
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// Digest verified against when the email is unknown, so both rejection paths
/// pay for one Argon2 verification.
static DECOY_DIGEST: Lazy<String> = Lazy::new(|| {
    hash_password("postline-decoy-password").unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build decoy password digest");
        String::new()
    })
});

/// Check `password` against the user's digest, or against the decoy when there
/// is no user. Returns the user only on a match.
async fn check_credentials(user: Option<User>, password: String) -> Result<Option<User>, ApiError> {
    let digest = match &user {
        Some(user) => user.password_hash.clone(),
        None => DECOY_DIGEST.clone(),
    };

    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &digest))
        .await
        .map_err(|e| ApiError::Internal {
            message: format!("password verification task failed: {}", e),
        })?;

    Ok(user.filter(|_| matches))
}

/// POST /auth/login
async fn login(
    State(state): State<Arc<AppState>>,
    credentials: LoginCredentials,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = match state
        .store
        .find_user_by_email(credentials.email.trim())
        .await
    {
        Ok(user) => Some(user),
        Err(StoreError::NotFound { .. }) => None,
        Err(e) => return Err(e.into()),
    };
    let known_email = user.is_some();

    let Some(user) = check_credentials(user, credentials.password).await? else {
        tracing::debug!(known_email, "Login rejected");
        return Err(ApiError::InvalidCredentials);
    };

    let access_token = state
        .tokens
        .issue(user.id, Utc::now())
        .map_err(|e| ApiError::Internal {
            message: e.to_string(),
        })?;

    tracing::info!(user_id = user.id, "Access token issued");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

/// Auth routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/auth/login", post(login))
}

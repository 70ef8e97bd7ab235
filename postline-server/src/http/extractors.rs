//! Custom Axum extractors

use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::header;
use axum::http::request::Parts;
use axum::{Form, Json};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::error::ApiError;
use super::server::AppState;
use crate::models::{User, ValidationError};
use crate::store::StoreError;

/// Extract and validate an integer id from path
pub struct ValidId(pub i32);

impl<S> FromRequestParts<S> for ValidId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::Empty { field: "id" }))?;

        let id = id.parse::<i32>().map_err(|_| {
            ApiError::Validation(ValidationError::InvalidFormat {
                field: "id",
                reason: "must be an integer",
            })
        })?;

        Ok(Self(id))
    }
}

/// JSON body whose rejections are reported as validation errors (400)
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            ApiError::Validation(ValidationError::MalformedBody {
                reason: rejection.body_text(),
            })
        })?;

        Ok(Self(value))
    }
}

/// The user behind a valid bearer token.
///
/// The token's subject is looked up on every request, so a token for a user
/// that no longer exists is rejected.
pub struct AuthUser(pub User);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        let user_id = state.tokens.verify(token, Utc::now()).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            ApiError::Unauthorized
        })?;

        match state.store.get_user(user_id).await {
            Ok(user) => Ok(Self(user)),
            Err(StoreError::NotFound { .. }) => {
                tracing::warn!(user_id, "Token subject no longer exists");
                Err(ApiError::Unauthorized)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Login credentials from either a JSON body or an OAuth2 password form
#[derive(Debug, Clone, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// OAuth2 password-flow form fields
#[derive(Deserialize)]
struct PasswordForm {
    username: String,
    password: String,
}

impl<S> FromRequest<S> for LoginCredentials
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(form) = Form::<PasswordForm>::from_request(req, state)
                .await
                .map_err(|rejection| {
                    ApiError::Validation(ValidationError::MalformedBody {
                        reason: rejection.body_text(),
                    })
                })?;

            return Ok(Self {
                email: form.username,
                password: form.password,
            });
        }

        let JsonBody(credentials) = JsonBody::<Self>::from_request(req, state).await?;
        Ok(credentials)
    }
}

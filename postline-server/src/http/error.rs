//! HTTP error mapping
//!
//! Every failure becomes `{"error": <kind>, "message": <text>}`. Storage and
//! internal failures are logged in full and answered with a generic message.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::models::ValidationError;
use crate::store::StoreError;

const GENERIC_FAILURE: &str = "an internal error occurred";

#[derive(Debug)]
pub enum ApiError {
    /// Bad path, body, or field value (400)
    Validation(ValidationError),

    /// Missing, malformed, invalid, or expired bearer token, or a token whose
    /// user is gone (401)
    Unauthorized,

    /// Login failed; unknown email and wrong password look the same (403)
    InvalidCredentials,

    NotFound { resource: &'static str, id: String },

    /// Unique key already taken (409)
    Conflict {
        resource: &'static str,
        field: &'static str,
    },

    /// Storage failure (500)
    Database(StoreError),

    /// Anything else that is our fault (500)
    Internal { message: String },
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidCredentials => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Unauthorized => "unauthorized",
            Self::InvalidCredentials => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Database(_) | Self::Internal { .. } => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Unauthorized => "Could not validate credentials".to_owned(),
            Self::InvalidCredentials => "Invalid credentials".to_owned(),
            Self::NotFound { resource, id } => format!("{resource} '{id}' not found"),
            Self::Conflict { resource, field } => {
                format!("{resource} with this {field} already exists")
            }
            Self::Database(_) | Self::Internal { .. } => GENERIC_FAILURE.to_owned(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Database(e) => tracing::error!(error = %e, "Storage failure"),
            Self::Internal { message } => tracing::error!(%message, "Internal failure"),
            Self::Validation(e) => {
                tracing::debug!(field = e.field().unwrap_or("body"), error = %e, "Rejected input")
            }
            _ => {}
        }

        let body = ErrorBody {
            error: self.kind(),
            message: self.client_message(),
        };
        let mut response = (self.status(), Json(body)).into_response();

        if matches!(self, Self::Unauthorized) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { resource, id } => Self::NotFound { resource, id },
            StoreError::Conflict { resource, field } => Self::Conflict { resource, field },
            other => Self::Database(other),
        }
    }
}

//! Error types for the gateway crate.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use recipebox_core::CoreError;
use recipebox_store::StoreError;
use serde_json::json;

use crate::config::ConfigError;

/// Errors that can occur during gateway request handling.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// An error propagated from the catalog or a backend.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A query parameter or path segment failed domain validation.
    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// The request is malformed in a way the domain layer never sees.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A gateway-level resource such as a vocabulary tag does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The request body exceeded the limit for its route.
    #[error("request body larger than {max} bytes")]
    PayloadTooLarge { max: usize },

    /// The route needs a bearer token and none was sent.
    #[error("authentication required")]
    Unauthorized,

    /// Startup configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GatewayError {
    /// HTTP status this error maps to.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Store(err) => store_status(err),
            GatewayError::Invalid(err) => core_status(err),
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn core_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::SignInRequired(_) => StatusCode::UNAUTHORIZED,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::Invalid(core) => core_status(core),
        StoreError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        StoreError::Forbidden(_) | StoreError::SignatureMismatch => StatusCode::FORBIDDEN,
        StoreError::RecipeNotFound(_) | StoreError::ProfileNotFound(_) | StoreError::MediaNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        StoreError::SignatureExpired { .. } => StatusCode::GONE,
        StoreError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        StoreError::UploadSize { size, max } if size > max => StatusCode::PAYLOAD_TOO_LARGE,
        StoreError::UploadSize { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "internal error".to_owned()
        } else {
            self.to_string()
        };
        (status, Json(json!({"error": message}))).into_response()
    }
}

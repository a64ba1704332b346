// src/error.rs
//! Request-level error taxonomy with HTTP status mapping.
//!
//! Only configuration and region-resolution problems surface to clients;
//! per-instance fetch and per-item classification failures are absorbed at
//! their component boundary and never become request failures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Region map missing or unparseable at boot. Every timeline request
    /// fails with this until the configuration is corrected.
    #[error("region configuration missing or invalid")]
    Configuration,

    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error("region {0} has no configured instances")]
    EmptyInstanceList(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Configuration | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UnknownRegion(_) => StatusCode::NOT_FOUND,
            ApiError::EmptyInstanceList(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

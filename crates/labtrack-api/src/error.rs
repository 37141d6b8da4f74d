//! Error types for the labtrack-api crate.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use labtrack_core::LabtrackError;
use labtrack_graph::GraphError;
use labtrack_split::SplitError;

/// Request failure, rendered as `{"message": ...}` with a matching status.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad input. Raised before anything is written.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }
        let body = ErrorBody {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<GraphError> for ApiError {
    fn from(e: GraphError) -> Self {
        if e.is_not_found() {
            Self::NotFound(e.to_string())
        } else {
            Self::Internal(e.to_string())
        }
    }
}

impl From<SplitError> for ApiError {
    fn from(e: SplitError) -> Self {
        match e {
            SplitError::InvalidArgument { .. } => Self::Validation(e.to_string()),
            SplitError::Graph(inner) => inner.into(),
        }
    }
}

impl From<LabtrackError> for ApiError {
    fn from(e: LabtrackError) -> Self {
        match e {
            LabtrackError::InvalidId { .. } => Self::Validation(e.to_string()),
            LabtrackError::Config(_) => Self::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Validation(format!("Malformed request body: {e}"))
    }
}

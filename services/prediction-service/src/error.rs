use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::domain::ValidationError;
use crate::models::ModelError;
use crate::registry::ModelGroup;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("{0} not loaded")]
    ModelNotReady(ModelGroup),
    #[error("inference failed: {0}")]
    Inference(#[from] ModelError),
    /// Inputs passed validation but a derived statistic overflowed.
    #[error("item sizes are too large: feature {0} is not finite")]
    NonFiniteFeature(&'static str),
}

impl PredictError {
    /// Metric outcome label.
    pub fn outcome(&self) -> &'static str {
        match self {
            PredictError::ModelNotReady(_) => "not_ready",
            PredictError::Inference(_) => "error",
            PredictError::NonFiniteFeature(_) => "invalid",
        }
    }
}

/// Everything a handler can answer with besides success. Body is `{"detail": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Predict(#[from] PredictError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{}", .0.body_text())]
    Body(#[from] JsonRejection),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Predict(PredictError::ModelNotReady(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Predict(PredictError::Inference(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Predict(PredictError::NonFiniteFeature(_)) | ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Body(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

//! HTTP boundary. JSON field names are the wire contract.
//!
//! - `GET /` service info
//! - `GET /health` per-group readiness
//! - `POST /predict` utilization prediction (503 when the model is not loaded)
//! - `POST /predict-algorithm` algorithm recommendation (503 when the bundle is not loaded)
//! - `GET /metrics` Prometheus exposition

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domain::PredictionRequest;
use crate::error::ApiError;
use crate::predictor::{AlgorithmPrediction, PredictionService, UtilizationPrediction};

pub const SERVICE_TITLE: &str = "Container Loading ML Service";

pub type AppState = Arc<PredictionService>;

pub fn router(service: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/predict-algorithm", post(predict_algorithm))
        .route("/metrics", get(packwise_core::metrics_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub utilization_model: bool,
    pub algorithm_model: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub utilization_model: bool,
    pub algorithm_model: bool,
}

async fn root(State(service): State<AppState>) -> Json<ServiceInfo> {
    let status = service.registry().status();
    Json(ServiceInfo {
        service: SERVICE_TITLE,
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        utilization_model: status.utilization_model,
        algorithm_model: status.algorithm_model,
    })
}

async fn health(State(service): State<AppState>) -> Json<HealthResponse> {
    let status = service.registry().status();
    Json(HealthResponse {
        status: "healthy",
        utilization_model: status.utilization_model,
        algorithm_model: status.algorithm_model,
    })
}

async fn predict(
    State(service): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<UtilizationPrediction>, ApiError> {
    let Json(req) = payload?;
    req.validate()?;
    Ok(Json(service.predict_utilization(&req.items, &req.container)?))
}

async fn predict_algorithm(
    State(service): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<AlgorithmPrediction>, ApiError> {
    let Json(req) = payload?;
    req.validate()?;
    Ok(Json(service.predict_algorithm(&req.items, &req.container)?))
}

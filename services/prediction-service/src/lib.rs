//! Container loading prediction service: utilization regression and packing
//! algorithm recommendation over pre-trained models.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod features;
pub mod models;
pub mod predictor;
pub mod registry;

pub use config::ServiceConfig;
pub use domain::{Container, Item, PredictionRequest};
pub use predictor::PredictionService;
pub use registry::ModelRegistry;

/// Loads models once, then serves until Ctrl-C.
pub async fn run(cfg: ServiceConfig) -> Result<()> {
    packwise_core::init_metrics()?;

    let registry = Arc::new(ModelRegistry::load(&cfg.artifact_paths()));
    let status = registry.status();
    info!(utilization_model = status.utilization_model, algorithm_model = status.algorithm_model, "model registry ready");

    let app = api::router(Arc::new(PredictionService::new(registry)));
    let listener = tokio::net::TcpListener::bind((cfg.host.as_str(), cfg.port))
        .await
        .with_context(|| format!("binding {}:{}", cfg.host, cfg.port))?;
    info!(addr = %listener.local_addr()?, "prediction service listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("shutdown");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

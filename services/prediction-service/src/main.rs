use anyhow::Result;
use tracing::info;

use prediction_service::ServiceConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = ServiceConfig::load()?;
    packwise_core::init_tracing(&cfg.service_name, &cfg.log_level)?;
    info!(?cfg, "config loaded");
    prediction_service::run(cfg).await
}

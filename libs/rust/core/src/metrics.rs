//! Prediction metrics group and the Prometheus text renderer behind `/metrics`.

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use once_cell::sync::{Lazy, OnceCell};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);
static PREDICTION_METRICS: OnceCell<PredictionMetrics> = OnceCell::new();

const LATENCY_BUCKETS_MS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 25.0, 50.0, 100.0];

#[derive(Clone, Debug)]
pub struct PredictionMetrics {
    /// Labels: `kind` (utilization|algorithm), `outcome` (ok|not_ready|error).
    pub predictions_total: IntCounterVec,
    /// Label: `kind`.
    pub latency_ms: HistogramVec,
    /// Label: `group`. 1 when the model group loaded.
    pub model_ready: IntGaugeVec,
}

impl PredictionMetrics {
    fn register(registry: &Registry) -> prometheus::Result<Self> {
        let predictions_total = IntCounterVec::new(
            Opts::new("packwise_predictions_total", "Prediction requests by kind and outcome"),
            &["kind", "outcome"],
        )?;
        let latency_ms = HistogramVec::new(
            HistogramOpts::new("packwise_prediction_latency_ms", "Feature extraction + inference latency (ms)")
                .buckets(LATENCY_BUCKETS_MS.to_vec()),
            &["kind"],
        )?;
        let model_ready = IntGaugeVec::new(
            Opts::new("packwise_model_ready", "Whether a model group loaded at startup"),
            &["group"],
        )?;
        registry.register(Box::new(predictions_total.clone()))?;
        registry.register(Box::new(latency_ms.clone()))?;
        registry.register(Box::new(model_ready.clone()))?;
        Ok(Self { predictions_total, latency_ms, model_ready })
    }

    pub fn record(&self, kind: &str, outcome: &str, latency_ms: f64) {
        self.predictions_total.with_label_values(&[kind, outcome]).inc();
        self.latency_ms.with_label_values(&[kind]).observe(latency_ms);
    }

    pub fn set_ready(&self, group: &str, ready: bool) {
        self.model_ready.with_label_values(&[group]).set(i64::from(ready));
    }
}

/// Registers the metrics group once; later calls return the same instance.
pub fn init_metrics() -> Result<&'static PredictionMetrics> {
    Ok(PREDICTION_METRICS.get_or_try_init(|| PredictionMetrics::register(&REGISTRY))?)
}

/// `None` until [`init_metrics`] ran. Recording is skipped in that case.
pub fn prediction_metrics() -> Option<&'static PredictionMetrics> { PREDICTION_METRICS.get() }

pub fn render_metrics() -> Result<String> {
    let mut buf = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buf)?;
    Ok(String::from_utf8(buf)?)
}

pub async fn metrics_handler() -> Response {
    if PREDICTION_METRICS.get().is_none() {
        return (StatusCode::SERVICE_UNAVAILABLE, "metrics not initialized").into_response();
    }
    match render_metrics() {
        Ok(body) => ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("encode error: {e}")).into_response(),
    }
}

//! Prediction orchestration: readiness check, feature extraction, inference, post-processing.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::{Container, Item};
use crate::error::PredictError;
use crate::features::{
    extract_algorithm_features, extract_utilization_features, AlgorithmFeatures, ALGORITHM_FEATURE_NAMES,
    UTILIZATION_FEATURE_NAMES,
};
use crate::models::ModelError;
use crate::registry::{ModelGroup, ModelRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence { Low, Medium, High }

impl Confidence {
    /// Above 1.0 the load cannot physically fit; (0.3, 0.95) is the well-trained band.
    pub fn from_fill_ratio(fill_ratio: f64) -> Self {
        if fill_ratio > 1.0 {
            Confidence::Low
        } else if fill_ratio > 0.3 && fill_ratio < 0.95 {
            Confidence::High
        } else {
            Confidence::Medium
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSummary {
    pub num_types: u64,
    pub total_items: u64,
    pub fill_ratio: f64,
    pub volume_std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtilizationPrediction {
    pub predicted_utilization: f64,
    pub predicted_percentage: String,
    pub confidence: Confidence,
    pub feature_summary: FeatureSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlgorithmPrediction {
    pub recommended_algorithm: String,
    pub confidence: f64,
    pub features: AlgorithmFeatures,
    pub all_probabilities: BTreeMap<String, f64>,
}

/// Fails with the name of the first feature that is not finite.
fn ensure_finite(row: &[f64], names: &[&'static str]) -> Result<(), PredictError> {
    match row.iter().zip(names).find(|(v, _)| !v.is_finite()) {
        Some((_, name)) => Err(PredictError::NonFiniteFeature(*name)),
        None => Ok(()),
    }
}

/// Rounds the exact decimal value of `value`, ties to even. Scaling by `10^places` first
/// would round an already inexact product and can move the last digit.
pub fn round_to(value: f64, places: usize) -> f64 {
    format!("{value:.places$}").parse().unwrap_or(value)
}

/// Stateless per request; the only shared state is the read-only registry.
#[derive(Clone)]
pub struct PredictionService {
    registry: Arc<ModelRegistry>,
}

impl PredictionService {
    pub fn new(registry: Arc<ModelRegistry>) -> Self { Self { registry } }

    pub fn registry(&self) -> &ModelRegistry { &self.registry }

    #[instrument(skip_all, fields(items = items.len()))]
    pub fn predict_utilization(&self, items: &[Item], container: &Container) -> Result<UtilizationPrediction, PredictError> {
        let started = Instant::now();
        let res = self.utilization(items, container);
        record(ModelGroup::Utilization, &res, started);
        res
    }

    #[instrument(skip_all, fields(items = items.len()))]
    pub fn predict_algorithm(&self, items: &[Item], container: &Container) -> Result<AlgorithmPrediction, PredictError> {
        let started = Instant::now();
        let res = self.algorithm(items, container);
        record(ModelGroup::Algorithm, &res, started);
        res
    }

    fn utilization(&self, items: &[Item], container: &Container) -> Result<UtilizationPrediction, PredictError> {
        let model = self.registry.utilization()?;
        let features = extract_utilization_features(items, container);
        let row = features.to_row();
        ensure_finite(&row, &UTILIZATION_FEATURE_NAMES)?;
        let raw = model.predict(&row)?;
        if !raw.is_finite() { return Err(ModelError::NonFinite.into()); }
        let prediction = raw.clamp(0.0, 1.0);
        debug!(raw, prediction, fill_ratio = features.fill_ratio, "utilization predicted");

        Ok(UtilizationPrediction {
            predicted_utilization: round_to(prediction, 4),
            predicted_percentage: format!("{:.1}%", prediction * 100.0),
            confidence: Confidence::from_fill_ratio(features.fill_ratio),
            feature_summary: FeatureSummary {
                num_types: features.num_types as u64,
                total_items: features.total_items as u64,
                fill_ratio: round_to(features.fill_ratio, 3),
                volume_std: round_to(features.volume_std, 2),
            },
        })
    }

    fn algorithm(&self, items: &[Item], container: &Container) -> Result<AlgorithmPrediction, PredictError> {
        let bundle = self.registry.algorithm()?;
        let features = extract_algorithm_features(items, container);
        let row = features.to_row();
        ensure_finite(&row, &ALGORITHM_FEATURE_NAMES)?;
        let scaled = bundle.scaler().transform(&row)?;
        let label_id = bundle.classifier().predict(&scaled)?;
        let proba = bundle.classifier().predict_proba(&scaled)?;
        if proba.iter().any(|p| !p.is_finite()) { return Err(ModelError::NonFinite.into()); }

        let encoder = bundle.encoder();
        let recommended_algorithm = encoder.decode(label_id)?.to_string();
        let confidence = proba.iter().copied().fold(0.0, f64::max);
        let all_probabilities = proba.iter().enumerate()
            .map(|(id, p)| Ok((encoder.decode(id)?.to_string(), round_to(*p, 4))))
            .collect::<Result<BTreeMap<_, _>, ModelError>>()?;
        debug!(%recommended_algorithm, confidence, "algorithm predicted");

        Ok(AlgorithmPrediction {
            recommended_algorithm,
            confidence: round_to(confidence, 4),
            features,
            all_probabilities,
        })
    }
}

fn record<T>(group: ModelGroup, res: &Result<T, PredictError>, started: Instant) {
    if let Some(m) = packwise_core::prediction_metrics() {
        let outcome = res.as_ref().map_or_else(PredictError::outcome, |_| "ok");
        m.record(group.as_str(), outcome, started.elapsed().as_secs_f64() * 1000.0);
    }
}

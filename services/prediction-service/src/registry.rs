//! Startup-only model registry.
//!
//! Each model group is loaded once, in isolation: a failure leaves that group
//! `Unavailable` for the rest of the process and never affects the other group.
//! The registry is immutable afterwards and shared behind an `Arc`.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::ArtifactPaths;
use crate::error::PredictError;
use crate::features::{ALGORITHM_FEATURE_COUNT, UTILIZATION_FEATURE_COUNT};
use crate::models::{
    invalid, Classifier, ClassifierArtifact, LabelEncoder, ModelError, RegressorArtifact, Regressor, StandardScaler,
    Transformer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelGroup { Utilization, Algorithm }

impl ModelGroup {
    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelGroup::Utilization => "utilization",
            ModelGroup::Algorithm => "algorithm",
        }
    }
}

impl fmt::Display for ModelGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelGroup::Utilization => f.write_str("Utilization model"),
            ModelGroup::Algorithm => f.write_str("Algorithm selector"),
        }
    }
}

pub enum ModelSlot<T> {
    Ready(T),
    Unavailable(String),
}

impl<T> ModelSlot<T> {
    fn from_load(group: ModelGroup, res: Result<T, ModelError>) -> Self {
        match res {
            Ok(v) => { info!(group = group.as_str(), "model group loaded"); ModelSlot::Ready(v) }
            Err(e) => { warn!(group = group.as_str(), error = %e, "model group unavailable"); ModelSlot::Unavailable(e.to_string()) }
        }
    }

    pub fn is_ready(&self) -> bool { matches!(self, ModelSlot::Ready(_)) }

    pub fn get(&self) -> Option<&T> {
        match self {
            ModelSlot::Ready(v) => Some(v),
            ModelSlot::Unavailable(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            ModelSlot::Ready(_) => None,
            ModelSlot::Unavailable(r) => Some(r),
        }
    }
}

/// Classifier, scaler and label encoder; usable only as a whole.
pub struct AlgorithmBundle {
    classifier: Box<dyn Classifier>,
    scaler: Box<dyn Transformer>,
    encoder: LabelEncoder,
}

impl AlgorithmBundle {
    /// Cross-checks the three parts against each other and the 5-feature row.
    pub fn new(classifier: Box<dyn Classifier>, scaler: Box<dyn Transformer>, encoder: LabelEncoder) -> Result<Self, ModelError> {
        expect_features("scaler", scaler.n_features(), ALGORITHM_FEATURE_COUNT)?;
        expect_features("algorithm classifier", classifier.n_features(), ALGORITHM_FEATURE_COUNT)?;
        if classifier.n_classes() != encoder.len() {
            return Err(invalid(format!(
                "classifier predicts {} classes but label encoder knows {}", classifier.n_classes(), encoder.len()
            )));
        }
        Ok(Self { classifier, scaler, encoder })
    }

    pub fn classifier(&self) -> &dyn Classifier { &*self.classifier }
    pub fn scaler(&self) -> &dyn Transformer { &*self.scaler }
    pub fn encoder(&self) -> &LabelEncoder { &self.encoder }
}

fn expect_features(what: &str, got: usize, expected: usize) -> Result<(), ModelError> {
    if got == expected { Ok(()) } else { Err(invalid(format!("{what} expects {got} features, service provides {expected}"))) }
}

fn load_utilization(path: &Path) -> Result<Box<dyn Regressor>, ModelError> {
    let model = RegressorArtifact::load(path)?;
    expect_features("utilization model", model.n_features(), UTILIZATION_FEATURE_COUNT)?;
    Ok(Box::new(model))
}

fn load_algorithm(paths: &ArtifactPaths) -> Result<AlgorithmBundle, ModelError> {
    let classifier = ClassifierArtifact::load(&paths.algorithm)?;
    let scaler = StandardScaler::load(&paths.scaler)?;
    let encoder = LabelEncoder::load(&paths.label_encoder)?;
    AlgorithmBundle::new(Box::new(classifier), Box::new(scaler), encoder)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStatus {
    pub utilization_model: bool,
    pub algorithm_model: bool,
}

pub struct ModelRegistry {
    utilization: ModelSlot<Box<dyn Regressor>>,
    algorithm: ModelSlot<AlgorithmBundle>,
}

impl ModelRegistry {
    /// Best-effort load of both groups. Never fails.
    pub fn load(paths: &ArtifactPaths) -> Self {
        info!(?paths, "loading model artifacts");
        let registry = Self {
            utilization: ModelSlot::from_load(ModelGroup::Utilization, load_utilization(&paths.utilization)),
            algorithm: ModelSlot::from_load(ModelGroup::Algorithm, load_algorithm(paths)),
        };
        registry.publish_readiness();
        registry
    }

    /// Registry over in-memory models; `None` marks a group as not loaded.
    pub fn with_models(utilization: Option<Box<dyn Regressor>>, algorithm: Option<AlgorithmBundle>) -> Self {
        let registry = Self {
            utilization: utilization.map_or_else(|| ModelSlot::Unavailable("not loaded".into()), ModelSlot::Ready),
            algorithm: algorithm.map_or_else(|| ModelSlot::Unavailable("not loaded".into()), ModelSlot::Ready),
        };
        registry.publish_readiness();
        registry
    }

    pub fn empty() -> Self { Self::with_models(None, None) }

    fn publish_readiness(&self) {
        if let Some(m) = packwise_core::prediction_metrics() {
            m.set_ready(ModelGroup::Utilization.as_str(), self.utilization.is_ready());
            m.set_ready(ModelGroup::Algorithm.as_str(), self.algorithm.is_ready());
        }
    }

    pub fn is_ready(&self, group: ModelGroup) -> bool {
        match group {
            ModelGroup::Utilization => self.utilization.is_ready(),
            ModelGroup::Algorithm => self.algorithm.is_ready(),
        }
    }

    pub fn status(&self) -> RegistryStatus {
        RegistryStatus { utilization_model: self.utilization.is_ready(), algorithm_model: self.algorithm.is_ready() }
    }

    /// Why a group is unavailable; `None` when it is ready.
    pub fn unavailable_reason(&self, group: ModelGroup) -> Option<&str> {
        match group {
            ModelGroup::Utilization => self.utilization.reason(),
            ModelGroup::Algorithm => self.algorithm.reason(),
        }
    }

    pub fn utilization(&self) -> Result<&dyn Regressor, PredictError> {
        self.utilization.get().map(|m| &**m).ok_or(PredictError::ModelNotReady(ModelGroup::Utilization))
    }

    pub fn algorithm(&self) -> Result<&AlgorithmBundle, PredictError> {
        self.algorithm.get().ok_or(PredictError::ModelNotReady(ModelGroup::Algorithm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classifier(n_features: usize, n_classes: usize) -> Box<dyn Classifier> {
        let coef: Vec<Vec<f64>> = (0..n_classes).map(|_| vec![0.0; n_features]).collect();
        Box::new(serde_json::from_value::<ClassifierArtifact>(json!({
            "kind": "logistic", "coef": coef, "intercept": vec![0.0; n_classes]
        })).unwrap())
    }

    fn scaler(n: usize) -> Box<dyn Transformer> {
        Box::new(serde_json::from_value::<StandardScaler>(json!({"mean": vec![0.0; n], "scale": vec![1.0; n]})).unwrap())
    }

    fn encoder(labels: &[&str]) -> LabelEncoder {
        LabelEncoder::new(labels.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[test]
    fn empty_registry_reports_not_ready() {
        let reg = ModelRegistry::empty();
        assert_eq!(reg.status(), RegistryStatus { utilization_model: false, algorithm_model: false });
        assert!(matches!(reg.utilization(), Err(PredictError::ModelNotReady(ModelGroup::Utilization))));
        assert!(matches!(reg.algorithm(), Err(PredictError::ModelNotReady(ModelGroup::Algorithm))));
        assert_eq!(reg.unavailable_reason(ModelGroup::Algorithm), Some("not loaded"));
    }

    #[test]
    fn bundle_rejects_class_count_mismatch() {
        let res = AlgorithmBundle::new(classifier(5, 3), scaler(5), encoder(&["ffd", "genetic"]));
        assert!(matches!(res, Err(ModelError::Invalid(_))));
    }

    #[test]
    fn bundle_rejects_wrong_width() {
        assert!(AlgorithmBundle::new(classifier(4, 2), scaler(5), encoder(&["a", "b"])).is_err());
        assert!(AlgorithmBundle::new(classifier(5, 2), scaler(6), encoder(&["a", "b"])).is_err());
        assert!(AlgorithmBundle::new(classifier(5, 2), scaler(5), encoder(&["a", "b"])).is_ok());
    }

    #[test]
    fn groups_are_independent() {
        let bundle = AlgorithmBundle::new(classifier(5, 2), scaler(5), encoder(&["ffd", "genetic"])).unwrap();
        let reg = ModelRegistry::with_models(None, Some(bundle));
        assert!(!reg.is_ready(ModelGroup::Utilization));
        assert!(reg.is_ready(ModelGroup::Algorithm));
        assert_eq!(reg.unavailable_reason(ModelGroup::Algorithm), None);
    }

    #[test]
    fn load_from_missing_dir_never_fails() {
        let dir = std::env::temp_dir().join("packwise-registry-missing-dir");
        let paths = ArtifactPaths {
            utilization: dir.join("u.json"),
            algorithm: dir.join("a.json"),
            scaler: dir.join("s.json"),
            label_encoder: dir.join("l.json"),
        };
        let reg = ModelRegistry::load(&paths);
        assert_eq!(reg.status(), RegistryStatus { utilization_model: false, algorithm_model: false });
        assert!(reg.unavailable_reason(ModelGroup::Utilization).is_some());
    }
}

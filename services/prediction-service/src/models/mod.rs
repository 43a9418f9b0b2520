//! Predictor capabilities and the JSON artifact formats that implement them.
//!
//! Artifacts are exported from the training notebooks:
//! - regressors: `random_forest` (mean of tree leaves) or `linear`
//! - classifiers: `random_forest` (mean of normalised leaf distributions) or `logistic`
//! - a standard scaler and a label encoder for the algorithm bundle
//!
//! Every artifact is validated when loaded so inference can index without checks.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

mod encoder;
mod linear;
mod scaler;
mod tree;

pub use encoder::LabelEncoder;
pub use linear::{LinearRegressor, LogisticClassifier};
pub use scaler::StandardScaler;
pub use tree::{DecisionTree, RandomForestClassifier, RandomForestRegressor};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read artifact {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("failed to parse artifact {path}: {source}")]
    Parse { path: PathBuf, #[source] source: serde_json::Error },
    #[error("invalid artifact: {0}")]
    Invalid(String),
    #[error("expected {expected} features, got {got}")]
    FeatureCount { expected: usize, got: usize },
    #[error("label id {0} is not known to the label encoder")]
    UnknownLabel(usize),
    #[error("model produced a non-finite output")]
    NonFinite,
}

pub(crate) fn invalid(msg: impl Into<String>) -> ModelError { ModelError::Invalid(msg.into()) }

pub(crate) fn check_row(expected: usize, row: &[f64]) -> Result<(), ModelError> {
    if row.len() == expected { Ok(()) } else { Err(ModelError::FeatureCount { expected, got: row.len() }) }
}

/// `predict(features) -> value`
pub trait Regressor: Send + Sync {
    fn n_features(&self) -> usize;
    fn predict(&self, row: &[f64]) -> Result<f64, ModelError>;
}

/// `predict_proba(features) -> distribution`; `predict` is its argmax.
pub trait Classifier: Send + Sync {
    fn n_features(&self) -> usize;
    fn n_classes(&self) -> usize;
    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ModelError>;

    fn predict(&self, row: &[f64]) -> Result<usize, ModelError> {
        let proba = self.predict_proba(row)?;
        argmax(&proba).ok_or(ModelError::NonFinite)
    }
}

/// `transform(row) -> scaled row`
pub trait Transformer: Send + Sync {
    fn n_features(&self) -> usize;
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>, ModelError>;
}

/// First index of the maximum; `None` for empty input or when a NaN is present.
pub fn argmax(values: &[f64]) -> Option<usize> {
    if values.iter().any(|v| v.is_nan()) { return None; }
    values.iter().enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Reads and deserialises a JSON artifact. Validation is the caller's job.
pub fn load_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let bytes = std::fs::read(path).map_err(|source| ModelError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_slice(&bytes).map_err(|source| ModelError::Parse { path: path.to_path_buf(), source })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressorArtifact {
    RandomForest(RandomForestRegressor),
    Linear(LinearRegressor),
}

impl RegressorArtifact {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let model: Self = load_artifact(path)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            Self::RandomForest(m) => m.validate(),
            Self::Linear(m) => m.validate(),
        }
    }
}

impl Regressor for RegressorArtifact {
    fn n_features(&self) -> usize {
        match self {
            Self::RandomForest(m) => m.n_features(),
            Self::Linear(m) => m.n_features(),
        }
    }

    fn predict(&self, row: &[f64]) -> Result<f64, ModelError> {
        match self {
            Self::RandomForest(m) => m.predict(row),
            Self::Linear(m) => m.predict(row),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    RandomForest(RandomForestClassifier),
    Logistic(LogisticClassifier),
}

impl ClassifierArtifact {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let model: Self = load_artifact(path)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            Self::RandomForest(m) => m.validate(),
            Self::Logistic(m) => m.validate(),
        }
    }
}

impl Classifier for ClassifierArtifact {
    fn n_features(&self) -> usize {
        match self {
            Self::RandomForest(m) => m.n_features(),
            Self::Logistic(m) => m.n_features(),
        }
    }

    fn n_classes(&self) -> usize {
        match self {
            Self::RandomForest(m) => m.n_classes(),
            Self::Logistic(m) => m.n_classes(),
        }
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        match self {
            Self::RandomForest(m) => m.predict_proba(row),
            Self::Logistic(m) => m.predict_proba(row),
        }
    }
}

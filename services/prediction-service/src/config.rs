use std::path::PathBuf;

use anyhow::Result;
use serde::Deserialize;

pub const SERVICE_NAME: &str = "prediction-service";

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub service_name: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub model_dir: PathBuf,
    pub utilization_model_file: String,
    pub algorithm_model_file: String,
    pub scaler_file: String,
    pub label_encoder_file: String,
}

/// Resolved locations of every artifact the registry tries to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub utilization: PathBuf,
    pub algorithm: PathBuf,
    pub scaler: PathBuf,
    pub label_encoder: PathBuf,
}

impl ServiceConfig {
    /// Defaults, then `PACKWISE_CONFIG_FILE`, then `PACKWISE__*` env vars.
    pub fn load() -> Result<Self> {
        packwise_core::load_config(SERVICE_NAME, |b| {
            b.set_default("host", "0.0.0.0")?
                .set_default("port", 5001_i64)?
                .set_default("log_level", "info")?
                .set_default("model_dir", "models")?
                .set_default("utilization_model_file", "utilization_predictor.json")?
                .set_default("algorithm_model_file", "algorithm_selector.json")?
                .set_default("scaler_file", "scaler.json")?
                .set_default("label_encoder_file", "label_encoder.json")
        })
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            utilization: self.model_dir.join(&self.utilization_model_file),
            algorithm: self.model_dir.join(&self.algorithm_model_file),
            scaler: self.model_dir.join(&self.scaler_file),
            label_encoder: self.model_dir.join(&self.label_encoder_file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_paths_join_model_dir() {
        let cfg = ServiceConfig {
            service_name: SERVICE_NAME.into(),
            host: "127.0.0.1".into(),
            port: 5001,
            log_level: "info".into(),
            model_dir: PathBuf::from("/srv/models"),
            utilization_model_file: "u.json".into(),
            algorithm_model_file: "a.json".into(),
            scaler_file: "s.json".into(),
            label_encoder_file: "l.json".into(),
        };
        let paths = cfg.artifact_paths();
        assert_eq!(paths.utilization, PathBuf::from("/srv/models/u.json"));
        assert_eq!(paths.label_encoder, PathBuf::from("/srv/models/l.json"));
    }

    #[test]
    fn loads_with_defaults() {
        let cfg = ServiceConfig::load().unwrap();
        assert!(!cfg.utilization_model_file.is_empty());
        assert!(!cfg.service_name.is_empty());
    }
}

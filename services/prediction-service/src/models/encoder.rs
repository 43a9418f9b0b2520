use std::collections::HashSet;

use serde::Deserialize;

use super::{invalid, ModelError};

/// Maps classifier label ids to algorithm names (`classes[id]`) and back.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self, ModelError> {
        let enc = Self { classes };
        enc.validate()?;
        Ok(enc)
    }

    pub fn load(path: &std::path::Path) -> Result<Self, ModelError> {
        let enc: Self = super::load_artifact(path)?;
        enc.validate()?;
        Ok(enc)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.classes.is_empty() { return Err(invalid("label encoder has no classes")); }
        let mut seen = HashSet::new();
        if let Some(dup) = self.classes.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(invalid(format!("duplicate label {dup:?}")));
        }
        Ok(())
    }

    pub fn len(&self) -> usize { self.classes.len() }

    pub fn is_empty(&self) -> bool { self.classes.is_empty() }

    pub fn classes(&self) -> &[String] { &self.classes }

    pub fn decode(&self, id: usize) -> Result<&str, ModelError> {
        self.classes.get(id).map(String::as_str).ok_or(ModelError::UnknownLabel(id))
    }

    pub fn encode(&self, label: &str) -> Option<usize> { self.classes.iter().position(|c| c == label) }
}

use serde::Deserialize;

use super::{check_row, invalid, ModelError, Transformer};

/// `(x - mean) / scale` per column. A zero scale leaves the centred value as is.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn load(path: &std::path::Path) -> Result<Self, ModelError> {
        let scaler: Self = super::load_artifact(path)?;
        scaler.validate()?;
        Ok(scaler)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.mean.is_empty() { return Err(invalid("scaler has no columns")); }
        if self.mean.len() != self.scale.len() { return Err(invalid("scaler mean and scale differ in length")); }
        if self.mean.iter().chain(&self.scale).any(|v| !v.is_finite()) { return Err(invalid("scaler holds non-finite values")); }
        Ok(())
    }
}

impl Transformer for StandardScaler {
    fn n_features(&self) -> usize { self.mean.len() }

    fn transform(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_row(self.mean.len(), row)?;
        Ok(row.iter().zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| if *s == 0.0 { x - m } else { (x - m) / s })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn centres_and_scales() {
        let s: StandardScaler = serde_json::from_value(json!({"mean": [1.0, 10.0], "scale": [2.0, 0.0]})).unwrap();
        s.validate().unwrap();
        assert_eq!(s.transform(&[5.0, 12.0]).unwrap(), vec![2.0, 2.0]);
        assert!(s.transform(&[1.0]).is_err());
    }
}

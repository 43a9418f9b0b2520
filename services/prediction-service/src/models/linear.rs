use serde::Deserialize;

use super::{check_row, invalid, Classifier, ModelError, Regressor};

fn dot(coef: &[f64], row: &[f64]) -> f64 { coef.iter().zip(row).map(|(c, x)| c * x).sum() }

fn softmax(v: &mut [f64]) {
    if v.is_empty() { return; }
    let max = v.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for x in v.iter_mut() { *x = (*x - max).exp(); sum += *x; }
    if sum > 0.0 { for x in v.iter_mut() { *x /= sum; } }
}

fn sigmoid(z: f64) -> f64 { 1.0 / (1.0 + (-z).exp()) }

#[derive(Debug, Clone, Deserialize)]
pub struct LinearRegressor {
    coef: Vec<f64>,
    intercept: f64,
}

impl LinearRegressor {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.coef.is_empty() { return Err(invalid("linear model has no coefficients")); }
        if !self.intercept.is_finite() || self.coef.iter().any(|c| !c.is_finite()) {
            return Err(invalid("linear model has non-finite coefficients"));
        }
        Ok(())
    }
}

impl Regressor for LinearRegressor {
    fn n_features(&self) -> usize { self.coef.len() }

    fn predict(&self, row: &[f64]) -> Result<f64, ModelError> {
        check_row(self.coef.len(), row)?;
        Ok(dot(&self.coef, row) + self.intercept)
    }
}

/// Multinomial logistic regression. A single coefficient row is the binary
/// case: it scores class 1 and class 0 gets the complement.
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticClassifier {
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
}

impl LogisticClassifier {
    pub fn validate(&self) -> Result<(), ModelError> {
        let width = self.coef.first().map(Vec::len).unwrap_or(0);
        if width == 0 { return Err(invalid("logistic model has no coefficients")); }
        if self.coef.iter().any(|r| r.len() != width) { return Err(invalid("ragged coefficient matrix")); }
        if self.intercept.len() != self.coef.len() { return Err(invalid("intercept count differs from coefficient rows")); }
        if self.coef.iter().flatten().chain(&self.intercept).any(|c| !c.is_finite()) {
            return Err(invalid("logistic model has non-finite coefficients"));
        }
        Ok(())
    }
}

impl Classifier for LogisticClassifier {
    fn n_features(&self) -> usize { self.coef.first().map(Vec::len).unwrap_or(0) }

    fn n_classes(&self) -> usize { if self.coef.len() == 1 { 2 } else { self.coef.len() } }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_row(self.n_features(), row)?;
        let mut logits: Vec<f64> = self.coef.iter().zip(&self.intercept).map(|(c, b)| dot(c, row) + b).collect();
        if logits.len() == 1 {
            let p = sigmoid(logits[0]);
            return Ok(vec![1.0 - p, p]);
        }
        softmax(&mut logits);
        Ok(logits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn softmax_basic() {
        let mut v = vec![1.0, 2.0, 3.0];
        softmax(&mut v);
        let s: f64 = v.iter().sum();
        assert!((s - 1.0).abs() < 1e-12);
        assert!(v[2] > v[1] && v[1] > v[0]);
    }

    #[test]
    fn multinomial_distribution_sums_to_one() {
        let clf: LogisticClassifier = serde_json::from_value(json!({
            "coef": [[1.0, 0.0], [0.0, 1.0], [-1.0, -1.0]],
            "intercept": [0.0, 0.5, 0.0]
        })).unwrap();
        clf.validate().unwrap();
        assert_eq!(clf.n_classes(), 3);
        let p = clf.predict_proba(&[0.2, 1.5]).unwrap();
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(clf.predict(&[0.2, 1.5]).unwrap(), 1);
    }

    #[test]
    fn binary_uses_sigmoid() {
        let clf: LogisticClassifier = serde_json::from_value(json!({"coef": [[2.0]], "intercept": [0.0]})).unwrap();
        clf.validate().unwrap();
        assert_eq!(clf.n_classes(), 2);
        assert_eq!(clf.predict_proba(&[0.0]).unwrap(), vec![0.5, 0.5]);
        assert_eq!(clf.predict(&[1.0]).unwrap(), 1);
    }

    #[test]
    fn ragged_matrix_is_rejected() {
        let clf: LogisticClassifier = serde_json::from_value(json!({"coef": [[1.0, 2.0], [1.0]], "intercept": [0.0, 0.0]})).unwrap();
        assert!(clf.validate().is_err());
    }
}

use serde::Deserialize;

use super::{check_row, invalid, Classifier, ModelError, Regressor};

/// A fitted tree in sklearn's flat `tree_` layout. Leaves have `children_left == -1`;
/// internal nodes send `x[feature] <= threshold` left.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    /// Per node: `[mean]` for regression, class weights for classification.
    value: Vec<Vec<f64>>,
}

impl DecisionTree {
    /// Children must point strictly forward so traversal always terminates.
    pub(crate) fn validate(&self, n_features: usize, width: usize) -> Result<(), ModelError> {
        let n = self.children_left.len();
        if n == 0 { return Err(invalid("tree has no nodes")); }
        if [self.children_right.len(), self.feature.len(), self.threshold.len(), self.value.len()].iter().any(|&len| len != n) {
            return Err(invalid("tree arrays differ in length"));
        }
        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left < 0 {
                let leaf = &self.value[node];
                if leaf.len() != width { return Err(invalid(format!("leaf {node} has {} values, expected {width}", leaf.len()))); }
                if leaf.iter().any(|v| !v.is_finite()) { return Err(invalid(format!("leaf {node} holds a non-finite value"))); }
                continue;
            }
            let forward = |child: i64| child > node as i64 && (child as usize) < n;
            if !forward(left) || !forward(right) { return Err(invalid(format!("node {node} has children out of range"))); }
            let f = self.feature[node];
            if f < 0 || f as usize >= n_features { return Err(invalid(format!("node {node} splits on unknown feature {f}"))); }
            if self.threshold[node].is_nan() { return Err(invalid(format!("node {node} has a NaN threshold"))); }
        }
        Ok(())
    }

    pub(crate) fn leaf(&self, row: &[f64]) -> &[f64] {
        let mut node = 0usize;
        loop {
            let left = self.children_left[node];
            if left < 0 { return &self.value[node]; }
            let f = self.feature[node] as usize;
            node = if row[f] <= self.threshold[node] { left as usize } else { self.children_right[node] as usize };
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RandomForestRegressor {
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForestRegressor {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.trees.is_empty() { return Err(invalid("forest has no trees")); }
        self.trees.iter().try_for_each(|t| t.validate(self.n_features, 1))
    }
}

impl Regressor for RandomForestRegressor {
    fn n_features(&self) -> usize { self.n_features }

    fn predict(&self, row: &[f64]) -> Result<f64, ModelError> {
        check_row(self.n_features, row)?;
        let sum: f64 = self.trees.iter().map(|t| t.leaf(row)[0]).sum();
        Ok(sum / self.trees.len() as f64)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RandomForestClassifier {
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForestClassifier {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.trees.is_empty() { return Err(invalid("forest has no trees")); }
        if self.n_classes == 0 { return Err(invalid("classifier has no classes")); }
        for tree in &self.trees {
            tree.validate(self.n_features, self.n_classes)?;
            if tree.value.iter().flatten().any(|v| *v < 0.0) { return Err(invalid("negative class weight in leaf")); }
        }
        Ok(())
    }
}

impl Classifier for RandomForestClassifier {
    fn n_features(&self) -> usize { self.n_features }
    fn n_classes(&self) -> usize { self.n_classes }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_row(self.n_features, row)?;
        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            let leaf = tree.leaf(row);
            let total: f64 = leaf.iter().sum();
            for (acc, w) in proba.iter_mut().zip(leaf) {
                *acc += if total > 0.0 { w / total } else { 1.0 / self.n_classes as f64 };
            }
        }
        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        Ok(proba)
    }
}

//! Fitted binary classifiers
//!
//! Both variants are exported by the training side as JSON. The forest uses the
//! flattened node arrays of a fitted decision tree (`children_left`,
//! `children_right`, `feature`, `threshold`, `value`), where a node is a leaf
//! when `children_left == -1`.

use serde::Deserialize;

use super::InferenceError;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    RandomForest(RandomForest),
    LogisticRegression(LogisticRegression),
}

impl Classifier {
    pub fn n_features(&self) -> usize {
        match self {
            Classifier::RandomForest(forest) => forest.n_features,
            Classifier::LogisticRegression(model) => model.coef.len(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Classifier::RandomForest(forest) => forest.validate(),
            Classifier::LogisticRegression(model) => model.validate(),
        }
    }

    /// Class-1 probability (0..=1) and hard label for one scaled row
    pub fn predict(&self, x: &[f64]) -> Result<(f64, u8), InferenceError> {
        if x.len() != self.n_features() {
            return Err(InferenceError::FeatureCount {
                expected: self.n_features(),
                found: x.len(),
            });
        }

        Ok(match self {
            Classifier::RandomForest(forest) => forest.predict(x),
            Classifier::LogisticRegression(model) => model.predict(x),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class weights `[class_0, class_1]`
    pub value: Vec<[f64; 2]>,
}

impl RandomForest {
    fn validate(&self) -> Result<(), String> {
        if self.n_features == 0 {
            return Err("forest declares zero features".to_string());
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(())
    }

    fn predict(&self, x: &[f64]) -> (f64, u8) {
        let mut sum = [0.0, 0.0];
        for tree in &self.trees {
            let [p0, p1] = tree.leaf_distribution(x);
            sum[0] += p0;
            sum[1] += p1;
        }

        let n = self.trees.len() as f64;
        let (p0, p1) = (sum[0] / n, sum[1] / n);
        // argmax, ties go to class 0
        let label = if p1 > p0 { 1 } else { 0 };
        (p1, label)
    }
}

impl DecisionTree {
    fn validate(&self, n_features: usize) -> Result<(), String> {
        let n = self.children_left.len();
        if n == 0 {
            return Err("empty tree".to_string());
        }
        if [self.children_right.len(), self.feature.len(), self.threshold.len(), self.value.len()]
            .iter()
            .any(|&len| len != n)
        {
            return Err("node arrays differ in length".to_string());
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == -1 {
                if right != -1 {
                    return Err(format!("node {} has only a right child", node));
                }
                let [w0, w1] = self.value[node];
                if !(w0 >= 0.0 && w1 >= 0.0 && w0 + w1 > 0.0) {
                    return Err(format!("leaf {} has no usable class weights", node));
                }
                continue;
            }

            // Children always follow their parent, which rules out cycles
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(format!("node {} has invalid child {}", node, child));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(format!("node {} splits on invalid feature {}", node, feature));
            }
            if self.threshold[node].is_nan() {
                return Err(format!("node {} has a NaN threshold", node));
            }
        }
        Ok(())
    }

    /// Normalized class distribution of the leaf reached by `x`
    fn leaf_distribution(&self, x: &[f64]) -> [f64; 2] {
        let mut node = 0usize;
        while self.children_left[node] != -1 {
            let feature = self.feature[node] as usize;
            node = if x[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }

        let [w0, w1] = self.value[node];
        let total = w0 + w1;
        [w0 / total, w1 / total]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogisticRegression {
    pub coef: Vec<f64>,
    pub intercept: f64,
}

impl LogisticRegression {
    fn validate(&self) -> Result<(), String> {
        if self.coef.is_empty() {
            return Err("no coefficients".to_string());
        }
        if !self.intercept.is_finite() || self.coef.iter().any(|c| !c.is_finite()) {
            return Err("non-finite coefficient".to_string());
        }
        Ok(())
    }

    fn predict(&self, x: &[f64]) -> (f64, u8) {
        let decision: f64 = self.intercept
            + self.coef.iter().zip(x).map(|(w, v)| w * v).sum::<f64>();
        let probability = 1.0 / (1.0 + (-decision).exp());
        (probability, u8::from(decision > 0.0))
    }
}

//! Standard scaler - per-feature `(x - mean) / scale`

use serde::Deserialize;

use super::features::FeatureVector;
use super::InferenceError;

#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { mean, scale }
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Check the fitted parameters are usable
    pub fn validate(&self) -> Result<(), String> {
        if self.mean.len() != self.scale.len() {
            return Err(format!(
                "mean has {} entries but scale has {}",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if self.mean.iter().chain(&self.scale).any(|v| !v.is_finite()) {
            return Err("non-finite scaler parameter".to_string());
        }
        Ok(())
    }

    pub fn transform(&self, input: &FeatureVector) -> Result<FeatureVector, InferenceError> {
        if input.len() != self.n_features() {
            return Err(InferenceError::FeatureCount {
                expected: self.n_features(),
                found: input.len(),
            });
        }

        let scaled = input
            .as_slice()
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                // Constant features were fitted with zero variance
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect();

        Ok(FeatureVector::new(scaled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform() {
        let scaler = StandardScaler::new(vec![10.0, 0.0, 5.0], vec![2.0, 1.0, 0.0]);
        let out = scaler.transform(&FeatureVector::new(vec![14.0, -3.0, 7.0])).unwrap();
        assert_eq!(out.as_slice(), &[2.0, -3.0, 2.0]);
    }

    #[test]
    fn test_feature_count_mismatch() {
        let scaler = StandardScaler::new(vec![0.0, 0.0], vec![1.0, 1.0]);
        let err = scaler.transform(&FeatureVector::new(vec![1.0])).unwrap_err();
        assert!(matches!(err, InferenceError::FeatureCount { expected: 2, found: 1 }));
    }

    #[test]
    fn test_validate() {
        assert!(StandardScaler::new(vec![0.0], vec![1.0]).validate().is_ok());
        assert!(StandardScaler::new(vec![0.0, 1.0], vec![1.0]).validate().is_err());
        assert!(StandardScaler::new(vec![f64::NAN], vec![1.0]).validate().is_err());
    }

    #[test]
    fn test_deserialize() {
        let scaler: StandardScaler =
            serde_json::from_str(r#"{"mean": [1.0, 2.0], "scale": [0.5, 4.0]}"#).unwrap();
        assert_eq!(scaler.n_features(), 2);
    }
}

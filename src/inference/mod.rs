//! Prediction engine
//!
//! Align → scale → classify. Everything here is pure and read-only once the
//! artifacts are loaded, so a single [`Predictor`] is shared by all requests.

pub mod classifier;
pub mod evaluation;
pub mod features;
pub mod scaler;

use crate::models::{CustomerRecord, PredictionResult};

pub use classifier::Classifier;
pub use features::{align, FeatureSchema, FeatureVector};
pub use scaler::StandardScaler;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("column `{column}` must be numeric, found {found}")]
    TypeMismatch { column: String, found: &'static str },

    #[error("expected {expected} features, got {found}")]
    FeatureCount { expected: usize, found: usize },

    #[error("invalid feature schema: {0}")]
    InvalidSchema(String),
}

/// Fitted scaler and classifier bound to their feature schema
#[derive(Debug, Clone)]
pub struct Predictor {
    schema: FeatureSchema,
    scaler: StandardScaler,
    classifier: Classifier,
}

impl Predictor {
    /// Both artifacts must have been fitted on exactly the schema's columns
    pub fn new(
        schema: FeatureSchema,
        scaler: StandardScaler,
        classifier: Classifier,
    ) -> Result<Self, InferenceError> {
        for found in [scaler.n_features(), classifier.n_features()] {
            if found != schema.len() {
                return Err(InferenceError::FeatureCount {
                    expected: schema.len(),
                    found,
                });
            }
        }

        Ok(Self { schema, scaler, classifier })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Score one customer: churn probability in percent and hard label
    pub fn predict(&self, record: &CustomerRecord) -> Result<PredictionResult, InferenceError> {
        let features = align(record, &self.schema)?;
        let (probability, label) = self.predict_vector(&features)?;

        Ok(PredictionResult {
            customer_id: record.customer_id,
            probability,
            label,
        })
    }

    /// Scale an aligned vector and query the classifier
    pub fn predict_vector(&self, features: &FeatureVector) -> Result<(f64, u8), InferenceError> {
        let scaled = self.scaler.transform(features)?;
        let (p, label) = self.classifier.predict(scaled.as_slice())?;
        Ok((p * 100.0, label))
    }
}

//! Prediction model and API payloads

use serde::Serialize;

/// Outcome of scoring one customer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionResult {
    pub customer_id: i64,
    /// Churn probability in percent (0..=100)
    pub probability: f64,
    pub label: u8,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    #[serde(rename = "Customer ID")]
    pub customer_id: i64,
    #[serde(rename = "Churn Probability")]
    pub churn_probability: f64,
}

impl From<PredictionResult> for PredictResponse {
    fn from(result: PredictionResult) -> Self {
        Self {
            customer_id: result.customer_id,
            churn_probability: result.probability,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    #[serde(rename = "Message")]
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ExpectedColumnsResponse {
    pub expected_columns: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomerIdsResponse {
    pub customer_ids: Vec<i64>,
}

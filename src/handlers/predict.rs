//! Prediction handler

use axum::{extract::{State, Path}, Json};

use crate::{AppState, AppResult};
use crate::alerts::AlertOutcome;
use crate::models::PredictResponse;
use super::customers::customer_not_found;

/// Score one customer, update metrics and alert on high churn risk.
///
/// Alert delivery failures are logged; the probability is returned regardless.
pub async fn predict(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
) -> AppResult<Json<PredictResponse>> {
    let record = state.customers
        .find(customer_id)
        .ok_or_else(customer_not_found)?;

    let result = state.predictor.predict(record)?;

    state.metrics.record_prediction(customer_id, result.probability);
    tracing::debug!(
        customer_id,
        probability = result.probability,
        label = result.label,
        "Prediction served"
    );

    match state.alerts.maybe_alert(customer_id, result.probability).await {
        Ok(AlertOutcome::Sent { .. }) => state.metrics.record_alert_sent(),
        Ok(AlertOutcome::Suppressed) => {}
        Err(e) => {
            state.metrics.record_alert_failed();
            tracing::error!(
                customer_id,
                probability = result.probability,
                error = %e,
                "Failed to deliver churn alert"
            );
        }
    }

    Ok(Json(result.into()))
}

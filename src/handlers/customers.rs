//! Customer and schema handlers

use axum::{extract::{State, Path}, Json};

use crate::{AppState, AppResult, AppError};
use crate::models::{CustomerIdsResponse, CustomerRecord, ExpectedColumnsResponse};

/// Feature names in the order the model consumes them
pub async fn expected_columns(
    State(state): State<AppState>,
) -> Json<ExpectedColumnsResponse> {
    Json(ExpectedColumnsResponse {
        expected_columns: state.predictor.schema().names().to_vec(),
    })
}

/// All customer keys, in dataset order
pub async fn customer_ids(
    State(state): State<AppState>,
) -> Json<CustomerIdsResponse> {
    Json(CustomerIdsResponse {
        customer_ids: state.customers.customer_ids().to_vec(),
    })
}

/// Raw record of one customer
pub async fn customer_data(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
) -> AppResult<Json<CustomerRecord>> {
    let record = state.customers
        .find(customer_id)
        .ok_or_else(customer_not_found)?;

    Ok(Json(record.clone()))
}

pub(crate) fn customer_not_found() -> AppError {
    AppError::NotFound("Customer ID not found".to_string())
}

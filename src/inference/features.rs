//! Feature alignment
//!
//! Maps an arbitrary customer row onto the exact, ordered feature vector the
//! classifier was fitted on.

use std::collections::HashSet;

use crate::models::{CustomerRecord, KEY_COLUMN, LABEL_COLUMN};
use super::InferenceError;

/// Columns never fed to the model, even when the schema names them
pub const NON_FEATURE_COLUMNS: [&str; 4] = [LABEL_COLUMN, "RowNumber", KEY_COLUMN, "Surname"];

/// Ordered, unique feature names expected by scaler and classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Result<Self, InferenceError> {
        if names.is_empty() {
            return Err(InferenceError::InvalidSchema("feature list is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for name in &names {
            if name.is_empty() {
                return Err(InferenceError::InvalidSchema("empty feature name".to_string()));
            }
            if !seen.insert(name.as_str()) {
                return Err(InferenceError::InvalidSchema(format!("duplicate feature `{}`", name)));
            }
        }

        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

/// Numeric features in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Build the classifier input for `record`.
///
/// Non-feature columns are ignored, schema columns absent from the row are
/// zero-filled, and any column outside the schema is dropped. A schema column
/// holding text, an empty cell, NaN or an infinity is a type error.
pub fn align(record: &CustomerRecord, schema: &FeatureSchema) -> Result<FeatureVector, InferenceError> {
    let mut values = Vec::with_capacity(schema.len());
    let mut zero_filled = Vec::new();

    for name in schema.names() {
        let cell = if NON_FEATURE_COLUMNS.contains(&name.as_str()) {
            None
        } else {
            record.get(name)
        };

        match cell {
            Some(value) => {
                let number = value.as_f64().ok_or_else(|| InferenceError::TypeMismatch {
                    column: name.clone(),
                    found: value.type_name(),
                })?;
                if !number.is_finite() {
                    return Err(InferenceError::TypeMismatch {
                        column: name.clone(),
                        found: "non-finite float",
                    });
                }
                values.push(number);
            }
            None => {
                zero_filled.push(name.as_str());
                values.push(0.0);
            }
        }
    }

    if !zero_filled.is_empty() {
        tracing::debug!(
            customer_id = record.customer_id,
            columns = ?zero_filled,
            "Zero-filled features missing from record"
        );
    }

    Ok(FeatureVector(values))
}

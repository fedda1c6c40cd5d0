//! Customer record model

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Column holding the unique customer key
pub const KEY_COLUMN: &str = "CustomerId";

/// Ground-truth churn label, only used by the startup evaluation
pub const LABEL_COLUMN: &str = "Exited";

/// A single cell of the customer table
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
}

impl FieldValue {
    /// Numeric view of the cell, `None` for text and empty cells
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Text(_) | FieldValue::Null => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Integer(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "text",
            FieldValue::Null => "null",
        }
    }
}

/// One row of the customer table, columns kept in source order
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    pub customer_id: i64,
    fields: Vec<(String, FieldValue)>,
}

impl CustomerRecord {
    pub fn new(customer_id: i64, fields: Vec<(String, FieldValue)>) -> Self {
        Self { customer_id, fields }
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Churn label (0 or 1) if the row carries a usable one
    pub fn label(&self) -> Option<u8> {
        match self.get(LABEL_COLUMN)?.as_f64()? {
            v if v == 0.0 => Some(0),
            v if v == 1.0 => Some(1),
            _ => None,
        }
    }
}

impl Serialize for CustomerRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CustomerRecord {
        CustomerRecord::new(
            15634602,
            vec![
                ("RowNumber".to_string(), FieldValue::Integer(1)),
                (KEY_COLUMN.to_string(), FieldValue::Integer(15634602)),
                ("Surname".to_string(), FieldValue::Text("Hargrave".to_string())),
                ("Balance".to_string(), FieldValue::Float(0.0)),
                (LABEL_COLUMN.to_string(), FieldValue::Integer(1)),
            ],
        )
    }

    #[test]
    fn test_serializes_flat_in_column_order() {
        let json = serde_json::to_string(&record()).unwrap();
        assert_eq!(
            json,
            r#"{"RowNumber":1,"CustomerId":15634602,"Surname":"Hargrave","Balance":0.0,"Exited":1}"#
        );
    }

    #[test]
    fn test_label() {
        assert_eq!(record().label(), Some(1));

        let unlabeled = CustomerRecord::new(
            1,
            vec![(LABEL_COLUMN.to_string(), FieldValue::Text("yes".to_string()))],
        );
        assert_eq!(unlabeled.label(), None);
    }

    #[test]
    fn test_null_serializes_as_json_null() {
        let value = serde_json::to_value(FieldValue::Null).unwrap();
        assert!(value.is_null());
        assert_eq!(FieldValue::Null.as_f64(), None);
    }
}

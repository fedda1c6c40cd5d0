//! Customer dataset - CSV loading and keyed lookup

use std::collections::HashMap;
use std::io;
use std::path::Path;

use crate::models::{CustomerRecord, FieldValue, KEY_COLUMN};

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to read dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset has no `{0}` column")]
    MissingKeyColumn(&'static str),

    #[error("row {row}: invalid customer key `{value}`")]
    InvalidKey { row: usize, value: String },
}

/// Inferred type of a whole column
#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnKind {
    Integer,
    Float,
    Text,
}

/// In-memory customer table indexed by key
#[derive(Debug, Default)]
pub struct CustomerStore {
    records: Vec<CustomerRecord>,
    index: HashMap<i64, usize>,
    ids: Vec<i64>,
}

impl CustomerStore {
    /// Load the dataset from a CSV file with a header row
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let reader = csv::Reader::from_path(path)?;
        Self::from_reader(reader)
    }

    pub fn from_reader<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self, DataError> {
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let key_pos = headers
            .iter()
            .position(|h| h == KEY_COLUMN)
            .ok_or(DataError::MissingKeyColumn(KEY_COLUMN))?;

        let rows = reader
            .records()
            .collect::<Result<Vec<csv::StringRecord>, _>>()?;

        let kinds: Vec<ColumnKind> = (0..headers.len())
            .map(|col| infer_kind(rows.iter().filter_map(|row| row.get(col))))
            .collect();

        let mut store = CustomerStore::default();

        for (row_num, row) in rows.iter().enumerate() {
            let raw_key = row.get(key_pos).unwrap_or_default().trim();
            let customer_id: i64 = raw_key.parse().map_err(|_| DataError::InvalidKey {
                row: row_num + 1,
                value: raw_key.to_string(),
            })?;

            let fields = headers
                .iter()
                .zip(&kinds)
                .enumerate()
                .map(|(col, (name, kind))| {
                    (name.clone(), parse_cell(row.get(col).unwrap_or_default(), *kind))
                })
                .collect();

            if !store.index.contains_key(&customer_id) {
                store.index.insert(customer_id, store.records.len());
                store.ids.push(customer_id);
            }
            store.records.push(CustomerRecord::new(customer_id, fields));
        }

        tracing::info!(
            "Customer dataset loaded: {} rows, {} unique customers, {} columns",
            store.records.len(),
            store.ids.len(),
            headers.len()
        );

        Ok(store)
    }

    /// First row with the given key
    pub fn find(&self, customer_id: i64) -> Option<&CustomerRecord> {
        self.index.get(&customer_id).map(|&pos| &self.records[pos])
    }

    /// Unique keys in file order
    pub fn customer_ids(&self) -> &[i64] {
        &self.ids
    }

    /// Every row, in file order
    pub fn records(&self) -> &[CustomerRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind = ColumnKind::Integer;
    for cell in cells.map(str::trim).filter(|c| !c.is_empty()) {
        if kind == ColumnKind::Integer && cell.parse::<i64>().is_err() {
            kind = ColumnKind::Float;
        }
        if kind == ColumnKind::Float && cell.parse::<f64>().is_err() {
            return ColumnKind::Text;
        }
    }
    kind
}

fn parse_cell(cell: &str, kind: ColumnKind) -> FieldValue {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return FieldValue::Null;
    }
    match kind {
        ColumnKind::Integer => trimmed
            .parse()
            .map(FieldValue::Integer)
            .unwrap_or_else(|_| FieldValue::Text(cell.to_string())),
        ColumnKind::Float => trimmed
            .parse()
            .map(FieldValue::Float)
            .unwrap_or_else(|_| FieldValue::Text(cell.to_string())),
        ColumnKind::Text => FieldValue::Text(cell.to_string()),
    }
}

//! Held-out evaluation of the loaded model

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::models::CustomerRecord;
use super::Predictor;

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("held-out split has no scorable rows ({skipped} skipped)")]
    NoScorableRows { skipped: usize },
}

/// Binary confusion matrix, positive class = churned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub tn: u64,
    pub fp: u64,
    pub fn_: u64,
    pub tp: u64,
}

impl ConfusionMatrix {
    pub fn record(&mut self, actual: u8, predicted: u8) {
        match (actual, predicted) {
            (0, 0) => self.tn += 1,
            (0, _) => self.fp += 1,
            (_, 0) => self.fn_ += 1,
            _ => self.tp += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.tn + self.fp + self.fn_ + self.tp
    }

    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => (self.tn + self.tp) as f64 / total as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
    /// Held-out rows without a usable label or feature row
    pub skipped: usize,
}

/// Indices of the held-out rows: a seeded shuffle, first `ceil(n * test_size)`
pub fn holdout_indices(n: usize, test_size: f64, seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n as f64) * test_size).ceil() as usize;
    indices.truncate(n_test.min(n));
    indices
}

/// Score the held-out split of `records` against their ground-truth labels
pub fn evaluate(
    predictor: &Predictor,
    records: &[CustomerRecord],
    test_size: f64,
    seed: u64,
) -> Result<Evaluation, EvaluationError> {
    let mut confusion = ConfusionMatrix::default();
    let mut skipped = 0usize;

    for idx in holdout_indices(records.len(), test_size, seed) {
        let record = &records[idx];
        let Some(actual) = record.label() else {
            skipped += 1;
            continue;
        };

        match predictor.predict(record) {
            Ok(prediction) => confusion.record(actual, prediction.label),
            Err(e) => {
                tracing::debug!(customer_id = record.customer_id, error = %e, "Skipping row in evaluation");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        tracing::warn!("{} held-out rows skipped during evaluation", skipped);
    }

    if confusion.total() == 0 {
        return Err(EvaluationError::NoScorableRows { skipped });
    }

    Ok(Evaluation {
        accuracy: confusion.accuracy(),
        confusion,
        skipped,
    })
}

//! Prometheus metrics registry and exporter
//!
//! A single [`Metrics`] handle is created at startup and injected into both the
//! API state and the metrics listener. Counters and gauges are atomics, the
//! per-customer gauge lives behind a lock.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::header, response::IntoResponse, routing::get, Router};
use parking_lot::RwLock;

use crate::config::EvaluationConfig;
use crate::inference::evaluation::{self, ConfusionMatrix, Evaluation};
use crate::inference::Predictor;
use crate::models::CustomerRecord;

const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// `f64` gauge stored as raw bits
#[derive(Debug, Default)]
struct Gauge(AtomicU64);

impl Gauge {
    fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Default)]
pub struct Metrics {
    model_accuracy: Gauge,
    confusion_tn: AtomicU64,
    confusion_fp: AtomicU64,
    confusion_fn: AtomicU64,
    confusion_tp: AtomicU64,
    total_predictions: AtomicU64,
    alerts_sent: AtomicU64,
    alerts_failed: AtomicU64,
    churn_probability: RwLock<BTreeMap<i64, f64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the startup evaluation
    pub fn set_evaluation(&self, evaluation: &Evaluation) {
        let cm = evaluation.confusion;
        self.model_accuracy.set(evaluation.accuracy);
        self.confusion_tn.store(cm.tn, Ordering::Relaxed);
        self.confusion_fp.store(cm.fp, Ordering::Relaxed);
        self.confusion_fn.store(cm.fn_, Ordering::Relaxed);
        self.confusion_tp.store(cm.tp, Ordering::Relaxed);
    }

    /// Count one prediction and remember the customer's latest probability
    pub fn record_prediction(&self, customer_id: i64, probability: f64) {
        self.total_predictions.fetch_add(1, Ordering::Relaxed);
        self.churn_probability.write().insert(customer_id, probability);
    }

    pub fn record_alert_sent(&self) {
        self.alerts_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_alert_failed(&self) {
        self.alerts_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_predictions(&self) -> u64 {
        self.total_predictions.load(Ordering::Relaxed)
    }

    pub fn accuracy(&self) -> f64 {
        self.model_accuracy.get()
    }

    pub fn confusion(&self) -> ConfusionMatrix {
        ConfusionMatrix {
            tn: self.confusion_tn.load(Ordering::Relaxed),
            fp: self.confusion_fp.load(Ordering::Relaxed),
            fn_: self.confusion_fn.load(Ordering::Relaxed),
            tp: self.confusion_tp.load(Ordering::Relaxed),
        }
    }

    /// Text exposition format
    pub fn render(&self) -> String {
        let mut out = String::new();
        let cm = self.confusion();

        metric(&mut out, "model_accuracy", "Accuracy of the churn model", "gauge", self.accuracy());
        metric(&mut out, "confusion_matrix_tn", "True Negatives in the confusion matrix", "gauge", cm.tn);
        metric(&mut out, "confusion_matrix_fp", "False Positives in the confusion matrix", "gauge", cm.fp);
        metric(&mut out, "confusion_matrix_fn", "False Negatives in the confusion matrix", "gauge", cm.fn_);
        metric(&mut out, "confusion_matrix_tp", "True Positives in the confusion matrix", "gauge", cm.tp);
        metric(
            &mut out,
            "total_predictions_total",
            "Total number of predictions made by users",
            "counter",
            self.total_predictions(),
        );
        metric(
            &mut out,
            "alerts_sent_total",
            "Churn alerts accepted by the SMS provider",
            "counter",
            self.alerts_sent.load(Ordering::Relaxed),
        );
        metric(
            &mut out,
            "alerts_failed_total",
            "Churn alerts that could not be delivered",
            "counter",
            self.alerts_failed.load(Ordering::Relaxed),
        );

        let _ = writeln!(out, "# HELP churn_probability Churn probability of the customer");
        let _ = writeln!(out, "# TYPE churn_probability gauge");
        for (customer_id, probability) in self.churn_probability.read().iter() {
            let _ = writeln!(out, "churn_probability{{customer_id=\"{}\"}} {}", customer_id, probability);
        }

        out
    }
}

fn metric(out: &mut String, name: &str, help: &str, kind: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
    let _ = writeln!(out, "{} {}", name, value);
}

/// Score the held-out split once and publish accuracy and confusion counts.
///
/// Failure leaves the gauges at zero; serving does not depend on it.
pub fn init_metrics(
    metrics: &Metrics,
    predictor: &Predictor,
    records: &[CustomerRecord],
    config: &EvaluationConfig,
) {
    match evaluation::evaluate(predictor, records, config.test_size, config.seed) {
        Ok(result) => {
            let cm = result.confusion;
            tracing::info!(
                "Calculated accuracy: {:.4} (tn={} fp={} fn={} tp={}, {} scored, {} skipped)",
                result.accuracy,
                cm.tn,
                cm.fp,
                cm.fn_,
                cm.tp,
                cm.total(),
                result.skipped
            );
            metrics.set_evaluation(&result);
        }
        Err(e) => {
            tracing::error!("Model evaluation failed, accuracy gauges left at zero: {}", e);
        }
    }
}

/// Router for the dedicated metrics listener
pub fn router(metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/metrics", get(scrape))
        .with_state(metrics)
}

async fn scrape(State(metrics): State<Arc<Metrics>>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], metrics.render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use crate::inference::tests::predictor;
    use crate::models::FieldValue;

    #[test]
    fn test_record_prediction() {
        let metrics = Metrics::new();
        metrics.record_prediction(15634602, 12.5);
        metrics.record_prediction(15634602, 40.0);
        metrics.record_prediction(15647311, 90.0);

        assert_eq!(metrics.total_predictions(), 3);
        let text = metrics.render();
        assert!(text.contains("churn_probability{customer_id=\"15634602\"} 40\n"));
        assert!(text.contains("churn_probability{customer_id=\"15647311\"} 90\n"));
        assert!(!text.contains("12.5"));
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let metrics = Arc::new(Metrics::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let metrics = metrics.clone();
                std::thread::spawn(move || {
                    for i in 0..1000 {
                        metrics.record_prediction(t * 1000 + i, 1.0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.total_predictions(), 8000);
    }

    #[test]
    fn test_render_exposition() {
        let metrics = Metrics::new();
        metrics.set_evaluation(&Evaluation {
            accuracy: 0.75,
            confusion: ConfusionMatrix { tn: 5, fp: 1, fn_: 1, tp: 1 },
            skipped: 0,
        });
        metrics.record_prediction(42, 81.5);

        let text = metrics.render();
        assert!(text.contains("# TYPE model_accuracy gauge\nmodel_accuracy 0.75\n"));
        assert!(text.contains("confusion_matrix_tn 5\n"));
        assert!(text.contains("# TYPE total_predictions_total counter\ntotal_predictions_total 1\n"));
        assert!(text.contains("churn_probability{customer_id=\"42\"} 81.5\n"));
    }

    #[test]
    fn test_init_metrics_from_holdout() {
        let records: Vec<CustomerRecord> = (0..50)
            .map(|i| {
                CustomerRecord::new(
                    i,
                    vec![
                        ("Age".to_string(), FieldValue::Integer(30 + i % 20)),
                        ("Exited".to_string(), FieldValue::Integer(i64::from(i % 20 >= 10))),
                    ],
                )
            })
            .collect();
        let config = EvaluationConfig { test_size: 0.2, seed: 0 };

        let first = Metrics::new();
        init_metrics(&first, &predictor(), &records, &config);
        let second = Metrics::new();
        init_metrics(&second, &predictor(), &records, &config);

        assert_eq!(first.confusion().total(), 10);
        assert_eq!(first.confusion(), second.confusion());
        assert_eq!(first.accuracy(), second.accuracy());
    }

    #[test]
    fn test_init_metrics_without_labels_keeps_zero() {
        let records = vec![CustomerRecord::new(1, vec![])];
        let metrics = Metrics::new();
        init_metrics(&metrics, &predictor(), &records, &EvaluationConfig { test_size: 0.5, seed: 0 });
        assert_eq!(metrics.confusion(), ConfusionMatrix::default());
        assert_eq!(metrics.accuracy(), 0.0);
    }

    #[tokio::test]
    async fn test_scrape_endpoint() {
        let metrics = Arc::new(Metrics::new());
        metrics.record_prediction(1, 5.0);

        let response = router(metrics)
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], CONTENT_TYPE);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8(body.to_vec()).unwrap().contains("total_predictions_total 1"));
    }
}

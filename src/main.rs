//! Churn Prediction API
//!
//! Serves a pre-trained churn classifier over HTTP, exports Prometheus
//! metrics on a separate port and sends an SMS alert for high-risk customers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        CHURN API                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌──────────────────────┐   ┌─────────────┐  │
//! │  │  API      │──▶│  Predictor           │   │  Metrics    │  │
//! │  │  (Axum)   │   │  align→scale→classify│   │  /metrics   │  │
//! │  └─────┬─────┘   └──────────────────────┘   └──────▲──────┘  │
//! │        │                                           │         │
//! │        ├──────────────── record_prediction ────────┘         │
//! │        ▼                                                     │
//! │  ┌───────────┐        ┌──────────────┐                       │
//! │  │  Alerts   │───────▶│  Twilio SMS  │                       │
//! │  └───────────┘        └──────────────┘                       │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod alerts;
mod artifacts;
mod config;
mod data;
mod error;
mod handlers;
mod inference;
mod metrics;
mod models;


use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{Router, routing::get};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use validator::Validate;

use crate::alerts::AlertGateway;
use crate::artifacts::ArtifactPaths;
use crate::data::CustomerStore;
use crate::inference::Predictor;
use crate::metrics::Metrics;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    init_tracing(&config);
    config.validate().context("Invalid configuration")?;

    tracing::info!("Churn API starting...");

    // Artifacts and dataset are hard startup dependencies
    let predictor = artifacts::load(&ArtifactPaths {
        model: PathBuf::from(&config.model_path),
        scaler: PathBuf::from(&config.scaler_path),
        features: PathBuf::from(&config.features_path),
    })
    .context("Failed to load model artifacts")?;

    let customers = CustomerStore::open(&config.data_path)
        .with_context(|| format!("Failed to load dataset {}", config.data_path))?;
    if customers.is_empty() {
        tracing::warn!("Dataset {} has no rows", config.data_path);
    }

    let metrics = Arc::new(Metrics::new());
    metrics::init_metrics(&metrics, &predictor, customers.records(), &config.evaluation);

    let alerts = AlertGateway::from_config(&config.alert);
    tracing::info!("Alert threshold: {:.2}%", alerts.threshold());

    let state = AppState {
        predictor: Arc::new(predictor),
        customers: Arc::new(customers),
        metrics: metrics.clone(),
        alerts: Arc::new(alerts),
    };

    // Metrics listener
    let metrics_listener = tokio::net::TcpListener::bind((config.host.as_str(), config.metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", config.metrics_port))?;
    tracing::info!("Metrics exposed on http://{}/metrics", metrics_listener.local_addr()?);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(metrics_listener, metrics::router(metrics)).await {
            tracing::error!("Metrics server stopped: {}", e);
        }
    });

    // API listener
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind API port {}", config.port))?;
    tracing::info!("🚀 Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server error")?;

    tracing::info!("Churn API stopped");
    Ok(())
}

fn init_tracing(config: &config::Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "churn_api=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logs() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub customers: Arc<CustomerStore>,
    pub metrics: Arc<Metrics>,
    pub alerts: Arc<AlertGateway>,
}

/// Create the API router
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::check))
        .route("/expected_columns/", get(handlers::customers::expected_columns))
        .route("/customer_ids/", get(handlers::customers::customer_ids))
        .route("/customer_data/:customer_id", get(handlers::customers::customer_data))
        .route("/predict/:customer_id", get(handlers::predict::predict))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Churn alerting - SMS when a prediction crosses the risk threshold

pub mod twilio;

use std::sync::Arc;
use std::time::Duration;

use crate::config::AlertConfig;

pub use twilio::TwilioSender;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("SMS provider not configured")]
    NotConfigured,

    #[error("network error: {0}")]
    Network(String),

    #[error("provider rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("provider error ({0})")]
    Server(u16),

    #[error("unexpected provider response: {0}")]
    Parse(String),
}

impl ProviderError {
    /// Whether another attempt may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Network(_) | ProviderError::Server(_) => true,
            ProviderError::Rejected { status, .. } => *status == 429,
            ProviderError::NotConfigured | ProviderError::Parse(_) => false,
        }
    }
}

/// Outbound SMS channel
#[axum::async_trait]
pub trait SmsSender: Send + Sync {
    /// Submit one message, returning the provider's message identifier
    async fn send(&self, body: &str) -> Result<String, ProviderError>;
}

/// Stand-in used when no provider credentials are configured
pub struct UnconfiguredSender;

#[axum::async_trait]
impl SmsSender for UnconfiguredSender {
    async fn send(&self, _body: &str) -> Result<String, ProviderError> {
        Err(ProviderError::NotConfigured)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlertOutcome {
    Sent { message_id: String },
    Suppressed,
}

/// Threshold policy plus delivery with bounded retries
pub struct AlertGateway {
    sender: Arc<dyn SmsSender>,
    threshold: f64,
    max_retries: u32,
    backoff: Duration,
}

impl AlertGateway {
    pub fn new(sender: Arc<dyn SmsSender>, config: &AlertConfig) -> Self {
        Self {
            sender,
            threshold: config.alert_threshold,
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Build the gateway from configuration, Twilio when fully configured
    pub fn from_config(config: &AlertConfig) -> Self {
        let sender: Arc<dyn SmsSender> = match config.provider_settings() {
            Some(settings) => {
                tracing::info!("SMS alerts enabled, recipient {}", settings.recipient);
                Arc::new(TwilioSender::new(
                    settings,
                    &config.api_base,
                    Duration::from_secs(config.timeout_seconds),
                ))
            }
            None => {
                tracing::warn!("SMS provider not configured, churn alerts will not be delivered");
                Arc::new(UnconfiguredSender)
            }
        };
        Self::new(sender, config)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Alert iff `probability` is strictly above the threshold
    pub fn should_alert(&self, probability: f64) -> bool {
        probability > self.threshold
    }

    pub async fn maybe_alert(
        &self,
        customer_id: i64,
        probability: f64,
    ) -> Result<AlertOutcome, ProviderError> {
        if !self.should_alert(probability) {
            return Ok(AlertOutcome::Suppressed);
        }

        let body = message(customer_id, probability);
        let message_id = self.send_with_retry(&body).await?;
        tracing::info!(customer_id, probability, sid = %message_id, "SMS sent");

        Ok(AlertOutcome::Sent { message_id })
    }

    async fn send_with_retry(&self, body: &str) -> Result<String, ProviderError> {
        let mut delay = self.backoff;
        let mut attempt = 0;

        loop {
            match self.sender.send(body).await {
                Ok(id) => return Ok(id),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "SMS delivery failed ({}), retry {}/{} in {:?}",
                        e,
                        attempt,
                        self.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// One-line alert text
pub fn message(customer_id: i64, probability: f64) -> String {
    format!(
        "Alert: Customer ID {} has a churn probability of {:.2}%.",
        customer_id, probability
    )
}

//! Configuration module

use std::env;
use std::str::FromStr;

use validator::Validate;

/// Application configuration
#[derive(Debug, Clone, Validate)]
pub struct Config {
    /// Bind address for the API listener
    #[validate(length(min = 1))]
    pub host: String,

    /// API port
    pub port: u16,

    /// Port of the separate metrics listener
    pub metrics_port: u16,

    /// Customer dataset (CSV)
    #[validate(length(min = 1))]
    pub data_path: String,

    /// Fitted classifier artifact
    #[validate(length(min = 1))]
    pub model_path: String,

    /// Fitted scaler artifact
    #[validate(length(min = 1))]
    pub scaler_path: String,

    /// Ordered feature names artifact
    #[validate(length(min = 1))]
    pub features_path: String,

    /// Log output format (pretty, json)
    pub log_format: String,

    #[validate(nested)]
    pub evaluation: EvaluationConfig,

    #[validate(nested)]
    pub alert: AlertConfig,
}

/// Startup evaluation (held-out split) settings
#[derive(Debug, Clone, Validate)]
pub struct EvaluationConfig {
    /// Fraction of rows held out for scoring
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub test_size: f64,

    /// Shuffle seed
    pub seed: u64,
}

/// SMS alerting settings
#[derive(Debug, Clone, Validate)]
pub struct AlertConfig {
    #[validate(length(min = 1))]
    pub provider_account_id: Option<String>,

    #[validate(length(min = 1))]
    pub provider_auth_token: Option<String>,

    /// Sender phone number
    #[validate(length(min = 1))]
    pub sender_identity: Option<String>,

    /// Phone number receiving the alerts
    #[validate(length(min = 1))]
    pub alert_recipient: Option<String>,

    /// Churn probability (percent) above which an alert is sent
    #[validate(range(min = 0.0, max = 100.0))]
    pub alert_threshold: f64,

    /// Retries after the first failed attempt
    #[validate(range(max = 10))]
    pub max_retries: u32,

    /// Initial backoff between attempts, doubled on each retry
    #[validate(range(max = 60_000))]
    pub retry_backoff_ms: u64,

    /// Provider REST API base URL
    #[validate(length(min = 1))]
    pub api_base: String,

    /// Provider HTTP timeout
    #[validate(range(min = 1))]
    pub timeout_seconds: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parsed("API_PORT", 8007),
            metrics_port: parsed("METRICS_PORT", 8006),

            data_path: env::var("DATA_PATH")
                .unwrap_or_else(|_| "Churn_Modelling.csv".to_string()),
            model_path: env::var("MODEL_PATH")
                .unwrap_or_else(|_| "artifacts/churn_model.json".to_string()),
            scaler_path: env::var("SCALER_PATH")
                .unwrap_or_else(|_| "artifacts/scaler.json".to_string()),
            features_path: env::var("FEATURES_PATH")
                .unwrap_or_else(|_| "artifacts/model_features.json".to_string()),

            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),

            evaluation: EvaluationConfig {
                test_size: parsed("EVAL_TEST_SIZE", 0.2),
                seed: parsed("EVAL_SEED", 0),
            },

            alert: AlertConfig {
                provider_account_id: env::var("TWILIO_ACCOUNT_SID").ok(),
                provider_auth_token: env::var("TWILIO_AUTH_TOKEN").ok(),
                sender_identity: env::var("TWILIO_FROM_NUMBER").ok(),
                alert_recipient: env::var("ALERT_TO_NUMBER").ok(),
                alert_threshold: parsed("ALERT_THRESHOLD", 80.0),
                max_retries: parsed("ALERT_MAX_RETRIES", 3),
                retry_backoff_ms: parsed("ALERT_RETRY_BACKOFF_MS", 500),
                api_base: env::var("TWILIO_API_BASE")
                    .unwrap_or_else(|_| "https://api.twilio.com".to_string()),
                timeout_seconds: parsed("PROVIDER_TIMEOUT_SECONDS", 10),
            },
        }
    }

    /// Whether logs should be emitted as JSON lines
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

impl AlertConfig {
    /// Provider credentials and both phone numbers, when all are set
    pub fn provider_settings(&self) -> Option<ProviderSettings> {
        Some(ProviderSettings {
            account_id: self.provider_account_id.clone()?,
            auth_token: self.provider_auth_token.clone()?,
            sender: self.sender_identity.clone()?,
            recipient: self.alert_recipient.clone()?,
        })
    }
}

/// Fully specified provider account, sender and recipient
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub account_id: String,
    pub auth_token: String,
    pub sender: String,
    pub recipient: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            provider_account_id: None,
            provider_auth_token: None,
            sender_identity: None,
            alert_recipient: None,
            alert_threshold: 80.0,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_base: "https://api.twilio.com".to_string(),
            timeout_seconds: 10,
        }
    }
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("{}={:?} is not a valid value, using the default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8007,
            metrics_port: 8006,
            data_path: "data.csv".to_string(),
            model_path: "model.json".to_string(),
            scaler_path: "scaler.json".to_string(),
            features_path: "features.json".to_string(),
            log_format: "pretty".to_string(),
            evaluation: EvaluationConfig { test_size: 0.2, seed: 0 },
            alert: AlertConfig::default(),
        }
    }

    #[test]
    fn test_defaults_validate() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let mut config = base();
        config.alert.alert_threshold = 120.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_is_bounded() {
        let mut config = base();
        config.alert.retry_backoff_ms = u64::MAX;
        assert!(config.validate().is_err());
        config.alert.retry_backoff_ms = 60_000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unparsable_value_falls_back_to_default() {
        std::env::set_var("CHURN_TEST_UNPARSABLE_THRESHOLD", "abc");
        assert_eq!(parsed("CHURN_TEST_UNPARSABLE_THRESHOLD", 80.0), 80.0);
        std::env::set_var("CHURN_TEST_UNPARSABLE_THRESHOLD", "65.5");
        assert_eq!(parsed("CHURN_TEST_UNPARSABLE_THRESHOLD", 80.0), 65.5);
        std::env::remove_var("CHURN_TEST_UNPARSABLE_THRESHOLD");
        assert_eq!(parsed("CHURN_TEST_UNPARSABLE_THRESHOLD", 80.0), 80.0);
    }

    #[test]
    fn test_test_size_bounds_are_exclusive() {
        let mut config = base();
        config.evaluation.test_size = 1.0;
        assert!(config.validate().is_err());
        config.evaluation.test_size = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_settings_require_every_field() {
        let mut alert = AlertConfig::default();
        alert.provider_account_id = Some("AC123".to_string());
        alert.provider_auth_token = Some("token".to_string());
        alert.sender_identity = Some("+15550001".to_string());
        assert!(alert.provider_settings().is_none());

        alert.alert_recipient = Some("+15550002".to_string());
        let settings = alert.provider_settings().unwrap();
        assert_eq!(settings.account_id, "AC123");
        assert_eq!(settings.recipient, "+15550002");
    }

    #[test]
    fn test_empty_credential_rejected() {
        let mut config = base();
        config.alert.provider_auth_token = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_logs_flag() {
        let mut config = base();
        assert!(!config.json_logs());
        config.log_format = "JSON".to_string();
        assert!(config.json_logs());
    }
}

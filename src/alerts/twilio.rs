//! Twilio Messages API client

use std::time::Duration;

use serde::Deserialize;

use crate::config::ProviderSettings;
use super::{ProviderError, SmsSender};

pub struct TwilioSender {
    settings: ProviderSettings,
    messages_url: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

impl TwilioSender {
    pub fn new(settings: ProviderSettings, api_base: &str, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        let messages_url = messages_url(api_base, &settings.account_id);

        Self {
            settings,
            messages_url,
            http_client,
        }
    }
}

fn messages_url(api_base: &str, account_id: &str) -> String {
    format!(
        "{}/2010-04-01/Accounts/{}/Messages.json",
        api_base.trim_end_matches('/'),
        account_id
    )
}

#[axum::async_trait]
impl SmsSender for TwilioSender {
    async fn send(&self, body: &str) -> Result<String, ProviderError> {
        let params = [
            ("To", self.settings.recipient.as_str()),
            ("From", self.settings.sender.as_str()),
            ("Body", body),
        ];

        let response = self.http_client
            .post(&self.messages_url)
            .basic_auth(&self.settings.account_id, Some(&self.settings.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let message: MessageResponse = response.json().await
                .map_err(|e| ProviderError::Parse(e.to_string()))?;
            return Ok(message.sid);
        }

        if status.is_client_error() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|e| e.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Err(ProviderError::Server(status.as_u16()))
    }
}

//! Chat notifications through a Feishu bot webhook.

use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::NotifyConfig;
use crate::error::NotifyError;

pub struct FeishuNotifier {
    client: Client,
    webhook_url: String,
}

impl FeishuNotifier {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }

    pub fn from_config(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let webhook_url = config
            .webhook_url
            .as_deref()
            .ok_or(NotifyError::MissingWebhook)?;
        Self::new(webhook_url, config.timeout())
    }

    /// Text message whose body is `data` rendered as indented JSON.
    pub fn text_message<T: Serialize + ?Sized>(data: &T) -> Result<Value, NotifyError> {
        let text = serde_json::to_string_pretty(data)?;
        Ok(json!({
            "msg_type": "text",
            "content": { "text": text }
        }))
    }

    /// Post `data` and report the outcome.
    pub async fn deliver<T: Serialize + ?Sized>(&self, data: &T) -> Result<(), NotifyError> {
        let message = Self::text_message(data)?;

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Notification delivered to webhook");
        Ok(())
    }

    /// Fire and forget: failures are logged, never returned.
    pub async fn send<T: Serialize + ?Sized>(&self, data: &T) {
        if let Err(e) = self.deliver(data).await {
            warn!("Failed to send notification: {}", e);
        }
    }
}

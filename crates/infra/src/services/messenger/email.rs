use super::{ChannelError, IMessenger, OutboundMessage};
use crate::config::EmailProviderConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::error;

const SEND_TIMEOUT_SECS: u64 = 10;

/// REST client for a transactional email provider
pub struct HttpEmailMessenger {
    client: Client,
    base_url: String,
    api_key: String,
    from_address: String,
}

impl HttpEmailMessenger {
    pub fn new(config: &EmailProviderConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text_body: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailResponse {
    message_id: String,
}

#[async_trait::async_trait]
impl IMessenger for HttpEmailMessenger {
    async fn send(
        &self,
        recipient: &str,
        message: &OutboundMessage,
    ) -> Result<String, ChannelError> {
        let request = SendEmailRequest {
            from: &self.from_address,
            to: recipient,
            subject: &message.subject,
            text_body: &message.body,
        };
        let res = self
            .client
            .post(format!("{}/email", self.base_url))
            .header("authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("[Network Error] Email provider send error. Error message: {:?}", e);
                ChannelError::Network(e.to_string())
            })?;

        let res = res.error_for_status().map_err(|e| {
            error!("[Rejected Request] Email provider send error. Error message: {:?}", e);
            ChannelError::Rejected(e.to_string())
        })?;

        res.json::<SendEmailResponse>()
            .await
            .map(|body| body.message_id)
            .map_err(|e| {
                error!(
                    "[Unexpected Response] Email provider send error. Error message: {:?}",
                    e
                );
                ChannelError::Rejected(e.to_string())
            })
    }
}

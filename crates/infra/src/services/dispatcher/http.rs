use super::{IDispatcher, TriggerPayload};
use crate::config::DispatcherConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::error;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// REST client for the external delay-queue service
pub struct HttpDispatcher {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpDispatcher {
    pub fn new(config: &DispatcherConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleMessageRequest<'a> {
    url: &'a str,
    delay_seconds: i64,
    body: &'a TriggerPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleMessageResponse {
    message_id: String,
}

#[async_trait::async_trait]
impl IDispatcher for HttpDispatcher {
    async fn schedule(
        &self,
        url: &str,
        delay_secs: i64,
        payload: &TriggerPayload,
    ) -> anyhow::Result<String> {
        let request = ScheduleMessageRequest {
            url,
            delay_seconds: delay_secs,
            body: payload,
        };
        match self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
        {
            Ok(res) => match res.error_for_status() {
                Ok(res) => res
                    .json::<ScheduleMessageResponse>()
                    .await
                    .map(|body| body.message_id)
                    .map_err(|e| {
                        error!(
                            "[Unexpected Response] Dispatcher schedule error. Error message: {:?}",
                            e
                        );
                        anyhow::Error::new(e)
                    }),
                Err(e) => {
                    error!(
                        "[Rejected Request] Dispatcher schedule error. Error message: {:?}",
                        e
                    );
                    Err(anyhow::Error::new(e))
                }
            },
            Err(e) => {
                error!(
                    "[Network Error] Dispatcher schedule error. Error message: {:?}",
                    e
                );
                Err(anyhow::Error::new(e))
            }
        }
    }

    async fn cancel(&self, handle: &str) -> anyhow::Result<()> {
        match self
            .client
            .delete(format!("{}/messages/{}", self.base_url, handle))
            .header("authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
        {
            Ok(res) => res.error_for_status().map(|_| ()).map_err(|e| {
                error!(
                    "[Rejected Request] Dispatcher cancel error for handle {}. Error message: {:?}",
                    handle, e
                );
                anyhow::Error::new(e)
            }),
            Err(e) => {
                error!(
                    "[Network Error] Dispatcher cancel error for handle {}. Error message: {:?}",
                    handle, e
                );
                Err(anyhow::Error::new(e))
            }
        }
    }
}

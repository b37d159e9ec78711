use super::{ChannelError, IMessenger, OutboundMessage};
use crate::config::TwilioConfig;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::error;

const TWILIO_API_BASE_URL: &str = "https://api.twilio.com/2010-04-01";
const SEND_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct TwilioResourceResponse {
    sid: String,
}

struct TwilioRestApi {
    client: Client,
    account_sid: String,
    auth_token: String,
    from_phone: String,
}

impl TwilioRestApi {
    fn new(config: &TwilioConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_phone: config.from_phone.clone(),
        }
    }

    async fn create_resource(
        &self,
        resource: &str,
        form: &[(&str, &str)],
    ) -> Result<String, ChannelError> {
        let url = format!(
            "{}/Accounts/{}/{}.json",
            TWILIO_API_BASE_URL, self.account_sid, resource
        );
        let res = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(form)
            .send()
            .await
            .map_err(|e| {
                error!(
                    "[Network Error] Twilio {} error. Error message: {:?}",
                    resource, e
                );
                ChannelError::Network(e.to_string())
            })?;

        let res = res.error_for_status().map_err(|e| {
            error!(
                "[Rejected Request] Twilio {} error. Error message: {:?}",
                resource, e
            );
            ChannelError::Rejected(e.to_string())
        })?;

        res.json::<TwilioResourceResponse>()
            .await
            .map(|body| body.sid)
            .map_err(|e| {
                error!(
                    "[Unexpected Response] Twilio {} error. Error message: {:?}",
                    resource, e
                );
                ChannelError::Rejected(e.to_string())
            })
    }
}

/// Sends the reminder text as an SMS through the Twilio Messages resource
pub struct TwilioSmsMessenger {
    api: TwilioRestApi,
}

impl TwilioSmsMessenger {
    pub fn new(config: &TwilioConfig) -> Self {
        Self {
            api: TwilioRestApi::new(config),
        }
    }
}

#[async_trait::async_trait]
impl IMessenger for TwilioSmsMessenger {
    async fn send(
        &self,
        recipient: &str,
        message: &OutboundMessage,
    ) -> Result<String, ChannelError> {
        let body = format!("{}\n{}", message.subject, message.body);
        self.api
            .create_resource(
                "Messages",
                &[
                    ("To", recipient),
                    ("From", &self.api.from_phone),
                    ("Body", &body),
                ],
            )
            .await
    }
}

/// Places a call that reads the reminder text aloud through the Twilio Calls
/// resource, using inline TwiML
pub struct TwilioVoiceMessenger {
    api: TwilioRestApi,
}

impl TwilioVoiceMessenger {
    pub fn new(config: &TwilioConfig) -> Self {
        Self {
            api: TwilioRestApi::new(config),
        }
    }
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[async_trait::async_trait]
impl IMessenger for TwilioVoiceMessenger {
    async fn send(
        &self,
        recipient: &str,
        message: &OutboundMessage,
    ) -> Result<String, ChannelError> {
        let twiml = format!(
            "<Response><Say>{}. {}</Say></Response>",
            escape_xml(&message.subject),
            escape_xml(&message.body)
        );
        self.api
            .create_resource(
                "Calls",
                &[
                    ("To", recipient),
                    ("From", &self.api.from_phone),
                    ("Twiml", &twiml),
                ],
            )
            .await
    }
}

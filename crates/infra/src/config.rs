use remindr_utils::create_random_secret;
use tracing::{info, warn};

const DELIVERY_KEY_LEN: usize = 30;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on
    pub port: usize,
    /// Public URL of this service's delivery callback, handed to the
    /// dispatcher when arming a trigger
    pub delivery_callback_url: String,
    /// Shared secret the dispatcher must present on the delivery callback
    pub delivery_callback_key: String,
    /// Delay-queue dispatcher service. When absent, triggers are kept in
    /// process and lost on restart, which is only acceptable for local dev
    pub dispatcher: Option<DispatcherConfig>,
    /// Email provider. When absent, outbound email is only logged
    pub email: Option<EmailProviderConfig>,
    /// SMS/Voice provider. When absent, outbound SMS/voice is only logged
    pub twilio: Option<TwilioConfig>,
}

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct EmailProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub from_address: String,
}

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_phone: String,
}

impl Config {
    pub fn new() -> Self {
        let default_port = "5000";
        let port = std::env::var("PORT").unwrap_or_else(|_| default_port.into());
        let port = match port.parse::<usize>() {
            Ok(port) => port,
            Err(_) => {
                warn!(
                    "The given PORT: {} is not valid, falling back to the default port: {}.",
                    port, default_port
                );
                default_port.parse::<usize>().unwrap()
            }
        };

        let delivery_callback_url = std::env::var("DELIVERY_CALLBACK_URL").unwrap_or_else(|_| {
            format!("http://localhost:{}/api/v1/internal/deliver", port)
        });

        let delivery_callback_key = match std::env::var("DELIVERY_CALLBACK_KEY") {
            Ok(key) => key,
            Err(_) => {
                let key = create_random_secret(DELIVERY_KEY_LEN);
                info!(
                    "Did not find DELIVERY_CALLBACK_KEY environment variable. Generated one: {}",
                    key
                );
                key
            }
        };

        let dispatcher = match (
            std::env::var("DISPATCHER_BASE_URL"),
            std::env::var("DISPATCHER_API_KEY"),
        ) {
            (Ok(base_url), Ok(api_key)) => Some(DispatcherConfig { base_url, api_key }),
            _ => None,
        };

        let email = match (
            std::env::var("EMAIL_API_BASE_URL"),
            std::env::var("EMAIL_API_KEY"),
            std::env::var("EMAIL_FROM_ADDRESS"),
        ) {
            (Ok(base_url), Ok(api_key), Ok(from_address)) => Some(EmailProviderConfig {
                base_url,
                api_key,
                from_address,
            }),
            _ => None,
        };

        let twilio = match (
            std::env::var("TWILIO_ACCOUNT_SID"),
            std::env::var("TWILIO_AUTH_TOKEN"),
            std::env::var("TWILIO_FROM_PHONE"),
        ) {
            (Ok(account_sid), Ok(auth_token), Ok(from_phone)) => Some(TwilioConfig {
                account_sid,
                auth_token,
                from_phone,
            }),
            _ => None,
        };

        Self {
            port,
            delivery_callback_url,
            delivery_callback_key,
            dispatcher,
            email,
            twilio,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

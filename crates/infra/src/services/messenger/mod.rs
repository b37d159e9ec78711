mod email;
mod inmemory;
mod twilio;

pub use email::HttpEmailMessenger;
pub use inmemory::{InMemoryMessenger, SentMessage};
use std::sync::Arc;
use thiserror::Error;
pub use twilio::{TwilioSmsMessenger, TwilioVoiceMessenger};

/// What gets handed to a channel adapter at fire time
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel provider rejected the request: {0}")]
    Rejected(String),
    #[error("Channel provider unreachable: {0}")]
    Network(String),
}

/// A delivery channel adapter. The core never retries a failed send and only
/// assumes "the provider accepted the request", never delivery confirmation.
#[async_trait::async_trait]
pub trait IMessenger: Send + Sync {
    /// Attempts delivery to `recipient` (email address or phone number,
    /// depending on the channel), returning the provider message id
    async fn send(
        &self,
        recipient: &str,
        message: &OutboundMessage,
    ) -> Result<String, ChannelError>;
}

/// One adapter per delivery channel
#[derive(Clone)]
pub struct Messengers {
    pub email: Arc<dyn IMessenger>,
    pub sms: Arc<dyn IMessenger>,
    pub voice: Arc<dyn IMessenger>,
}

impl Messengers {
    pub fn create_inmemory() -> Self {
        Self {
            email: Arc::new(InMemoryMessenger::new()),
            sms: Arc::new(InMemoryMessenger::new()),
            voice: Arc::new(InMemoryMessenger::new()),
        }
    }
}

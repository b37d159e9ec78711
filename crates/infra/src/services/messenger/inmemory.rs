use super::{ChannelError, IMessenger, OutboundMessage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub recipient: String,
    pub message: OutboundMessage,
}

/// Records sent messages instead of delivering them. Test double for the
/// channel adapters and the local-dev fallback when a provider is not
/// configured. Can be switched into a failing mode to exercise
/// partial-delivery paths.
pub struct InMemoryMessenger {
    sent: Mutex<Vec<SentMessage>>,
    failing: AtomicBool,
}

impl InMemoryMessenger {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Default for InMemoryMessenger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IMessenger for InMemoryMessenger {
    async fn send(
        &self,
        recipient: &str,
        message: &OutboundMessage,
    ) -> Result<String, ChannelError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ChannelError::Rejected(
                "InMemoryMessenger is in failing mode".into(),
            ));
        }
        info!(
            "Recording outbound message to {}: {}",
            recipient, message.subject
        );
        self.sent.lock().unwrap().push(SentMessage {
            recipient: recipient.to_string(),
            message: message.clone(),
        });
        Ok(Uuid::new_v4().to_string())
    }
}

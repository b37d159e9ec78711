mod http;
mod inmemory;

pub use http::HttpDispatcher;
pub use inmemory::{InMemoryDispatcher, ScheduledTrigger};
use remindr_domain::ID;
use serde::{Deserialize, Serialize};

/// Body posted back to the delivery callback when a trigger fires. Carries
/// only the reminder identity and the occurrence token: the executor always
/// re-fetches fresh state and never trusts payload-carried business data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerPayload {
    pub reminder_id: ID,
    pub occurrence: i64,
}

/// A durable delay-queue service: given an absolute delay and a payload it
/// guarantees a single HTTP callback at-or-after that time. Cancellation is
/// best-effort, a canceled trigger may still fire if the cancel races the
/// queue's own firing.
#[async_trait::async_trait]
pub trait IDispatcher: Send + Sync {
    /// Registers a callback to `url` after `delay_secs`, returning the
    /// trigger handle used for cancellation
    async fn schedule(
        &self,
        url: &str,
        delay_secs: i64,
        payload: &TriggerPayload,
    ) -> anyhow::Result<String>;

    async fn cancel(&self, handle: &str) -> anyhow::Result<()>;
}

use super::{IDispatcher, TriggerPayload};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ScheduledTrigger {
    pub handle: String,
    pub url: String,
    pub delay_secs: i64,
    pub payload: TriggerPayload,
}

/// Records scheduled and canceled triggers without ever firing them. Used as
/// the test double and as the local-dev fallback when no delay-queue service
/// is configured (triggers are then lost on restart).
pub struct InMemoryDispatcher {
    scheduled: Mutex<Vec<ScheduledTrigger>>,
    canceled: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl InMemoryDispatcher {
    pub fn new() -> Self {
        Self {
            scheduled: Mutex::new(Vec::new()),
            canceled: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every schedule call fail, to exercise dispatcher-failure paths
    /// in tests
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn scheduled_triggers(&self) -> Vec<ScheduledTrigger> {
        self.scheduled.lock().unwrap().clone()
    }

    pub fn canceled_handles(&self) -> Vec<String> {
        self.canceled.lock().unwrap().clone()
    }

    /// Triggers scheduled but not canceled
    pub fn outstanding_triggers(&self) -> Vec<ScheduledTrigger> {
        let canceled = self.canceled.lock().unwrap();
        self.scheduled
            .lock()
            .unwrap()
            .iter()
            .filter(|trigger| !canceled.contains(&trigger.handle))
            .cloned()
            .collect()
    }
}

impl Default for InMemoryDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IDispatcher for InMemoryDispatcher {
    async fn schedule(
        &self,
        url: &str,
        delay_secs: i64,
        payload: &TriggerPayload,
    ) -> anyhow::Result<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("InMemoryDispatcher is in failing mode"));
        }
        let handle = Uuid::new_v4().to_string();
        info!(
            "Scheduling in-process trigger {} for reminder {} in {}s",
            handle, payload.reminder_id, delay_secs
        );
        self.scheduled.lock().unwrap().push(ScheduledTrigger {
            handle: handle.clone(),
            url: url.to_string(),
            delay_secs,
            payload: payload.clone(),
        });
        Ok(handle)
    }

    async fn cancel(&self, handle: &str) -> anyhow::Result<()> {
        let known = self
            .scheduled
            .lock()
            .unwrap()
            .iter()
            .any(|trigger| trigger.handle == handle);
        if !known {
            return Err(anyhow::anyhow!("Unknown trigger handle: {}", handle));
        }
        self.canceled.lock().unwrap().push(handle.to_string());
        Ok(())
    }
}

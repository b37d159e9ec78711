use super::IReminderRepo;
use crate::repos::shared::inmemory_repo::*;
use remindr_domain::{Reminder, ID};
use std::sync::atomic::{AtomicBool, Ordering};

pub struct InMemoryReminderRepo {
    reminders: std::sync::Mutex<Vec<Reminder>>,
    failing: AtomicBool,
}

impl InMemoryReminderRepo {
    pub fn new() -> Self {
        Self {
            reminders: std::sync::Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every write fail, to exercise storage-failure paths in tests
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_failing(&self) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("InMemoryReminderRepo is in failing mode"));
        }
        Ok(())
    }
}

impl Default for InMemoryReminderRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IReminderRepo for InMemoryReminderRepo {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        self.check_failing()?;
        insert(reminder, &self.reminders);
        Ok(())
    }

    async fn save(&self, reminder: &Reminder) -> anyhow::Result<()> {
        self.check_failing()?;
        save(reminder, &self.reminders);
        Ok(())
    }

    async fn find(&self, reminder_id: &ID) -> Option<Reminder> {
        find(reminder_id, &self.reminders)
    }

    async fn find_by_user(&self, user_id: &ID) -> Vec<Reminder> {
        find_by(&self.reminders, |reminder| reminder.user_id == *user_id)
    }

    async fn delete(&self, reminder_id: &ID) -> Option<Reminder> {
        delete(reminder_id, &self.reminders)
    }

    async fn claim_occurrence(&self, reminder_id: &ID, occurrence: i64) -> anyhow::Result<bool> {
        self.check_failing()?;
        // Check and set under one lock
        let mut reminders = self.reminders.lock().unwrap();
        match reminders.iter_mut().find(|r| r.id == *reminder_id) {
            Some(reminder) if reminder.delivered_occurrence != Some(occurrence) => {
                reminder.delivered_occurrence = Some(occurrence);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

mod inmemory;
mod postgres;

pub use inmemory::InMemoryReminderRepo;
pub use postgres::PostgresReminderRepo;
use remindr_domain::{Reminder, ID};

#[async_trait::async_trait]
pub trait IReminderRepo: Send + Sync {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()>;
    /// Whole-record replace keyed by id
    async fn save(&self, reminder: &Reminder) -> anyhow::Result<()>;
    async fn find(&self, reminder_id: &ID) -> Option<Reminder>;
    async fn find_by_user(&self, user_id: &ID) -> Vec<Reminder>;
    async fn delete(&self, reminder_id: &ID) -> Option<Reminder>;
    /// Atomically takes ownership of delivering `occurrence`: returns true
    /// when this call set `delivered_occurrence`, false when it was already
    /// set to the same occurrence (or the reminder is gone)
    async fn claim_occurrence(&self, reminder_id: &ID, occurrence: i64) -> anyhow::Result<bool>;
}

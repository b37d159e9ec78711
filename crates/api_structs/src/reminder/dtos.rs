use remindr_domain::{Channels, Reminder, ReminderKind, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderDTO {
    pub id: ID,
    pub user_id: ID,
    pub name: String,
    pub description: Option<String>,
    pub kind: ReminderKind,
    pub due_at: i64,
    pub recurring: bool,
    pub channels: Channels,
    pub active: bool,
    pub done: bool,
    /// Whether a trigger is currently outstanding for this reminder.
    /// The raw trigger handle is internal and never exposed.
    pub scheduled: bool,
    pub created: i64,
    pub updated: i64,
}

impl ReminderDTO {
    pub fn new(reminder: Reminder) -> Self {
        Self {
            id: reminder.id,
            user_id: reminder.user_id,
            name: reminder.name,
            description: reminder.description,
            kind: reminder.kind,
            due_at: reminder.schedule.due_at(),
            recurring: reminder.schedule.is_recurring(),
            channels: reminder.channels,
            active: reminder.active,
            done: reminder.done,
            scheduled: reminder.trigger_handle.is_some(),
            created: reminder.created,
            updated: reminder.updated,
        }
    }
}

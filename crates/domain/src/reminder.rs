use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};

pub const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Display semantics of a `Reminder`: whether the UI counts down towards
/// `due_at` or counts up from it. Never affects scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReminderKind {
    CountdownTo,
    CountUpFrom,
}

/// Delivery channels for a `Reminder`, each independently toggleable.
/// All channels disabled is allowed and makes delivery a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channels {
    #[serde(default)]
    pub email: bool,
    #[serde(default)]
    pub sms: bool,
    #[serde(default)]
    pub voice: bool,
}

impl Channels {
    pub fn any_enabled(&self) -> bool {
        self.email || self.sms || self.voice
    }

    /// SMS and Voice both deliver to the owner's phone number
    pub fn needs_phone(&self) -> bool {
        self.sms || self.voice
    }
}

/// When a `Reminder` fires. A recurring reminder is never expanded into a
/// series: it always holds the single next occurrence, and the delivery
/// executor advances it after a fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Schedule {
    #[serde(rename_all = "camelCase")]
    OneShot { due_at: i64 },
    #[serde(rename_all = "camelCase")]
    DailyRecurring { due_at: i64 },
}

impl Schedule {
    pub fn new(due_at: i64, recurring: bool) -> Self {
        if recurring {
            Self::DailyRecurring { due_at }
        } else {
            Self::OneShot { due_at }
        }
    }

    /// UTC timestamp in millis of the current occurrence
    pub fn due_at(&self) -> i64 {
        match self {
            Self::OneShot { due_at } => *due_at,
            Self::DailyRecurring { due_at } => *due_at,
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self, Self::DailyRecurring { .. })
    }

    /// The occurrence following this one, or `None` for a one-shot
    pub fn next_occurrence(&self) -> Option<Self> {
        match self {
            Self::OneShot { .. } => None,
            Self::DailyRecurring { due_at } => Some(Self::DailyRecurring {
                due_at: due_at + DAY_MILLIS,
            }),
        }
    }
}

/// The central entity: a named event with a due time and a set of delivery
/// channels that should be notified when the due time is reached.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub id: ID,
    /// The owning `User`, set at creation and immutable
    pub user_id: ID,
    pub name: String,
    pub description: Option<String>,
    pub kind: ReminderKind,
    pub schedule: Schedule,
    pub channels: Channels,
    /// When false, delivery is suppressed even if a stale trigger fires,
    /// and no new triggers are armed
    pub active: bool,
    /// Completion marker, set by user acknowledgement or by delivery of a
    /// one-shot occurrence
    pub done: bool,
    /// Handle of the currently outstanding dispatcher trigger. At most one
    /// outstanding handle at any time, mutated only by the scheduling engine
    pub trigger_handle: Option<String>,
    /// `due_at` of the last occurrence whose delivery fan-out completed.
    /// This is the idempotency marker against duplicate trigger callbacks
    pub delivered_occurrence: Option<i64>,
    pub created: i64,
    pub updated: i64,
}

impl Reminder {
    pub fn new(
        user_id: ID,
        name: String,
        kind: ReminderKind,
        schedule: Schedule,
        channels: Channels,
        now: i64,
    ) -> Self {
        Self {
            id: Default::default(),
            user_id,
            name,
            description: None,
            kind,
            schedule,
            channels,
            active: true,
            done: false,
            trigger_handle: None,
            delivered_occurrence: None,
            created: now,
            updated: now,
        }
    }

    pub fn due_at(&self) -> i64 {
        self.schedule.due_at()
    }

    /// Whether the given occurrence token has already been delivered
    pub fn is_delivered(&self, occurrence: i64) -> bool {
        self.delivered_occurrence == Some(occurrence)
    }
}

impl Entity for Reminder {
    fn id(&self) -> ID {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_has_no_next_occurrence() {
        let schedule = Schedule::new(1000, false);
        assert_eq!(schedule.due_at(), 1000);
        assert!(!schedule.is_recurring());
        assert!(schedule.next_occurrence().is_none());
    }

    #[test]
    fn daily_recurring_advances_one_day() {
        let schedule = Schedule::new(1000, true);
        assert!(schedule.is_recurring());
        let next = schedule.next_occurrence().unwrap();
        assert_eq!(next.due_at(), 1000 + DAY_MILLIS);
        assert!(next.is_recurring());
    }

    #[test]
    fn channels_phone_requirement() {
        let mut channels = Channels::default();
        assert!(!channels.any_enabled());
        assert!(!channels.needs_phone());
        channels.email = true;
        assert!(!channels.needs_phone());
        channels.voice = true;
        assert!(channels.needs_phone());
    }

    #[test]
    fn delivered_occurrence_matches_exact_token() {
        let mut reminder = Reminder::new(
            ID::new(),
            "Dentist".into(),
            ReminderKind::CountdownTo,
            Schedule::new(5000, false),
            Channels::default(),
            100,
        );
        assert!(!reminder.is_delivered(5000));
        reminder.delivered_occurrence = Some(5000);
        assert!(reminder.is_delivered(5000));
        assert!(!reminder.is_delivered(5000 + DAY_MILLIS));
    }
}

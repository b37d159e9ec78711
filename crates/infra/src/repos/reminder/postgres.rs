use super::IReminderRepo;
use anyhow::Context;
use remindr_domain::{Reminder, ReminderKind, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresReminderRepo {
    pool: PgPool,
}

impl PostgresReminderRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReminderRaw {
    reminder_uid: Uuid,
    user_uid: Uuid,
    name: String,
    description: Option<String>,
    kind: String,
    schedule: serde_json::Value,
    channels: serde_json::Value,
    active: bool,
    done: bool,
    trigger_handle: Option<String>,
    delivered_occurrence: Option<i64>,
    created: i64,
    updated: i64,
}

fn kind_to_str(kind: ReminderKind) -> &'static str {
    match kind {
        ReminderKind::CountdownTo => "countdownTo",
        ReminderKind::CountUpFrom => "countUpFrom",
    }
}

fn kind_from_str(kind: &str) -> anyhow::Result<ReminderKind> {
    match kind {
        "countdownTo" => Ok(ReminderKind::CountdownTo),
        "countUpFrom" => Ok(ReminderKind::CountUpFrom),
        _ => Err(anyhow::anyhow!("Unknown reminder kind: {}", kind)),
    }
}

impl std::convert::TryFrom<ReminderRaw> for Reminder {
    type Error = anyhow::Error;

    fn try_from(raw: ReminderRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: ID::from(raw.reminder_uid),
            user_id: ID::from(raw.user_uid),
            name: raw.name,
            description: raw.description,
            kind: kind_from_str(&raw.kind)?,
            schedule: serde_json::from_value(raw.schedule)
                .context("Malformed schedule column")?,
            channels: serde_json::from_value(raw.channels)
                .context("Malformed channels column")?,
            active: raw.active,
            done: raw.done,
            trigger_handle: raw.trigger_handle,
            delivered_occurrence: raw.delivered_occurrence,
            created: raw.created,
            updated: raw.updated,
        })
    }
}

fn into_reminder(raw: ReminderRaw) -> Option<Reminder> {
    use std::convert::TryInto;
    match raw.try_into() {
        Ok(reminder) => Some(reminder),
        Err(e) => {
            error!("Unable to map reminder row into domain reminder: {:?}", e);
            None
        }
    }
}

#[async_trait::async_trait]
impl IReminderRepo for PostgresReminderRepo {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reminders(
                reminder_uid,
                user_uid,
                name,
                description,
                kind,
                schedule,
                channels,
                active,
                done,
                trigger_handle,
                delivered_occurrence,
                created,
                updated
            )
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(*reminder.id.inner_ref())
        .bind(*reminder.user_id.inner_ref())
        .bind(&reminder.name)
        .bind(&reminder.description)
        .bind(kind_to_str(reminder.kind))
        .bind(serde_json::to_value(&reminder.schedule)?)
        .bind(serde_json::to_value(&reminder.channels)?)
        .bind(reminder.active)
        .bind(reminder.done)
        .bind(&reminder.trigger_handle)
        .bind(reminder.delivered_occurrence)
        .bind(reminder.created)
        .bind(reminder.updated)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save(&self, reminder: &Reminder) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE reminders SET
                name = $2,
                description = $3,
                kind = $4,
                schedule = $5,
                channels = $6,
                active = $7,
                done = $8,
                trigger_handle = $9,
                delivered_occurrence = $10,
                updated = $11
            WHERE reminder_uid = $1
            "#,
        )
        .bind(*reminder.id.inner_ref())
        .bind(&reminder.name)
        .bind(&reminder.description)
        .bind(kind_to_str(reminder.kind))
        .bind(serde_json::to_value(&reminder.schedule)?)
        .bind(serde_json::to_value(&reminder.channels)?)
        .bind(reminder.active)
        .bind(reminder.done)
        .bind(&reminder.trigger_handle)
        .bind(reminder.delivered_occurrence)
        .bind(reminder.updated)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, reminder_id: &ID) -> Option<Reminder> {
        let raw = sqlx::query_as::<_, ReminderRaw>(
            "SELECT * FROM reminders WHERE reminder_uid = $1",
        )
        .bind(*reminder_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Unable to find reminder {}: {:?}", reminder_id, e);
            e
        })
        .ok()??;
        into_reminder(raw)
    }

    async fn find_by_user(&self, user_id: &ID) -> Vec<Reminder> {
        let rows = sqlx::query_as::<_, ReminderRaw>(
            "SELECT * FROM reminders WHERE user_uid = $1 ORDER BY created",
        )
        .bind(*user_id.inner_ref())
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            error!("Unable to find reminders for user {}: {:?}", user_id, e);
            Vec::new()
        });
        rows.into_iter().filter_map(into_reminder).collect()
    }

    async fn delete(&self, reminder_id: &ID) -> Option<Reminder> {
        let raw = sqlx::query_as::<_, ReminderRaw>(
            "DELETE FROM reminders WHERE reminder_uid = $1 RETURNING *",
        )
        .bind(*reminder_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Unable to delete reminder {}: {:?}", reminder_id, e);
            e
        })
        .ok()??;
        into_reminder(raw)
    }

    async fn claim_occurrence(&self, reminder_id: &ID, occurrence: i64) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE reminders SET delivered_occurrence = $2
            WHERE reminder_uid = $1
            AND (delivered_occurrence IS NULL OR delivered_occurrence != $2)
            "#,
        )
        .bind(*reminder_id.inner_ref())
        .bind(occurrence)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() == 1)
    }
}

use crate::error::RemindrError;
use crate::scheduling::{self, SchedulingError};
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use remindr_api_structs::update_reminder::*;
use remindr_domain::{Channels, Reminder, ReminderKind, Schedule, ID};
use remindr_infra::Context;

pub async fn update_reminder_controller(
    path_params: web::Path<PathParams>,
    body: web::Json<RequestBody>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, RemindrError> {
    let body = body.0;
    let usecase = UpdateReminderUseCase {
        reminder_id: path_params.into_inner().reminder_id,
        name: body.name,
        description: body.description,
        kind: body.kind,
        due_at: body.due_at,
        recurring: body.recurring,
        channels: body.channels,
        active: body.active,
        done: body.done,
    };

    execute(usecase, &ctx)
        .await
        .map(|reminder| HttpResponse::Ok().json(APIResponse::new(reminder)))
        .map_err(RemindrError::from)
}

/// Patch-style update. Only the provided fields change; re-arming happens
/// only when the due time changes or the reminder transitions back to active.
#[derive(Debug)]
pub struct UpdateReminderUseCase {
    pub reminder_id: ID,
    pub name: Option<String>,
    pub description: Option<String>,
    pub kind: Option<ReminderKind>,
    pub due_at: Option<i64>,
    pub recurring: Option<bool>,
    pub channels: Option<Channels>,
    pub active: Option<bool>,
    pub done: Option<bool>,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
    InvalidName,
    MissingPhone,
    PastDue,
    SchedulingFailed,
    StorageError,
}

impl From<UseCaseError> for RemindrError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(reminder_id) => Self::NotFound(format!(
                "The reminder with id: {}, was not found.",
                reminder_id
            )),
            UseCaseError::InvalidName => {
                Self::BadClientData("Reminder name must not be empty".into())
            }
            UseCaseError::MissingPhone => Self::BadClientData(
                "SMS and Voice channels require a phone number on the user".into(),
            ),
            UseCaseError::PastDue => {
                Self::BadClientData("Cannot schedule a reminder in the past".into())
            }
            UseCaseError::SchedulingFailed | UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for UpdateReminderUseCase {
    type Response = Reminder;

    type Error = UseCaseError;

    const NAME: &'static str = "UpdateReminder";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let mut reminder = match ctx.repos.reminders.find(&self.reminder_id).await {
            Some(reminder) => reminder,
            None => return Err(UseCaseError::NotFound(self.reminder_id.clone())),
        };
        let user = match ctx.repos.users.find(&reminder.user_id).await {
            Some(user) => user,
            // The owner is gone, the reminder is an orphan
            None => return Err(UseCaseError::NotFound(self.reminder_id.clone())),
        };

        if let Some(name) = self.name.take() {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(UseCaseError::InvalidName);
            }
            reminder.name = name;
        }
        if let Some(description) = self.description.take() {
            reminder.description = Some(description);
        }
        if let Some(kind) = self.kind {
            reminder.kind = kind;
        }
        if let Some(channels) = self.channels {
            if channels.needs_phone() && user.phone.is_none() {
                return Err(UseCaseError::MissingPhone);
            }
            reminder.channels = channels;
        }
        if let Some(done) = self.done {
            reminder.done = done;
        }

        let was_active = reminder.active;
        if let Some(active) = self.active {
            reminder.active = active;
        }

        let old_due_at = reminder.due_at();
        let due_at = self.due_at.unwrap_or(old_due_at);
        let recurring = self.recurring.unwrap_or_else(|| reminder.schedule.is_recurring());
        reminder.schedule = Schedule::new(due_at, recurring);

        let now = ctx.sys.get_timestamp_millis();
        let due_at_changed = due_at != old_due_at;
        let reactivated = !was_active && reminder.active;
        reminder.updated = now;

        if was_active && !reminder.active {
            // Deactivation always disarms
            scheduling::disarm(&mut reminder, ctx).await;
            ctx.repos
                .reminders
                .save(&reminder)
                .await
                .map_err(|_| UseCaseError::StorageError)?;
        } else if reminder.active && (due_at_changed || reactivated) {
            match scheduling::arm(&mut reminder, ctx).await {
                Ok(_) => {}
                Err(SchedulingError::PastDue) => return Err(UseCaseError::PastDue),
                Err(SchedulingError::Dispatcher) => return Err(UseCaseError::SchedulingFailed),
                Err(SchedulingError::Storage) => return Err(UseCaseError::StorageError),
            }
        } else {
            ctx.repos
                .reminders
                .save(&reminder)
                .await
                .map_err(|_| UseCaseError::StorageError)?;
        }

        Ok(reminder)
    }
}

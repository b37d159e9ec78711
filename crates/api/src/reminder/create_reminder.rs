use crate::error::RemindrError;
use crate::scheduling::{self, SchedulingError};
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use remindr_api_structs::create_reminder::*;
use remindr_domain::{Channels, Reminder, ReminderKind, Schedule, ID};
use remindr_infra::Context;

pub async fn create_reminder_controller(
    path_params: web::Path<PathParams>,
    body: web::Json<RequestBody>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, RemindrError> {
    let body = body.0;
    let usecase = CreateReminderUseCase {
        user_id: path_params.into_inner().user_id,
        name: body.name,
        description: body.description,
        kind: body.kind,
        due_at: body.due_at,
        recurring: body.recurring.unwrap_or(false),
        channels: body.channels.unwrap_or_default(),
    };

    execute(usecase, &ctx)
        .await
        .map(|reminder| HttpResponse::Created().json(APIResponse::new(reminder)))
        .map_err(RemindrError::from)
}

#[derive(Debug)]
pub struct CreateReminderUseCase {
    pub user_id: ID,
    pub name: String,
    pub description: Option<String>,
    pub kind: ReminderKind,
    pub due_at: i64,
    pub recurring: bool,
    pub channels: Channels,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    UserNotFound(ID),
    InvalidName,
    MissingPhone,
    PastDue,
    SchedulingFailed,
    StorageError,
}

impl From<UseCaseError> for RemindrError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::UserNotFound(user_id) => {
                Self::NotFound(format!("The user with id: {}, was not found.", user_id))
            }
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
impl UseCase for CreateReminderUseCase {
    type Response = Reminder;

    type Error = UseCaseError;

    const NAME: &'static str = "CreateReminder";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let user = match ctx.repos.users.find(&self.user_id).await {
            Some(user) => user,
            None => return Err(UseCaseError::UserNotFound(self.user_id.clone())),
        };

        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(UseCaseError::InvalidName);
        }
        if self.channels.needs_phone() && user.phone.is_none() {
            return Err(UseCaseError::MissingPhone);
        }

        let now = ctx.sys.get_timestamp_millis();
        if self.due_at <= now {
            return Err(UseCaseError::PastDue);
        }

        let mut reminder = Reminder::new(
            self.user_id.clone(),
            name,
            self.kind,
            Schedule::new(self.due_at, self.recurring),
            self.channels,
            now,
        );
        reminder.description = self.description.take();

        ctx.repos
            .reminders
            .insert(&reminder)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        match scheduling::arm(&mut reminder, ctx).await {
            Ok(_) => Ok(reminder),
            Err(SchedulingError::PastDue) => Err(UseCaseError::PastDue),
            Err(_) => {
                // Roll the record back so a user retry recreates it cleanly
                ctx.repos.reminders.delete(&reminder.id).await;
                Err(UseCaseError::SchedulingFailed)
            }
        }
    }
}

use crate::error::RemindrError;
use crate::scheduling;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use remindr_api_structs::delete_reminder::*;
use remindr_domain::{Reminder, ID};
use remindr_infra::Context;

pub async fn delete_reminder_controller(
    path_params: web::Path<PathParams>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, RemindrError> {
    let usecase = DeleteReminderUseCase {
        reminder_id: path_params.into_inner().reminder_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|reminder| HttpResponse::Ok().json(APIResponse::new(reminder)))
        .map_err(RemindrError::from)
}

#[derive(Debug)]
pub struct DeleteReminderUseCase {
    pub reminder_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    NotFound(ID),
}

impl From<UseCaseError> for RemindrError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(reminder_id) => Self::NotFound(format!(
                "The reminder with id: {}, was not found.",
                reminder_id
            )),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for DeleteReminderUseCase {
    type Response = Reminder;

    type Error = UseCaseError;

    const NAME: &'static str = "DeleteReminder";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        let mut reminder = match ctx.repos.reminders.find(&self.reminder_id).await {
            Some(reminder) => reminder,
            None => return Err(UseCaseError::NotFound(self.reminder_id.clone())),
        };

        scheduling::disarm(&mut reminder, ctx).await;

        match ctx.repos.reminders.delete(&reminder.id).await {
            Some(deleted) => Ok(deleted),
            // Deleted concurrently between the find and the delete
            None => Err(UseCaseError::NotFound(self.reminder_id.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::create_reminder::CreateReminderUseCase;
    use remindr_domain::{Channels, ReminderKind, User};
    use remindr_infra::{FixedSys, InMemoryDispatcher};
    use std::sync::Arc;

    const NOW: i64 = 1_600_000_000_000;

    struct TestContext {
        ctx: Context,
        dispatcher: Arc<InMemoryDispatcher>,
        reminder: Reminder,
    }

    async fn setup() -> TestContext {
        let mut ctx = Context::create_inmemory();
        ctx.sys = Arc::new(FixedSys(NOW));
        let dispatcher = Arc::new(InMemoryDispatcher::new());
        ctx.dispatcher = dispatcher.clone();

        let user = User::new("owner@example.com".into());
        ctx.repos.users.insert(&user).await.unwrap();

        let create = CreateReminderUseCase {
            user_id: user.id.clone(),
            name: "Water the plants".into(),
            description: None,
            kind: ReminderKind::CountdownTo,
            due_at: NOW + 60_000,
            recurring: false,
            channels: Channels {
                email: true,
                ..Default::default()
            },
        };
        let reminder = execute(create, &ctx).await.unwrap();

        TestContext {
            ctx,
            dispatcher,
            reminder,
        }
    }

    #[actix_web::main]
    #[test]
    async fn deleting_cancels_the_outstanding_trigger() {
        let TestContext {
            ctx,
            dispatcher,
            reminder,
        } = setup().await;
        let handle = reminder.trigger_handle.clone().unwrap();

        let usecase = DeleteReminderUseCase {
            reminder_id: reminder.id.clone(),
        };
        let deleted = execute(usecase, &ctx).await.expect("To delete reminder");

        assert_eq!(deleted.id, reminder.id);
        assert_eq!(dispatcher.canceled_handles(), vec![handle]);
        assert!(ctx.repos.reminders.find(&reminder.id).await.is_none());
    }

    #[actix_web::main]
    #[test]
    async fn unknown_reminder_is_not_found() {
        let TestContext { ctx, .. } = setup().await;

        let unknown = ID::new();
        let usecase = DeleteReminderUseCase {
            reminder_id: unknown.clone(),
        };
        let res = execute(usecase, &ctx).await;
        assert_eq!(res.unwrap_err(), UseCaseError::NotFound(unknown));
    }
}

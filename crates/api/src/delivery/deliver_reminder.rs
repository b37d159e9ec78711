use crate::error::RemindrError;
use crate::scheduling;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpRequest, HttpResponse};
use remindr_api_structs::deliver_reminder::*;
use remindr_domain::{Reminder, ReminderKind, ID};
use remindr_infra::{Context, IMessenger, OutboundMessage};
use tracing::{error, warn};

pub async fn deliver_reminder_controller(
    http_req: HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<Context>,
) -> Result<HttpResponse, RemindrError> {
    verify_delivery_key(&http_req, &ctx)?;

    let body = body.0;
    let usecase = DeliverReminderUseCase {
        reminder_id: body.reminder_id,
        occurrence: body.occurrence,
    };

    execute(usecase, &ctx)
        .await
        .map(|report| HttpResponse::Ok().json(to_response(report)))
        .map_err(RemindrError::from)
}

fn verify_delivery_key(http_req: &HttpRequest, ctx: &Context) -> Result<(), RemindrError> {
    let key = http_req
        .headers()
        .get(DELIVERY_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if key != ctx.config.delivery_callback_key {
        return Err(RemindrError::Unauthorized(format!(
            "Missing or invalid `{}` header",
            DELIVERY_KEY_HEADER
        )));
    }
    Ok(())
}

fn to_response(report: DeliveryReport) -> APIResponse {
    match report {
        DeliveryReport::Skipped(reason) => APIResponse::skipped(reason),
        DeliveryReport::Delivered { attempted, failed } => APIResponse::delivered(
            attempted.into_iter().map(String::from).collect(),
            failed.into_iter().map(String::from).collect(),
        ),
    }
}

/// The callback handler invoked by the dispatcher at fire time. Every no-op
/// branch is a success to the caller: a non-200 response would make the
/// dispatcher retry business-logic outcomes that will never change.
#[derive(Debug)]
pub struct DeliverReminderUseCase {
    pub reminder_id: ID,
    /// The `due_at` this trigger was armed for
    pub occurrence: i64,
}

#[derive(Debug, PartialEq)]
pub enum DeliveryReport {
    /// Nothing was sent, with the reason why
    Skipped(&'static str),
    /// Fan-out ran; each enabled channel was attempted independently
    Delivered {
        attempted: Vec<&'static str>,
        failed: Vec<&'static str>,
    },
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    StorageError,
}

impl From<UseCaseError> for RemindrError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for DeliverReminderUseCase {
    type Response = DeliveryReport;

    type Error = UseCaseError;

    const NAME: &'static str = "DeliverReminder";

    async fn execute(&mut self, ctx: &Context) -> Result<Self::Response, Self::Error> {
        // Always re-fetch: the payload only identifies the occurrence, the
        // record in the store is the truth about what should still fire.
        let mut reminder = match ctx.repos.reminders.find(&self.reminder_id).await {
            Some(reminder) => reminder,
            None => return Ok(DeliveryReport::Skipped("reminder not found")),
        };

        if reminder.due_at() != self.occurrence {
            // A newer edit re-armed the reminder, this trigger is stale
            return Ok(DeliveryReport::Skipped("stale occurrence"));
        }
        if reminder.is_delivered(self.occurrence) {
            // Dispatcher redelivery of an already handled trigger
            return Ok(DeliveryReport::Skipped("already delivered"));
        }

        let user = match ctx.repos.users.find(&reminder.user_id).await {
            Some(user) => user,
            None => return Ok(DeliveryReport::Skipped("owner not found")),
        };

        if !reminder.active {
            return Ok(DeliveryReport::Skipped("reminder inactive"));
        }
        if !user.entitled {
            return Ok(DeliveryReport::Skipped("owner not entitled"));
        }

        // Claim the occurrence before touching any channel so that two
        // concurrent duplicate callbacks cannot both fan out. Whoever loses
        // the claim treats the occurrence as handled.
        let claimed = ctx
            .repos
            .reminders
            .claim_occurrence(&reminder.id, self.occurrence)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        if !claimed {
            return Ok(DeliveryReport::Skipped("already delivered"));
        }

        let message = compose_message(&reminder);
        let mut attempted = Vec::new();
        let mut failed = Vec::new();

        if reminder.channels.email {
            attempted.push("email");
            send_channel(
                "email",
                ctx.messengers.email.as_ref(),
                &user.email,
                &message,
                &reminder,
                &mut failed,
            )
            .await;
        }
        if reminder.channels.sms {
            attempted.push("sms");
            match &user.phone {
                Some(phone) => {
                    send_channel(
                        "sms",
                        ctx.messengers.sms.as_ref(),
                        phone,
                        &message,
                        &reminder,
                        &mut failed,
                    )
                    .await
                }
                None => {
                    warn!("Reminder {} has SMS enabled but its owner has no phone", reminder.id);
                    failed.push("sms");
                }
            }
        }
        if reminder.channels.voice {
            attempted.push("voice");
            match &user.phone {
                Some(phone) => {
                    send_channel(
                        "voice",
                        ctx.messengers.voice.as_ref(),
                        phone,
                        &message,
                        &reminder,
                        &mut failed,
                    )
                    .await
                }
                None => {
                    warn!(
                        "Reminder {} has Voice enabled but its owner has no phone",
                        reminder.id
                    );
                    failed.push("voice");
                }
            }
        }

        // Delivery is best-effort fan-out: the occurrence counts as handled
        // even when individual channels failed.
        reminder.delivered_occurrence = Some(self.occurrence);
        reminder.trigger_handle = None;
        let now = ctx.sys.get_timestamp_millis();
        reminder.updated = now;

        match reminder.schedule.next_occurrence() {
            None => {
                reminder.done = true;
                ctx.repos
                    .reminders
                    .save(&reminder)
                    .await
                    .map_err(|_| UseCaseError::StorageError)?;
            }
            Some(next) => {
                // Catch up past the current time if the trigger fired very late
                let mut next = next;
                while next.due_at() <= now {
                    match next.next_occurrence() {
                        Some(n) => next = n,
                        None => break,
                    }
                }
                reminder.schedule = next;
                if let Err(e) = scheduling::arm(&mut reminder, ctx).await {
                    error!(
                        "Unable to re-arm recurring reminder {} after delivery: {:?}. \
                         It is left unscheduled.",
                        reminder.id, e
                    );
                    ctx.repos
                        .reminders
                        .save(&reminder)
                        .await
                        .map_err(|_| UseCaseError::StorageError)?;
                }
            }
        }

        Ok(DeliveryReport::Delivered { attempted, failed })
    }
}

async fn send_channel(
    channel: &'static str,
    messenger: &dyn IMessenger,
    recipient: &str,
    message: &OutboundMessage,
    reminder: &Reminder,
    failed: &mut Vec<&'static str>,
) {
    if let Err(e) = messenger.send(recipient, message).await {
        // Logged, never retried and never blocking the other channels
        error!(
            "Delivery of reminder {} over {} failed: {:?}",
            reminder.id, channel, e
        );
        failed.push(channel);
    }
}

fn compose_message(reminder: &Reminder) -> OutboundMessage {
    let body = match reminder.kind {
        ReminderKind::CountdownTo => format!("\"{}\" is due now.", reminder.name),
        ReminderKind::CountUpFrom => format!("\"{}\" has started. Counting up!", reminder.name),
    };
    let body = match &reminder.description {
        Some(description) => format!("{} {}", body, description),
        None => body,
    };
    OutboundMessage {
        subject: reminder.name.clone(),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remindr_domain::{Channels, Reminder, ReminderKind, Schedule, User, DAY_MILLIS, ID};
    use remindr_infra::{FixedSys, InMemoryDispatcher, InMemoryMessenger, Messengers};
    use std::sync::Arc;

    const NOW: i64 = 1_600_000_000_000;
    // The occurrence fired one second ago
    const DUE_AT: i64 = NOW - 1000;

    struct TestContext {
        ctx: Context,
        dispatcher: Arc<InMemoryDispatcher>,
        email: Arc<InMemoryMessenger>,
        sms: Arc<InMemoryMessenger>,
        voice: Arc<InMemoryMessenger>,
        user: User,
    }

    async fn setup() -> TestContext {
        let mut ctx = Context::create_inmemory();
        ctx.sys = Arc::new(FixedSys(NOW));
        let dispatcher = Arc::new(InMemoryDispatcher::new());
        ctx.dispatcher = dispatcher.clone();
        let email = Arc::new(InMemoryMessenger::new());
        let sms = Arc::new(InMemoryMessenger::new());
        let voice = Arc::new(InMemoryMessenger::new());
        ctx.messengers = Messengers {
            email: email.clone(),
            sms: sms.clone(),
            voice: voice.clone(),
        };

        let mut user = User::new("owner@example.com".into());
        user.phone = Some("+15555550123".into());
        ctx.repos.users.insert(&user).await.unwrap();

        TestContext {
            ctx,
            dispatcher,
            email,
            sms,
            voice,
            user,
        }
    }

    async fn insert_reminder(test_ctx: &TestContext, schedule: Schedule) -> Reminder {
        let mut reminder = Reminder::new(
            test_ctx.user.id.clone(),
            "Take medicine".into(),
            ReminderKind::CountdownTo,
            schedule,
            Channels {
                email: true,
                sms: true,
                ..Default::default()
            },
            NOW - 10_000,
        );
        reminder.trigger_handle = Some("fired-handle".into());
        test_ctx.ctx.repos.reminders.insert(&reminder).await.unwrap();
        reminder
    }

    fn usecase(reminder: &Reminder) -> DeliverReminderUseCase {
        DeliverReminderUseCase {
            reminder_id: reminder.id.clone(),
            occurrence: reminder.due_at(),
        }
    }

    #[actix_web::main]
    #[test]
    async fn delivers_one_shot_and_marks_done() {
        let test_ctx = setup().await;
        let reminder = insert_reminder(&test_ctx, Schedule::new(DUE_AT, false)).await;

        let res = execute(usecase(&reminder), &test_ctx.ctx).await.unwrap();
        assert_eq!(
            res,
            DeliveryReport::Delivered {
                attempted: vec!["email", "sms"],
                failed: vec![],
            }
        );
        assert_eq!(test_ctx.email.sent_count(), 1);
        assert_eq!(test_ctx.sms.sent_count(), 1);
        assert_eq!(test_ctx.voice.sent_count(), 0);

        let stored = test_ctx.ctx.repos.reminders.find(&reminder.id).await.unwrap();
        assert!(stored.done);
        assert!(stored.trigger_handle.is_none());
        assert_eq!(stored.delivered_occurrence, Some(DUE_AT));
    }

    #[actix_web::main]
    #[test]
    async fn duplicate_callback_is_a_noop() {
        let test_ctx = setup().await;
        let reminder = insert_reminder(&test_ctx, Schedule::new(DUE_AT, false)).await;

        execute(usecase(&reminder), &test_ctx.ctx).await.unwrap();
        let second = execute(usecase(&reminder), &test_ctx.ctx).await.unwrap();

        assert_eq!(second, DeliveryReport::Skipped("already delivered"));
        // Exactly one fan-out across both invocations
        assert_eq!(test_ctx.email.sent_count(), 1);
        assert_eq!(test_ctx.sms.sent_count(), 1);
    }

    #[actix_web::main]
    #[test]
    async fn occurrence_can_only_be_claimed_once() {
        let test_ctx = setup().await;
        let reminder = insert_reminder(&test_ctx, Schedule::new(DUE_AT, false)).await;

        // Two callbacks racing for the same occurrence: only the first claim
        // wins, the loser must fan out nothing
        let repos = &test_ctx.ctx.repos.reminders;
        assert!(repos.claim_occurrence(&reminder.id, DUE_AT).await.unwrap());
        assert!(!repos.claim_occurrence(&reminder.id, DUE_AT).await.unwrap());

        let res = execute(usecase(&reminder), &test_ctx.ctx).await.unwrap();
        assert_eq!(res, DeliveryReport::Skipped("already delivered"));
        assert_eq!(test_ctx.email.sent_count(), 0);
    }

    #[actix_web::main]
    #[test]
    async fn deleted_reminder_is_a_successful_noop() {
        let test_ctx = setup().await;

        let usecase = DeliverReminderUseCase {
            reminder_id: ID::new(),
            occurrence: DUE_AT,
        };
        let res = execute(usecase, &test_ctx.ctx).await.unwrap();
        assert_eq!(res, DeliveryReport::Skipped("reminder not found"));
        assert_eq!(test_ctx.email.sent_count(), 0);
    }

    #[actix_web::main]
    #[test]
    async fn inactive_reminder_is_suppressed() {
        let test_ctx = setup().await;
        let mut reminder = insert_reminder(&test_ctx, Schedule::new(DUE_AT, false)).await;
        reminder.active = false;
        test_ctx.ctx.repos.reminders.save(&reminder).await.unwrap();

        let res = execute(usecase(&reminder), &test_ctx.ctx).await.unwrap();
        assert_eq!(res, DeliveryReport::Skipped("reminder inactive"));
        assert_eq!(test_ctx.email.sent_count(), 0);
        assert_eq!(test_ctx.sms.sent_count(), 0);
    }

    #[actix_web::main]
    #[test]
    async fn unentitled_owner_is_suppressed() {
        let test_ctx = setup().await;
        let reminder = insert_reminder(&test_ctx, Schedule::new(DUE_AT, false)).await;
        let mut user = test_ctx.user.clone();
        user.entitled = false;
        test_ctx.ctx.repos.users.save(&user).await.unwrap();

        let res = execute(usecase(&reminder), &test_ctx.ctx).await.unwrap();
        assert_eq!(res, DeliveryReport::Skipped("owner not entitled"));
        assert_eq!(test_ctx.email.sent_count(), 0);
    }

    #[actix_web::main]
    #[test]
    async fn stale_occurrence_is_rejected() {
        let test_ctx = setup().await;
        let reminder = insert_reminder(&test_ctx, Schedule::new(NOW + 60_000, false)).await;

        // Trigger armed for an older due time that has since been edited
        let usecase = DeliverReminderUseCase {
            reminder_id: reminder.id.clone(),
            occurrence: DUE_AT,
        };
        let res = execute(usecase, &test_ctx.ctx).await.unwrap();
        assert_eq!(res, DeliveryReport::Skipped("stale occurrence"));
        assert_eq!(test_ctx.email.sent_count(), 0);
    }

    #[actix_web::main]
    #[test]
    async fn partial_channel_failure_still_marks_delivered() {
        let test_ctx = setup().await;
        let reminder = insert_reminder(&test_ctx, Schedule::new(DUE_AT, false)).await;
        test_ctx.email.set_failing(true);

        let res = execute(usecase(&reminder), &test_ctx.ctx).await.unwrap();
        assert_eq!(
            res,
            DeliveryReport::Delivered {
                attempted: vec!["email", "sms"],
                failed: vec!["email"],
            }
        );
        // SMS still went out and the occurrence is marked handled
        assert_eq!(test_ctx.sms.sent_count(), 1);
        let stored = test_ctx.ctx.repos.reminders.find(&reminder.id).await.unwrap();
        assert_eq!(stored.delivered_occurrence, Some(DUE_AT));
        assert!(stored.done);
    }

    #[actix_web::main]
    #[test]
    async fn recurring_reminder_rearms_next_occurrence() {
        let test_ctx = setup().await;
        let reminder = insert_reminder(&test_ctx, Schedule::new(DUE_AT, true)).await;

        let res = execute(usecase(&reminder), &test_ctx.ctx).await.unwrap();
        assert!(matches!(res, DeliveryReport::Delivered { .. }));

        let stored = test_ctx.ctx.repos.reminders.find(&reminder.id).await.unwrap();
        assert!(!stored.done);
        assert_eq!(stored.due_at(), DUE_AT + DAY_MILLIS);
        assert_eq!(stored.delivered_occurrence, Some(DUE_AT));
        assert!(stored.trigger_handle.is_some());

        let outstanding = test_ctx.dispatcher.outstanding_triggers();
        assert_eq!(outstanding.len(), 1);
        assert_eq!(outstanding[0].payload.occurrence, DUE_AT + DAY_MILLIS);
    }

    #[actix_web::main]
    #[test]
    async fn very_late_recurring_fire_catches_up_past_now() {
        let test_ctx = setup().await;
        // Fired three days late
        let due_at = NOW - 3 * DAY_MILLIS;
        let reminder = insert_reminder(&test_ctx, Schedule::new(due_at, true)).await;

        execute(usecase(&reminder), &test_ctx.ctx).await.unwrap();

        let stored = test_ctx.ctx.repos.reminders.find(&reminder.id).await.unwrap();
        assert!(stored.due_at() > NOW);
        assert_eq!(stored.due_at(), due_at + 4 * DAY_MILLIS);
    }

    #[actix_web::main]
    #[test]
    async fn missing_phone_fails_sms_but_not_email() {
        let test_ctx = setup().await;
        let reminder = insert_reminder(&test_ctx, Schedule::new(DUE_AT, false)).await;
        let mut user = test_ctx.user.clone();
        user.phone = None;
        test_ctx.ctx.repos.users.save(&user).await.unwrap();

        let res = execute(usecase(&reminder), &test_ctx.ctx).await.unwrap();
        assert_eq!(
            res,
            DeliveryReport::Delivered {
                attempted: vec!["email", "sms"],
                failed: vec!["sms"],
            }
        );
        assert_eq!(test_ctx.email.sent_count(), 1);
    }

    #[test]
    fn composes_countdown_message() {
        let mut reminder = Reminder::new(
            ID::new(),
            "Dentist".into(),
            ReminderKind::CountdownTo,
            Schedule::new(DUE_AT, false),
            Channels::default(),
            NOW,
        );
        reminder.description = Some("Bring insurance card".into());

        let message = compose_message(&reminder);
        assert_eq!(message.subject, "Dentist");
        assert_eq!(message.body, "\"Dentist\" is due now. Bring insurance card");
    }
}

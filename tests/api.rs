mod helpers;

use helpers::setup::{spawn_app, TestApp};
use remindr_api_structs::deliver_reminder::DELIVERY_KEY_HEADER;
use remindr_api_structs::dtos::ReminderDTO;
use remindr_api_structs::{
    create_reminder, deliver_reminder, get_reminder, get_user_reminders, update_reminder,
};
use remindr_domain::{Channels, ReminderKind, User};

fn in_one_hour() -> i64 {
    now_millis() + 60 * 60 * 1000
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("System clock to be past the epoch")
        .as_millis() as i64
}

async fn create_test_reminder(app: &TestApp, user: &User, due_at: i64) -> ReminderDTO {
    let client = reqwest::Client::new();
    let body = create_reminder::RequestBody {
        name: "Pay rent".into(),
        description: Some("Transfer before noon".into()),
        kind: ReminderKind::CountdownTo,
        due_at,
        recurring: Some(false),
        channels: Some(Channels {
            email: true,
            sms: true,
            ..Default::default()
        }),
    };
    let res = client
        .post(&format!("{}/users/{}/reminders", app.address, user.id))
        .json(&body)
        .send()
        .await
        .expect("To send create request");
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    res.json::<create_reminder::APIResponse>()
        .await
        .expect("To parse create response")
        .reminder
}

#[actix_web::main]
#[test]
async fn test_status_ok() {
    let app = spawn_app().await;
    let res = reqwest::get(&format!("{}/", app.address))
        .await
        .expect("To reach the status endpoint");
    assert_eq!(res.status(), reqwest::StatusCode::OK);
}

#[actix_web::main]
#[test]
async fn test_create_reminder_schedules_a_trigger() {
    let app = spawn_app().await;
    let user = app.create_user().await;
    let due_at = in_one_hour();

    let reminder = create_test_reminder(&app, &user, due_at).await;

    assert_eq!(reminder.user_id, user.id);
    assert_eq!(reminder.due_at, due_at);
    assert!(reminder.active);
    assert!(!reminder.done);
    assert!(reminder.scheduled);

    let outstanding = app.dispatcher.outstanding_triggers();
    assert_eq!(outstanding.len(), 1);
    assert_eq!(outstanding[0].payload.reminder_id, reminder.id);
    assert_eq!(outstanding[0].payload.occurrence, due_at);
}

#[actix_web::main]
#[test]
async fn test_create_reminder_rejects_past_due_time() {
    let app = spawn_app().await;
    let user = app.create_user().await;

    let body = create_reminder::RequestBody {
        name: "Too late".into(),
        description: None,
        kind: ReminderKind::CountdownTo,
        due_at: now_millis() - 1000,
        recurring: None,
        channels: None,
    };
    let res = reqwest::Client::new()
        .post(&format!("{}/users/{}/reminders", app.address, user.id))
        .json(&body)
        .send()
        .await
        .expect("To send create request");

    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    assert!(app.dispatcher.scheduled_triggers().is_empty());
}

#[actix_web::main]
#[test]
async fn test_create_reminder_for_unknown_user_is_not_found() {
    let app = spawn_app().await;
    let user = User::new("ghost@example.com".into()); // never inserted

    let body = create_reminder::RequestBody {
        name: "Orphan".into(),
        description: None,
        kind: ReminderKind::CountdownTo,
        due_at: in_one_hour(),
        recurring: None,
        channels: None,
    };
    let res = reqwest::Client::new()
        .post(&format!("{}/users/{}/reminders", app.address, user.id))
        .json(&body)
        .send()
        .await
        .expect("To send create request");

    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
}

#[actix_web::main]
#[test]
async fn test_update_due_time_rearms_the_trigger() {
    let app = spawn_app().await;
    let user = app.create_user().await;
    let reminder = create_test_reminder(&app, &user, in_one_hour()).await;
    let first_trigger = &app.dispatcher.scheduled_triggers()[0];
    let first_handle = first_trigger.handle.clone();

    let new_due_at = in_one_hour() + 30 * 60 * 1000;
    let body = update_reminder::RequestBody {
        due_at: Some(new_due_at),
        ..Default::default()
    };
    let res = reqwest::Client::new()
        .put(&format!("{}/reminders/{}", app.address, reminder.id))
        .json(&body)
        .send()
        .await
        .expect("To send update request");
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let updated = res
        .json::<update_reminder::APIResponse>()
        .await
        .expect("To parse update response")
        .reminder;

    assert_eq!(updated.due_at, new_due_at);
    assert!(app.dispatcher.canceled_handles().contains(&first_handle));
    let outstanding = app.dispatcher.outstanding_triggers();
    assert_eq!(outstanding.len(), 1);
    assert_eq!(outstanding[0].payload.occurrence, new_due_at);
}

#[actix_web::main]
#[test]
async fn test_delete_reminder_cancels_the_trigger() {
    let app = spawn_app().await;
    let user = app.create_user().await;
    let reminder = create_test_reminder(&app, &user, in_one_hour()).await;
    let handle = app.dispatcher.scheduled_triggers()[0].handle.clone();

    let client = reqwest::Client::new();
    let res = client
        .delete(&format!("{}/reminders/{}", app.address, reminder.id))
        .send()
        .await
        .expect("To send delete request");
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    assert_eq!(app.dispatcher.canceled_handles(), vec![handle]);

    let res = client
        .get(&format!("{}/reminders/{}", app.address, reminder.id))
        .send()
        .await
        .expect("To send get request");
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
}

#[actix_web::main]
#[test]
async fn test_list_user_reminders() {
    let app = spawn_app().await;
    let user = app.create_user().await;
    let reminder = create_test_reminder(&app, &user, in_one_hour()).await;

    let res = reqwest::get(&format!("{}/users/{}/reminders", app.address, user.id))
        .await
        .expect("To send list request");
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let reminders = res
        .json::<get_user_reminders::APIResponse>()
        .await
        .expect("To parse list response")
        .reminders;

    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0].id, reminder.id);
}

#[actix_web::main]
#[test]
async fn test_delivery_callback_requires_the_shared_key() {
    let app = spawn_app().await;
    let user = app.create_user().await;
    let reminder = create_test_reminder(&app, &user, in_one_hour()).await;

    let body = deliver_reminder::RequestBody {
        reminder_id: reminder.id,
        occurrence: reminder.due_at,
    };
    let res = reqwest::Client::new()
        .post(&format!("{}/internal/deliver", app.address))
        .header(DELIVERY_KEY_HEADER, "wrong-key")
        .json(&body)
        .send()
        .await
        .expect("To send delivery callback");

    assert_eq!(res.status(), reqwest::StatusCode::UNAUTHORIZED);
    assert_eq!(app.email.sent_count(), 0);
}

#[actix_web::main]
#[test]
async fn test_delivery_callback_is_idempotent() {
    let app = spawn_app().await;
    let user = app.create_user().await;
    let reminder = create_test_reminder(&app, &user, in_one_hour()).await;

    let client = reqwest::Client::new();
    let body = deliver_reminder::RequestBody {
        reminder_id: reminder.id.clone(),
        occurrence: reminder.due_at,
    };

    let res = client
        .post(&format!("{}/internal/deliver", app.address))
        .header(DELIVERY_KEY_HEADER, &app.delivery_key)
        .json(&body)
        .send()
        .await
        .expect("To send delivery callback");
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let first = res
        .json::<deliver_reminder::APIResponse>()
        .await
        .expect("To parse delivery response");
    assert_eq!(first.outcome, "delivered");
    assert_eq!(first.attempted, vec!["email", "sms"]);
    assert!(first.failed.is_empty());

    // Redelivery of the same occurrence must not fan out again
    let res = client
        .post(&format!("{}/internal/deliver", app.address))
        .header(DELIVERY_KEY_HEADER, &app.delivery_key)
        .json(&body)
        .send()
        .await
        .expect("To send delivery callback");
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let second = res
        .json::<deliver_reminder::APIResponse>()
        .await
        .expect("To parse delivery response");
    assert_eq!(second.outcome, "skipped: already delivered");

    assert_eq!(app.email.sent_count(), 1);
    assert_eq!(app.sms.sent_count(), 1);

    let res = client
        .get(&format!("{}/reminders/{}", app.address, reminder.id))
        .send()
        .await
        .expect("To send get request");
    let stored = res
        .json::<get_reminder::APIResponse>()
        .await
        .expect("To parse get response")
        .reminder;
    assert!(stored.done);
    assert!(!stored.scheduled);
}

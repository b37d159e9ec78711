use remindr_domain::Reminder;
use remindr_infra::{Context, TriggerPayload};
use tracing::{error, warn};

/// Failures of the scheduling engine. `PastDue` is a user-facing validation
/// failure; the other two are transient infra faults surfaced as generic
/// errors and left to the caller to retry.
#[derive(Debug, PartialEq)]
pub enum SchedulingError {
    /// The due time is not strictly in the future
    PastDue,
    /// The dispatcher rejected or never received the schedule request
    Dispatcher,
    /// The trigger handle could not be persisted
    Storage,
}

/// Arms a trigger for the reminder's current occurrence and persists the
/// returned handle. Any previously outstanding trigger is canceled first so
/// that at most one handle is outstanding per reminder.
pub async fn arm(reminder: &mut Reminder, ctx: &Context) -> Result<String, SchedulingError> {
    let now = ctx.sys.get_timestamp_millis();
    let due_at = reminder.due_at();
    let delay_millis = due_at - now;
    if delay_millis <= 0 {
        return Err(SchedulingError::PastDue);
    }

    cancel_outstanding_trigger(reminder, ctx).await;

    let payload = TriggerPayload {
        reminder_id: reminder.id.clone(),
        occurrence: due_at,
    };
    // Round up so the callback never arrives before the due time
    let delay_secs = (delay_millis + 999) / 1000;
    let handle = ctx
        .dispatcher
        .schedule(&ctx.config.delivery_callback_url, delay_secs, &payload)
        .await
        .map_err(|e| {
            error!(
                "Unable to schedule trigger for reminder {}: {:?}",
                reminder.id, e
            );
            SchedulingError::Dispatcher
        })?;

    reminder.trigger_handle = Some(handle.clone());
    reminder.updated = now;
    if let Err(e) = ctx.repos.reminders.save(reminder).await {
        // The trigger will still fire but can no longer be canceled through
        // the reminder record. The idempotent delivery check and the active
        // guard are the mitigation.
        error!(
            "ORPHAN TRIGGER: handle {} was scheduled for reminder {} but could not be persisted: {:?}",
            handle, reminder.id, e
        );
        return Err(SchedulingError::Storage);
    }

    Ok(handle)
}

/// Cancels the outstanding trigger (if any) and clears the handle on the
/// in-memory record. Callers persist or delete the record afterwards.
pub async fn disarm(reminder: &mut Reminder, ctx: &Context) {
    cancel_outstanding_trigger(reminder, ctx).await;
}

async fn cancel_outstanding_trigger(reminder: &mut Reminder, ctx: &Context) {
    if let Some(handle) = reminder.trigger_handle.take() {
        if let Err(e) = ctx.dispatcher.cancel(&handle).await {
            // Best-effort: the trigger may already have fired or been consumed
            warn!(
                "Unable to cancel trigger {} for reminder {}: {:?}",
                handle, reminder.id, e
            );
        }
    }
}

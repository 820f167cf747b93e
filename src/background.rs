use crate::domain::models::outbox::{OutboxEvent, EVENT_RESERVATION_REMINDER};
use crate::state::AppState;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, info_span, Instrument};

const POLL_INTERVAL: Duration = Duration::from_secs(5);
const OUTBOX_BATCH: i32 = 10;
/// Sweep housekeeping roughly once a minute.
const SWEEP_EVERY_N_TICKS: u32 = 12;

/// Delivers outbox notifications and runs the periodic sweep. Delivery
/// failures are recorded on the row and logged, nothing more: the state
/// change an event announces has already committed.
pub async fn start_background_worker(state: Arc<AppState>) {
    info!("Starting background worker...");

    let mut tick: u32 = 0;
    loop {
        dispatch_outbox(&state).await;

        if tick % SWEEP_EVERY_N_TICKS == 0 {
            run_sweep(&state).await;
        }
        tick = tick.wrapping_add(1);

        sleep(POLL_INTERVAL).await;
    }
}

pub async fn dispatch_outbox(state: &Arc<AppState>) {
    let pending = match state.outbox_repo.find_pending(OUTBOX_BATCH).await {
        Ok(events) => events,
        Err(e) => {
            error!("Failed to fetch pending outbox events: {:?}", e);
            return;
        }
    };

    for event in pending {
        let span = info_span!(
            "outbox_dispatch",
            event_id = %event.id,
            event_type = %event.event_type,
            recipient = %event.recipient_user_id
        );

        async {
            match state.notifier.deliver(&event).await {
                Ok(_) => {
                    info!("Notification delivered");
                    if let Err(e) = state.outbox_repo.mark_status(&event.id, "SENT", None).await {
                        error!("Failed to mark outbox event sent: {:?}", e);
                    }
                }
                Err(e) => {
                    let err_msg = format!("{}", e);
                    error!("Notification delivery failed: {}", err_msg);
                    if let Err(up_err) = state
                        .outbox_repo
                        .mark_status(&event.id, "FAILED", Some(err_msg))
                        .await
                    {
                        error!("Failed to mark outbox event failed: {:?}", up_err);
                    }
                }
            }
        }
        .instrument(span)
        .await;
    }
}

pub async fn run_sweep(state: &Arc<AppState>) {
    let now = Utc::now();

    // Abandoned checkouts: same primitive the inline reap uses, so the
    // two purge paths cannot disagree.
    match state.reservation_repo.delete_expired_pending(None).await {
        Ok(purged) if purged > 0 => info!(purged, "swept expired pending reservations"),
        Ok(_) => {}
        Err(e) => error!("Expired-reservation sweep failed: {:?}", e),
    }

    match state.reservation_repo.complete_elapsed(now).await {
        Ok(completed) if completed > 0 => info!(completed, "marked elapsed sessions completed"),
        Ok(_) => {}
        Err(e) => error!("Completion sweep failed: {:?}", e),
    }

    let until = now + ChronoDuration::minutes(state.config.reminder_lead_minutes);
    let due = match state.reservation_repo.find_due_reminders(until).await {
        Ok(due) => due,
        Err(e) => {
            error!("Reminder query failed: {:?}", e);
            return;
        }
    };

    for reminder in due {
        let event = OutboxEvent::new(
            EVENT_RESERVATION_REMINDER,
            reminder.user_id.clone(),
            reminder.reservation_id.clone(),
            reminder.program_id.clone(),
            format!(
                "Your \"{}\" mentoring session starts at {}.",
                reminder.title,
                reminder.start_time.to_rfc3339()
            ),
        );
        if let Err(e) = state
            .reservation_repo
            .mark_reminder_sent(&reminder.reservation_id, &event)
            .await
        {
            error!(reservation_id = %reminder.reservation_id, "Failed to enqueue reminder: {:?}", e);
        }
    }
}

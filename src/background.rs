use std::sync::Arc;
use chrono::{TimeDelta, Utc};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, info_span, Instrument};
use crate::state::AppState;
use crate::domain::models::notification::Notification;
use crate::domain::ports::RealtimeEvent;
use crate::domain::services::calendar::generate_ics;
use crate::error::AppError;
use crate::infra::factory::NOTIFICATION_TEMPLATE;

const BATCH_SIZE: i64 = 20;
const POLL_INTERVAL: Duration = Duration::from_secs(5);
/// A claim older than this is treated as abandoned and delivered again.
const CLAIM_TIMEOUT_SECS: i64 = 120;
const INVITE_FILENAME: &str = "sesion.ics";
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

pub async fn start_background_worker(state: Arc<AppState>) {
    info!("Starting background delivery worker...");

    loop {
        run_once(&state).await;
        sleep(POLL_INTERVAL).await;
    }
}

/// One polling pass: deliver newly queued notifications, then retry sessions
/// whose video provisioning failed.
pub async fn run_once(state: &Arc<AppState>) {
    let stale_before = Utc::now() - TimeDelta::seconds(CLAIM_TIMEOUT_SECS);
    match state.notification_repo.claim_undelivered(BATCH_SIZE, stale_before).await {
        Ok(batch) => {
            for notification in batch {
                let span = info_span!(
                    "notification_delivery",
                    notification_id = %notification.id,
                    user_id = %notification.user_id
                );

                async {
                    match deliver(state, &notification).await {
                        Ok(()) => info!("Notification delivered"),
                        Err(e) => error!("Notification delivery failed, will retry after claim timeout: {}", e),
                    }
                }
                    .instrument(span)
                    .await;
            }
        }
        Err(e) => error!("Failed to claim pending notifications: {:?}", e),
    }

    match state.scheduler.retry_failed_provisioning(BATCH_SIZE).await {
        Ok(0) => {}
        Ok(recovered) => info!("Re-provisioned {} sessions", recovered),
        Err(e) => error!("Provisioning retry pass failed: {:?}", e),
    }
}

async fn deliver(state: &Arc<AppState>, notification: &Notification) -> Result<(), AppError> {
    state.publisher.publish(&notification.user_id, RealtimeEvent {
        title: notification.title.clone(),
        message: notification.message.clone(),
    });

    let user = state.user_repo.find_by_id(&notification.user_id).await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", notification.user_id)))?;

    let mut context = tera::Context::new();
    context.insert("title", &notification.title);
    context.insert("message", &notification.message);
    context.insert("user_name", &user.display_name());

    let mut invite = None;
    if let Some(session_id) = &notification.session_id {
        if let Some(session) = state.session_repo.find_by_id(session_id).await? {
            let course_title = state.course_repo.find_by_id(&session.course_id).await?
                .map(|c| c.title)
                .unwrap_or_default();

            context.insert("session_title", &session.title);
            context.insert("course_title", &course_title);
            context.insert("start_time", &state.clock.display(session.start_time).format(DISPLAY_FORMAT).to_string());
            context.insert("end_time", &state.clock.display(session.end_time).format(DISPLAY_FORMAT).to_string());
            context.insert("call_link", &session.call_link);

            invite = Some(generate_ics(&session, &course_title));
        }
    }

    let html = state.templates.render(NOTIFICATION_TEMPLATE, &context).map_err(|e| {
        error!("Tera render error: {:?}", e);
        AppError::InternalWithMsg(format!("Tera render error: {:?}", e))
    })?;

    state.email_service.send(
        &user.email,
        &notification.title,
        &html,
        invite.as_ref().map(|_| INVITE_FILENAME),
        invite.as_deref().map(str::as_bytes),
    ).await?;

    state.notification_repo.mark_emailed(&notification.id).await
}

use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::{
    calendar::{WeekWindow, WeeklyCalendar},
    enrollment::InvitationStatus,
    session::SessionDetails,
    user::Role,
};
use crate::domain::services::calendar::{build_weekly_calendar, week_containing};
use crate::error::AppError;
use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::debug;

/// The current display-zone week, plus the same bounds on the storage clock.
fn current_week(state: &AppState) -> (NaiveDateTime, WeekWindow, NaiveDateTime, NaiveDateTime) {
    let now = state.clock.now_in_display_zone();
    let week = week_containing(now);
    let from = state.clock.from_display_zone(week.start);
    let to = state.clock.from_display_zone(week.end);
    (now, week, from, to)
}

fn assemble(state: &AppState, sessions: &[SessionDetails], now: NaiveDateTime, week: WeekWindow) -> WeeklyCalendar {
    let entries = build_weekly_calendar(sessions, &state.clock, now, week);
    debug!("Calendar week {} .. {}: {} entries", week.start, week.end, entries.len());
    WeeklyCalendar {
        total: entries.len(),
        entries,
        week_start: week.start,
        week_end: week.end,
        now,
    }
}

pub async fn teacher_calendar(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(teacher_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Role::Teacher)?;
    if caller.id != teacher_id {
        return Err(AppError::Forbidden("No puedes ver el calendario de otro profesor".into()));
    }

    if state.course_repo.count_by_teacher(&teacher_id).await? == 0 {
        return Err(AppError::NotFound("No tienes cursos asignados".into()));
    }

    let (now, week, from, to) = current_week(&state);
    let sessions = state.session_repo.details_for_teacher(&teacher_id, from, to).await?;
    Ok(Json(assemble(&state, &sessions, now, week)))
}

pub async fn student_calendar(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(student_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Role::Student)?;
    if caller.id != student_id {
        return Err(AppError::Forbidden("No puedes ver el calendario de otro estudiante".into()));
    }

    if state.enrollment_repo.count_by_student(&student_id, InvitationStatus::Accepted).await? == 0 {
        return Err(AppError::NotFound("No está inscrito en ningún curso".into()));
    }

    let (now, week, from, to) = current_week(&state);
    let sessions = state.session_repo.details_for_student(&student_id, from, to).await?;
    Ok(Json(assemble(&state, &sessions, now, week)))
}

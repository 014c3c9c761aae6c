use axum::{
    extract::{State, Path},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::CreateSessionRequest;
use crate::api::handlers::course::owned_course;
use crate::domain::models::{
    enrollment::InvitationStatus,
    session::{CallRole, ParticipantProfile},
    user::Role,
};
use crate::domain::services::{calendar::list_course_sessions, scheduler::ScheduleRequest};
use crate::error::AppError;
use std::sync::Arc;

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    headers: HeaderMap,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let origin_url = payload.origin_url
        .or_else(|| headers.get(header::ORIGIN).and_then(|v| v.to_str().ok()).map(str::to_string))
        .ok_or(AppError::Validation("origin_url is required to build the call link".into()))?;

    let request = ScheduleRequest {
        course_id: payload.course_id,
        title: payload.title,
        description: payload.description,
        start: payload.start_time,
        end: payload.end_time,
        origin_url,
    };

    let scheduled = state.scheduler.schedule_session(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(scheduled)))
}

pub async fn list_sessions_for_course(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let course = state.course_repo.find_by_id(&course_id).await?
        .ok_or(AppError::NotFound("Curso no encontrado".into()))?;

    match caller.role {
        Role::Teacher if course.teacher_id == caller.id => {}
        Role::Student => {
            let enrolled = state.enrollment_repo.find(&course.id, &caller.id).await?
                .is_some_and(|e| e.status == InvitationStatus::Accepted);
            if !enrolled {
                return Err(AppError::Forbidden("No estás inscrito en este curso".into()));
            }
        }
        _ => return Err(AppError::Forbidden("Acceso denegado".into())),
    }

    let sessions = state.session_repo.details_for_course(&course.id).await?;
    let entries = list_course_sessions(&sessions, &state.clock, state.clock.now_in_display_zone());
    Ok(Json(entries))
}

/// Students invited to a session; the host is left out.
pub async fn list_participants(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Role::Teacher)?;
    let session = state.session_repo.find_by_id(&session_id).await?
        .ok_or(AppError::NotFound("Sesión no encontrada".into()))?;
    owned_course(&state, &caller, &session.course_id).await?;

    let participants: Vec<_> = state.session_repo.list_participants(&session.id).await?
        .into_iter()
        .filter(|p| p.role == CallRole::Participant)
        .map(|p| {
            let joined_at = state.clock.to_display_zone(p.joined_at);
            ParticipantProfile { joined_at, ..p }
        })
        .collect();
    Ok(Json(participants))
}

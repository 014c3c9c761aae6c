use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::responses::JoinCallResponse;
use crate::domain::models::{calendar::SessionStatus, enrollment::InvitationStatus, user::Role};
use crate::domain::services::calendar::derive_status;
use crate::error::AppError;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Issues a video-provider token for a course member. The call id returned is
/// that of the ongoing session, or else the next one.
pub async fn join_call(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let course = state.course_repo.find_by_id(&course_id).await?
        .ok_or(AppError::NotFound("Curso no encontrado".into()))?;

    let is_owner = caller.is(Role::Teacher) && course.teacher_id == caller.id;
    let is_member = state.enrollment_repo.find(&course.id, &caller.id).await?
        .is_some_and(|e| e.status == InvitationStatus::Accepted);
    if !is_owner && !is_member {
        return Err(AppError::Forbidden("No perteneces a este curso".into()));
    }

    let user = state.user_repo.find_by_id(&caller.id).await?
        .ok_or(AppError::NotFound("Usuario no encontrado".into()))?;

    state.video_provider.upsert_user(&user.id, &user.display_name()).await?;
    let token = state.video_provider.create_user_token(&user.id)?;

    let now = Utc::now().naive_utc();
    let call_id = state.session_repo.details_for_course(&course.id).await?
        .into_iter()
        .map(|d| d.session)
        .find(|s| derive_status(s.start_time, s.end_time, now) != SessionStatus::Concluded)
        .map(|s| s.call_id);

    info!("Issued call token for {} in course {}", user.id, course.id);
    Ok(Json(JoinCallResponse {
        authorized: true,
        user_id: user.id,
        course_id: course.id,
        call_id,
        token,
    }))
}

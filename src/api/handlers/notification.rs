use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::responses::MarkedReadResponse;
use crate::domain::models::auth::Caller;
use crate::error::AppError;
use std::sync::Arc;

fn ensure_own(caller: &Caller, user_id: &str) -> Result<(), AppError> {
    if caller.id != user_id {
        return Err(AppError::Forbidden("No puedes ver notificaciones de otro usuario".into()));
    }
    Ok(())
}

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    ensure_own(&caller, &user_id)?;
    Ok(Json(state.notification_repo.list_by_user(&user_id).await?))
}

pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    ensure_own(&caller, &user_id)?;
    let updated = state.notification_repo.mark_all_read(&user_id).await?;
    Ok(Json(MarkedReadResponse { updated }))
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(notification_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let notification = state.notification_repo.find_by_id(&notification_id).await?
        .ok_or(AppError::NotFound("Notificación no encontrada".into()))?;
    ensure_own(&caller, &notification.user_id)?;

    state.notification_repo.mark_read(&notification.id).await?;
    Ok(Json(MarkedReadResponse { updated: 1 }))
}

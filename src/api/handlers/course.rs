use axum::{extract::{State, Path, Query}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{CreateCourseRequest, CourseListQuery};
use crate::api::dtos::responses::{CountResponse, CourseDetailsResponse, MemberSummary};
use crate::domain::models::{
    auth::Caller,
    course::{Course, CourseStatus},
    enrollment::{Enrollment, InvitationStatus},
    notification::Notice,
    user::Role,
};
use crate::error::AppError;
use std::sync::Arc;
use tracing::{info, warn};

/// Loads a course and checks the caller is the teacher who owns it.
pub(crate) async fn owned_course(state: &AppState, caller: &Caller, course_id: &str) -> Result<Course, AppError> {
    caller.require(Role::Teacher)?;
    let course = state.course_repo.find_by_id(course_id).await?
        .ok_or(AppError::NotFound("Curso no encontrado".into()))?;
    if course.teacher_id != caller.id {
        return Err(AppError::Forbidden("Acceso denegado".into()));
    }
    Ok(course)
}

pub async fn create_course(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Role::Teacher)
        .map_err(|_| AppError::Forbidden("No tienes los permisos requeridos".into()))?;

    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::Validation("Course title is required".into()));
    }

    let teacher = state.user_repo.find_by_id(&caller.id).await?
        .ok_or(AppError::NotFound("Profesor no encontrado".into()))?;

    if state.course_repo.find_by_teacher_and_title(&teacher.id, &title).await?.is_some() {
        return Err(AppError::Conflict("No se puede repetir nombre de curso".into()));
    }

    let owned = state.course_repo.count_by_teacher(&teacher.id).await?;
    if owned >= i64::from(teacher.max_courses) {
        return Err(AppError::Validation(format!("No puedes crear más de {} cursos", teacher.max_courses)));
    }

    let course = Course::new(teacher.id, title, payload.description);
    let created = state.course_repo.create(&course).await?;

    info!("Created course {} for teacher {}", created.id, created.teacher_id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Query(query): Query<CourseListQuery>,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Role::Teacher)?;
    let courses = state.course_repo.list_by_teacher(&caller.id, query.status_filter()?).await?;
    Ok(Json(courses))
}

async fn set_course_status(state: &AppState, caller: &Caller, course_id: &str, status: CourseStatus) -> Result<Course, AppError> {
    let course = owned_course(state, caller, course_id).await?;
    let updated = state.course_repo.set_status(&course.id, status).await?;
    info!("Course {} is now {}", updated.id, status.as_str());
    Ok(updated)
}

pub async fn activate_course(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(set_course_status(&state, &caller, &course_id, CourseStatus::Active).await?))
}

pub async fn deactivate_course(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(set_course_status(&state, &caller, &course_id, CourseStatus::Inactive).await?))
}

pub async fn list_enrolled_courses(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Role::Student)?;
    Ok(Json(state.course_repo.list_enrolled(&caller.id).await?))
}

pub async fn list_available_courses(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Role::Student)?;
    Ok(Json(state.course_repo.list_available(&caller.id).await?))
}

pub async fn enroll(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Role::Student)?;

    if state.enrollment_repo.find(&course_id, &caller.id).await?.is_some() {
        return Err(AppError::Conflict("Ya estás inscrito en este curso".into()));
    }

    let course = state.course_repo.find_by_id(&course_id).await?
        .ok_or(AppError::NotFound("Curso no encontrado".into()))?;
    if course.status != CourseStatus::Active {
        return Err(AppError::Validation("El curso no está activo".into()));
    }

    let student = state.user_repo.find_by_id(&caller.id).await?
        .ok_or(AppError::NotFound("Estudiante no encontrado".into()))?;
    let teacher = state.user_repo.find_by_id(&course.teacher_id).await?
        .ok_or(AppError::NotFound("Profesor no encontrado".into()))?;

    let enrollment = Enrollment::new(course.id.clone(), student.id.clone(), InvitationStatus::Accepted);
    let created = state.enrollment_repo.create(&enrollment).await?;

    let notice = Notice {
        user_id: teacher.id.clone(),
        title: "Nuevo estudiante inscrito".into(),
        message: format!("El estudiante {} se ha inscrito en tu curso: {}.", student.display_name(), course.title),
        session_id: None,
    };
    if let Err(e) = state.notifier.notify(notice).await {
        warn!("Failed to notify teacher {} about enrollment: {:?}", teacher.id, e);
    }

    info!("Student {} enrolled in course {}", student.id, course.id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn active_course_count(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Role::Teacher)?;
    let active = state.course_repo.list_by_teacher(&caller.id, Some(CourseStatus::Active)).await?;
    Ok(Json(CountResponse { count: active.len() }))
}

/// A course with its owner and accepted students, as shown to students.
pub async fn course_details(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Role::Student)?;

    let course = state.course_repo.find_by_id(&course_id).await?
        .ok_or(AppError::NotFound("Curso no encontrado".into()))?;

    let enrollments = state.enrollment_repo.list_by_course(&course.id, InvitationStatus::Accepted).await?;
    if enrollments.is_empty() {
        return Err(AppError::NotFound("No se encontraron estudiantes inscritos".into()));
    }

    let mut students = Vec::with_capacity(enrollments.len());
    for enrollment in &enrollments {
        match state.user_repo.find_by_id(&enrollment.student_id).await? {
            Some(student) => students.push(MemberSummary::from(student)),
            None => warn!("Enrollment {} points at missing user {}", enrollment.id, enrollment.student_id),
        }
    }

    let teacher = state.user_repo.find_by_id(&course.teacher_id).await?
        .ok_or(AppError::NotFound("Profesor no encontrado".into()))?;

    Ok(Json(CourseDetailsResponse { course, teacher: teacher.into(), students }))
}

pub async fn admin_course_overview(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Role::Admin)?;
    Ok(Json(state.course_repo.list_overview().await?))
}

use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{calendar, call, course, health, notification, session};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Teacher courses
        .route("/api/v1/courses", post(course::create_course).get(course::list_courses))
        .route("/api/v1/courses/{id}/activate", put(course::activate_course))
        .route("/api/v1/courses/{id}/deactivate", put(course::deactivate_course))
        .route("/api/v1/courses/active/count", get(course::active_course_count))

        // Student courses
        .route("/api/v1/students/courses", get(course::list_enrolled_courses))
        .route("/api/v1/students/courses/available", get(course::list_available_courses))
        .route("/api/v1/students/courses/{id}/enroll", post(course::enroll))
        .route("/api/v1/students/courses/{id}/details", get(course::course_details))

        // Admin
        .route("/api/v1/admin/courses", get(course::admin_course_overview))

        // Sessions
        .route("/api/v1/sessions", post(session::create_session))
        .route("/api/v1/courses/{id}/sessions", get(session::list_sessions_for_course))
        .route("/api/v1/sessions/{id}/participants", get(session::list_participants))

        // Calendars
        .route("/api/v1/calendar/teacher/{id}", get(calendar::teacher_calendar))
        .route("/api/v1/calendar/student/{id}", get(calendar::student_calendar))

        // Calls
        .route("/api/v1/courses/{id}/join", post(call::join_call))

        // Notifications
        .route("/api/v1/notifications/{user_id}", get(notification::list_notifications))
        .route("/api/v1/notifications/{user_id}/read-all", put(notification::mark_all_read))
        .route("/api/v1/notifications/item/{id}/read", put(notification::mark_read))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

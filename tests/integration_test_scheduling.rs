mod common;

use axum::http::StatusCode;
use classroom_backend::background::run_once;
use classroom_backend::domain::models::{enrollment::InvitationStatus, user::Role};
use common::{TestApp, ORIGIN};

const MONDAY_14: &str = "2030-03-11T14:00:00";
const MONDAY_15: &str = "2030-03-11T15:00:00";

#[tokio::test]
async fn overlapping_session_is_rejected_with_the_colliding_window() {
    let app = TestApp::new().await;
    let teacher = app.seed_user("Ada", "Lovelace", Role::Teacher).await;
    let course = app.seed_course(&teacher, "Matemáticas").await;

    let (status, first) = app.schedule(&teacher, &course, "Álgebra", MONDAY_14, MONDAY_15).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.schedule(&teacher, &course, "Geometría", "2030-03-11T14:30:00", "2030-03-11T15:30:00").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"],
        "Ya tienes una sesión en ese horario: Álgebra (2030-03-11 14:00:00 → 2030-03-11 15:00:00)"
    );
    assert_eq!(body["conflicting_session_id"], first["session"]["id"]);
    assert_eq!(app.count("SELECT COUNT(*) FROM sessions").await, 1);
}

#[tokio::test]
async fn back_to_back_sessions_are_allowed() {
    let app = TestApp::new().await;
    let teacher = app.seed_user("Ada", "Lovelace", Role::Teacher).await;
    let course = app.seed_course(&teacher, "Matemáticas").await;

    let (status, _) = app.schedule(&teacher, &course, "First", MONDAY_14, MONDAY_15).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.schedule(&teacher, &course, "After", MONDAY_15, "2030-03-11T16:00:00").await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.schedule(&teacher, &course, "Before", "2030-03-11T13:00:00", MONDAY_14).await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(app.count("SELECT COUNT(*) FROM sessions").await, 3);
}

#[tokio::test]
async fn repeating_the_same_request_persists_one_session() {
    let app = TestApp::new().await;
    let teacher = app.seed_user("Ada", "Lovelace", Role::Teacher).await;
    let course = app.seed_course(&teacher, "Matemáticas").await;

    let (first, _) = app.schedule(&teacher, &course, "Repaso", MONDAY_14, MONDAY_15).await;
    let (second, _) = app.schedule(&teacher, &course, "Repaso", MONDAY_14, MONDAY_15).await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(app.count("SELECT COUNT(*) FROM sessions").await, 1);
}

#[tokio::test]
async fn conflicts_span_all_courses_of_the_teacher() {
    let app = TestApp::new().await;
    let teacher = app.seed_user("Ada", "Lovelace", Role::Teacher).await;
    let other_teacher = app.seed_user("Alan", "Turing", Role::Teacher).await;
    let math = app.seed_course(&teacher, "Matemáticas").await;
    let physics = app.seed_course(&teacher, "Física").await;
    let logic = app.seed_course(&other_teacher, "Lógica").await;

    let (status, _) = app.schedule(&teacher, &math, "Álgebra", MONDAY_14, MONDAY_15).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.schedule(&teacher, &physics, "Cinemática", "2030-03-11T14:15:00", "2030-03-11T14:45:00").await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Another teacher's calendar is independent.
    let (status, _) = app.schedule(&other_teacher, &logic, "Silogismos", MONDAY_14, MONDAY_15).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn offset_bearing_input_is_normalized_before_checking() {
    let app = TestApp::new().await;
    let teacher = app.seed_user("Ada", "Lovelace", Role::Teacher).await;
    let course = app.seed_course(&teacher, "Matemáticas").await;

    let (status, body) = app.schedule(&teacher, &course, "Zoned", "2030-03-11T20:00:00Z", "2030-03-11T21:00:00Z").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["session"]["start_time"], "2030-03-11T20:00:00");

    // 14:30 in the display zone (UTC-6) is inside the stored 20:00-21:00 UTC window.
    let (status, _) = app.schedule(&teacher, &course, "Local", "2030-03-11T14:30:00", "2030-03-11T14:45:00").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.schedule(&teacher, &course, "Offset", "2030-03-11T15:00:00-06:00", "2030-03-11T16:00:00-06:00").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn roster_contains_host_and_accepted_students_only() {
    let app = TestApp::new().await;
    let teacher = app.seed_user("Ada", "Lovelace", Role::Teacher).await;
    let course = app.seed_course(&teacher, "Matemáticas").await;
    let ana = app.seed_user("Ana", "Pérez", Role::Student).await;
    let luis = app.seed_user("Luis", "Gómez", Role::Student).await;
    let pending = app.seed_user("Marta", "Ruiz", Role::Student).await;
    app.seed_enrollment(&course, &ana, InvitationStatus::Accepted).await;
    app.seed_enrollment(&course, &luis, InvitationStatus::Accepted).await;
    app.seed_enrollment(&course, &pending, InvitationStatus::Pending).await;

    let (status, body) = app.schedule(&teacher, &course, "Álgebra", MONDAY_14, MONDAY_15).await;
    assert_eq!(status, StatusCode::CREATED);

    let roster = body["roster"].as_array().unwrap();
    assert_eq!(roster.len(), 3);
    assert_eq!(roster[0]["user_id"], teacher.id.as_str());
    assert_eq!(roster[0]["role"], "HOST");
    assert_eq!(roster[0]["display_name"], "Ada Lovelace");
    assert!(roster.iter().all(|r| r["user_id"] != pending.id.as_str()));
    assert_eq!(roster.iter().filter(|r| r["role"] == "PARTICIPANT").count(), 2);

    let session = &body["session"];
    let call_id = session["call_id"].as_str().unwrap();
    assert_eq!(session["video_quality"], "4K");
    assert_eq!(session["call_link"], format!("{}/call/{}/{}", ORIGIN, call_id, course.id));

    assert_eq!(app.count("SELECT COUNT(*) FROM participants").await, 3);
    assert_eq!(app.count("SELECT COUNT(*) FROM participants WHERE role = 'HOST' AND joined_at IS NOT NULL").await, 1);
    assert_eq!(app.count("SELECT COUNT(*) FROM participants WHERE role = 'PARTICIPANT' AND joined_at IS NULL").await, 2);

    let calls = app.video.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, call_id);
    assert_eq!(calls[0].1, teacher.id);
    assert_eq!(calls[0].2.iter().filter(|m| m.role == "admin").count(), 1);
    assert_eq!(calls[0].2.iter().filter(|m| m.role == "user").count(), 2);
}

#[tokio::test]
async fn students_are_notified_but_the_teacher_is_not() {
    let app = TestApp::new().await;
    let teacher = app.seed_user("Ada", "Lovelace", Role::Teacher).await;
    let course = app.seed_course(&teacher, "Matemáticas").await;
    let ana = app.seed_user("Ana", "Pérez", Role::Student).await;
    app.seed_enrollment(&course, &ana, InvitationStatus::Accepted).await;

    let (status, _) = app.schedule(&teacher, &course, "Álgebra", MONDAY_14, MONDAY_15).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.request("GET", &format!("/api/v1/notifications/{}", ana.id), Some(&ana), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Nueva sesión");
    assert_eq!(items[0]["message"], "Tu profesor: Ada Lovelace ha creado una nueva sesión");
    assert_eq!(items[0]["status"], "PENDING");

    let (_, body) = app.request("GET", &format!("/api/v1/notifications/{}", teacher.id), Some(&teacher), None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn only_the_owning_teacher_may_schedule() {
    let app = TestApp::new().await;
    let teacher = app.seed_user("Ada", "Lovelace", Role::Teacher).await;
    let intruder = app.seed_user("Alan", "Turing", Role::Teacher).await;
    let student = app.seed_user("Ana", "Pérez", Role::Student).await;
    let course = app.seed_course(&teacher, "Matemáticas").await;

    let (status, body) = app.schedule(&student, &course, "Nope", MONDAY_14, MONDAY_15).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "No tienes permisos para crear llamadas");

    let (status, _) = app.schedule(&intruder, &course, "Nope", MONDAY_14, MONDAY_15).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut missing = course.clone();
    missing.id = "does-not-exist".into();
    let (status, _) = app.schedule(&teacher, &missing, "Nope", MONDAY_14, MONDAY_15).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(app.count("SELECT COUNT(*) FROM sessions").await, 0);
}

#[tokio::test]
async fn empty_or_inverted_ranges_are_rejected() {
    let app = TestApp::new().await;
    let teacher = app.seed_user("Ada", "Lovelace", Role::Teacher).await;
    let course = app.seed_course(&teacher, "Matemáticas").await;

    let (status, _) = app.schedule(&teacher, &course, "Empty", MONDAY_14, MONDAY_14).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.schedule(&teacher, &course, "Inverted", MONDAY_15, MONDAY_14).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.schedule(&teacher, &course, "Garbage", "tomorrow", MONDAY_14).await;
    assert!(status.is_client_error());

    assert_eq!(app.count("SELECT COUNT(*) FROM sessions").await, 0);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = TestApp::new().await;
    let (status, _) = app.request("POST", "/api/v1/sessions", None, Some(serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn provisioning_failure_keeps_the_session_and_is_retried() {
    let app = TestApp::new().await;
    let teacher = app.seed_user("Ada", "Lovelace", Role::Teacher).await;
    let course = app.seed_course(&teacher, "Matemáticas").await;
    let ana = app.seed_user("Ana", "Pérez", Role::Student).await;
    app.seed_enrollment(&course, &ana, InvitationStatus::Accepted).await;

    app.video.set_failing(true);
    let (status, body) = app.schedule(&teacher, &course, "Álgebra", MONDAY_14, MONDAY_15).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["provisioning"]["status"], "failed");
    assert!(body["provisioning"]["warning"].as_str().unwrap().contains("video service unavailable"));
    assert_eq!(body["session"]["provisioning_status"], "failed");
    assert_eq!(app.count("SELECT COUNT(*) FROM sessions WHERE provisioning_status = 'failed'").await, 1);

    app.video.set_failing(false);
    run_once(&app.state).await;

    assert_eq!(app.count("SELECT COUNT(*) FROM sessions WHERE provisioning_status = 'provisioned'").await, 1);
    let calls = app.video.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, teacher.id);
    assert_eq!(calls[0].2.len(), 2);
}

#[tokio::test]
async fn persistently_failing_sessions_do_not_starve_newer_retries() {
    let app = TestApp::new().await;
    let teacher = app.seed_user("Ada", "Lovelace", Role::Teacher).await;
    let course = app.seed_course(&teacher, "Matemáticas").await;

    app.video.set_failing(true);
    let mut call_ids = Vec::new();
    for hour in 0..21 {
        let start = format!("2030-03-11T{:02}:00:00", hour);
        let end = format!("2030-03-11T{:02}:30:00", hour);
        let (status, body) = app.schedule(&teacher, &course, &format!("Sesión {}", hour), &start, &end).await;
        assert_eq!(status, StatusCode::CREATED);
        call_ids.push(body["session"]["call_id"].as_str().unwrap().to_string());
    }
    assert_eq!(app.count("SELECT COUNT(*) FROM sessions WHERE provisioning_status = 'failed'").await, 21);

    // The provider recovers for everyone except the twenty oldest rooms.
    app.video.set_failing(false);
    app.video.failing_rooms.lock().unwrap().extend(call_ids[..20].iter().cloned());

    let first = app.state.scheduler.retry_failed_provisioning(20).await.unwrap();
    assert_eq!(first, 0);
    let second = app.state.scheduler.retry_failed_provisioning(20).await.unwrap();
    assert_eq!(second, 1);

    let newest = &call_ids[20];
    let provisioned: String = sqlx::query_scalar("SELECT provisioning_status FROM sessions WHERE call_id = ?")
        .bind(newest)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(provisioned, "provisioned");
    assert_eq!(app.count("SELECT COUNT(*) FROM sessions WHERE provisioning_status = 'failed'").await, 20);
}

#[tokio::test]
async fn roster_with_a_missing_student_is_rejected_before_persisting() {
    let app = TestApp::new().await;
    let teacher = app.seed_user("Ada", "Lovelace", Role::Teacher).await;
    let course = app.seed_course(&teacher, "Matemáticas").await;

    let mut conn = app.pool.acquire().await.unwrap();
    sqlx::query("PRAGMA foreign_keys = OFF").execute(&mut *conn).await.unwrap();
    sqlx::query("INSERT INTO enrollments (id, course_id, student_id, status, join_code, created_at) VALUES (?, ?, ?, 'Aceptada', ?, ?)")
        .bind("enr-ghost")
        .bind(&course.id)
        .bind("ghost")
        .bind("JOIN-GHOST")
        .bind(chrono::Utc::now())
        .execute(&mut *conn)
        .await
        .unwrap();
    sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await.unwrap();
    drop(conn);

    let (status, body) = app.schedule(&teacher, &course, "Álgebra", MONDAY_14, MONDAY_15).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Usuario ghost no encontrado");
    assert_eq!(app.count("SELECT COUNT(*) FROM sessions").await, 0);
    assert_eq!(app.count("SELECT COUNT(*) FROM participants").await, 0);
    assert!(app.video.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_overlapping_requests_commit_once() {
    let app = TestApp::new().await;
    let teacher = app.seed_user("Ada", "Lovelace", Role::Teacher).await;
    let math = app.seed_course(&teacher, "Matemáticas").await;
    let physics = app.seed_course(&teacher, "Física").await;

    let (a, b) = tokio::join!(
        app.schedule(&teacher, &math, "A", MONDAY_14, MONDAY_15),
        app.schedule(&teacher, &physics, "B", "2030-03-11T14:30:00", "2030-03-11T15:30:00"),
    );

    let mut statuses = vec![a.0, b.0];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);
    assert_eq!(app.count("SELECT COUNT(*) FROM sessions").await, 1);
}

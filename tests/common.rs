#![allow(dead_code)]

use classroom_backend::{
    api::router::create_router,
    config::Config,
    domain::{
        models::{
            auth::Claims,
            course::Course,
            enrollment::{Enrollment, InvitationStatus},
            user::{Role, User},
        },
        ports::{CallMember, EmailService, VideoProvider},
        services::time_normalizer::TimeNormalizer,
    },
    error::AppError,
    infra::{
        factory::load_templates,
        realtime::broadcast_publisher::BroadcastPublisher,
        repositories::{
            sqlite_course_repo::SqliteCourseRepo, sqlite_enrollment_repo::SqliteEnrollmentRepo,
            sqlite_notification_repo::SqliteNotificationRepo, sqlite_session_repo::SqliteSessionRepo,
            sqlite_user_repo::SqliteUserRepo,
        },
    },
    state::{AppState, Collaborators},
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret";
pub const DISPLAY_OFFSET_HOURS: i32 = -6;
pub const ORIGIN: &str = "https://aula.example";

#[derive(Default)]
pub struct MockVideoProvider {
    pub failing: AtomicBool,
    pub upserted: Mutex<Vec<String>>,
    pub calls: Mutex<Vec<(String, String, Vec<CallMember>)>>,
    /// Rooms the provider keeps refusing even when it is otherwise up.
    pub failing_rooms: Mutex<HashSet<String>>,
}

impl MockVideoProvider {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl VideoProvider for MockVideoProvider {
    async fn upsert_user(&self, user_id: &str, _display_name: &str) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Provider("video service unavailable".into()));
        }
        self.upserted.lock().unwrap().push(user_id.to_string());
        Ok(())
    }

    async fn create_or_get_call(&self, room_id: &str, creator_id: &str, members: &[CallMember]) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) || self.failing_rooms.lock().unwrap().contains(room_id) {
            return Err(AppError::Provider("video service unavailable".into()));
        }
        self.calls.lock().unwrap().push((room_id.to_string(), creator_id.to_string(), members.to_vec()));
        Ok(())
    }

    fn create_user_token(&self, user_id: &str) -> Result<String, AppError> {
        Ok(format!("video-token-{}", user_id))
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
    pub attachment_name: Option<String>,
    pub attachment: Option<String>,
}

#[derive(Default)]
pub struct MockEmailService {
    pub failing: AtomicBool,
    pub sent: Mutex<Vec<SentEmail>>,
}

impl MockEmailService {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
        attachment_name: Option<&str>,
        attachment_data: Option<&[u8]>
    ) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::InternalWithMsg("mail service unavailable".into()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
            attachment_name: attachment_name.map(str::to_string),
            attachment: attachment_data.map(|d| String::from_utf8_lossy(d).into_owned()),
        });
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub video: Arc<MockVideoProvider>,
    pub email: Arc<MockEmailService>,
    pub publisher: Arc<BroadcastPublisher>,
    pub clock: TimeNormalizer,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            jwt_secret: TEST_JWT_SECRET.to_string(),
            display_offset_hours: DISPLAY_OFFSET_HOURS,
            video_api_url: "http://localhost".to_string(),
            video_api_key: "key".to_string(),
            video_api_secret: "secret".to_string(),
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: "token".to_string(),
        };

        let clock = TimeNormalizer::new(DISPLAY_OFFSET_HOURS).unwrap();
        let video = Arc::new(MockVideoProvider::default());
        let email = Arc::new(MockEmailService::default());
        let publisher = Arc::new(BroadcastPublisher::new(64));

        let parts = Collaborators {
            user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
            course_repo: Arc::new(SqliteCourseRepo::new(pool.clone())),
            enrollment_repo: Arc::new(SqliteEnrollmentRepo::new(pool.clone())),
            session_repo: Arc::new(SqliteSessionRepo::new(pool.clone())),
            notification_repo: Arc::new(SqliteNotificationRepo::new(pool.clone())),
            video_provider: video.clone(),
            email_service: email.clone(),
            publisher: publisher.clone(),
        };

        let state = Arc::new(AppState::assemble(config, clock, parts, Arc::new(load_templates())));
        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            video,
            email,
            publisher,
            clock,
        }
    }

    pub async fn seed_user(&self, first_name: &str, last_name: &str, role: Role) -> User {
        let email = format!("{}.{}@{}.test", first_name.to_lowercase(), Uuid::new_v4().simple(), last_name.to_lowercase());
        let user = User::new(first_name.to_string(), last_name.to_string(), email, role);
        self.state.user_repo.create(&user).await.unwrap()
    }

    pub async fn seed_course(&self, teacher: &User, title: &str) -> Course {
        let course = Course::new(teacher.id.clone(), title.to_string(), format!("{} description", title));
        self.state.course_repo.create(&course).await.unwrap()
    }

    pub async fn seed_enrollment(&self, course: &Course, student: &User, status: InvitationStatus) -> Enrollment {
        let enrollment = Enrollment::new(course.id.clone(), student.id.clone(), status);
        self.state.enrollment_repo.create(&enrollment).await.unwrap()
    }

    pub fn token_for(&self, user: &User) -> String {
        let claims = Claims {
            sub: user.id.clone(),
            role: user.role.as_str().to_string(),
            exp: 4_102_444_800,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes())).unwrap()
    }

    pub async fn request(&self, method: &str, uri: &str, user: Option<&User>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token_for(user)));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, parse_body(response).await)
    }

    /// Schedules a session over HTTP with offset-less display-zone times.
    pub async fn schedule(&self, teacher: &User, course: &Course, title: &str, start: &str, end: &str) -> (StatusCode, Value) {
        let payload = serde_json::json!({
            "course_id": course.id,
            "title": title,
            "description": format!("{} notes", title),
            "start_time": start,
            "end_time": end,
            "origin_url": ORIGIN,
        });
        self.request("POST", "/api/v1/sessions", Some(teacher), Some(payload)).await
    }

    pub async fn count(&self, sql: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(sql).fetch_one(&self.pool).await.unwrap()
    }
}

pub async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

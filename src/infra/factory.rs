use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;
use tera::Tera;

use crate::config::Config;
use crate::state::{AppState, Collaborators};
use crate::domain::ports::{EmailService, EventPublisher, VideoProvider};
use crate::domain::services::time_normalizer::TimeNormalizer;
use crate::infra::email::http_email_service::HttpEmailService;
use crate::infra::realtime::broadcast_publisher::BroadcastPublisher;
use crate::infra::video::http_video_provider::HttpVideoProvider;
use crate::infra::repositories::{
    postgres_user_repo::PostgresUserRepo, postgres_course_repo::PostgresCourseRepo,
    postgres_enrollment_repo::PostgresEnrollmentRepo, postgres_session_repo::PostgresSessionRepo,
    postgres_notification_repo::PostgresNotificationRepo,
    sqlite_user_repo::SqliteUserRepo, sqlite_course_repo::SqliteCourseRepo,
    sqlite_enrollment_repo::SqliteEnrollmentRepo, sqlite_session_repo::SqliteSessionRepo,
    sqlite_notification_repo::SqliteNotificationRepo,
};

pub const NOTIFICATION_TEMPLATE: &str = "notification.html";
const REALTIME_CAPACITY: usize = 256;

pub fn load_templates() -> Tera {
    let mut tera = Tera::default();
    tera.add_raw_template(NOTIFICATION_TEMPLATE, include_str!("../templates/notification.html"))
        .expect("Failed to load notification template");
    tera
}

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;
    let clock = TimeNormalizer::new(config.display_offset_hours)
        .expect("DISPLAY_UTC_OFFSET_HOURS must be between -23 and 23");

    let email_service: Arc<dyn EmailService> = Arc::new(HttpEmailService::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
    ));
    let video_provider: Arc<dyn VideoProvider> = Arc::new(HttpVideoProvider::new(
        config.video_api_url.clone(),
        config.video_api_key.clone(),
        config.video_api_secret.clone(),
    ));
    let publisher: Arc<dyn EventPublisher> = Arc::new(BroadcastPublisher::new(REALTIME_CAPACITY));
    let templates = Arc::new(load_templates());

    let parts = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        Collaborators {
            user_repo: Arc::new(PostgresUserRepo::new(pool.clone())),
            course_repo: Arc::new(PostgresCourseRepo::new(pool.clone())),
            enrollment_repo: Arc::new(PostgresEnrollmentRepo::new(pool.clone())),
            session_repo: Arc::new(PostgresSessionRepo::new(pool.clone())),
            notification_repo: Arc::new(PostgresNotificationRepo::new(pool.clone())),
            video_provider,
            email_service,
            publisher,
        }
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        Collaborators {
            user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
            course_repo: Arc::new(SqliteCourseRepo::new(pool.clone())),
            enrollment_repo: Arc::new(SqliteEnrollmentRepo::new(pool.clone())),
            session_repo: Arc::new(SqliteSessionRepo::new(pool.clone())),
            notification_repo: Arc::new(SqliteNotificationRepo::new(pool.clone())),
            video_provider,
            email_service,
            publisher,
        }
    };

    info!("Display zone is UTC{:+}", config.display_offset_hours);
    AppState::assemble(config.clone(), clock, parts, templates)
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}

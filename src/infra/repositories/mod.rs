pub mod sqlite_user_repo;
pub mod sqlite_course_repo;
pub mod sqlite_enrollment_repo;
pub mod sqlite_session_repo;
pub mod sqlite_notification_repo;

pub mod postgres_user_repo;
pub mod postgres_course_repo;
pub mod postgres_enrollment_repo;
pub mod postgres_session_repo;
pub mod postgres_notification_repo;

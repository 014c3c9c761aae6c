use crate::domain::models::{
    user::User,
    course::{Course, CourseListing, CourseOverview, CourseStatus},
    enrollment::{Enrollment, InvitationStatus},
    session::{Session, Participant, ParticipantProfile, SessionDetails, ProvisioningStatus},
    notification::{Notice, Notification},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn create(&self, course: &Course) -> Result<Course, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Course>, AppError>;
    async fn find_by_teacher_and_title(&self, teacher_id: &str, title: &str) -> Result<Option<Course>, AppError>;
    async fn list_by_teacher(&self, teacher_id: &str, status: Option<CourseStatus>) -> Result<Vec<Course>, AppError>;
    async fn count_by_teacher(&self, teacher_id: &str) -> Result<i64, AppError>;
    async fn set_status(&self, id: &str, status: CourseStatus) -> Result<Course, AppError>;
    async fn list_enrolled(&self, student_id: &str) -> Result<Vec<CourseListing>, AppError>;
    async fn list_available(&self, student_id: &str) -> Result<Vec<CourseListing>, AppError>;
    async fn list_overview(&self) -> Result<Vec<CourseOverview>, AppError>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn create(&self, enrollment: &Enrollment) -> Result<Enrollment, AppError>;
    async fn find(&self, course_id: &str, student_id: &str) -> Result<Option<Enrollment>, AppError>;
    async fn list_by_course(&self, course_id: &str, status: InvitationStatus) -> Result<Vec<Enrollment>, AppError>;
    async fn count_by_student(&self, student_id: &str, status: InvitationStatus) -> Result<i64, AppError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Inserts the session and its participants atomically.
    ///
    /// Implementations serialize on the teacher's session set and re-run the
    /// overlap check inside the transaction, failing with
    /// `AppError::SchedulingConflict` when a concurrent request got there first.
    async fn create_with_participants(&self, teacher_id: &str, session: &Session, participants: &[Participant]) -> Result<Session, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Session>, AppError>;
    async fn list_by_teacher(&self, teacher_id: &str) -> Result<Vec<Session>, AppError>;
    async fn details_for_teacher(&self, teacher_id: &str, from: NaiveDateTime, to: NaiveDateTime) -> Result<Vec<SessionDetails>, AppError>;
    async fn details_for_student(&self, student_id: &str, from: NaiveDateTime, to: NaiveDateTime) -> Result<Vec<SessionDetails>, AppError>;
    async fn details_for_course(&self, course_id: &str) -> Result<Vec<SessionDetails>, AppError>;
    async fn list_participants(&self, session_id: &str) -> Result<Vec<ParticipantProfile>, AppError>;
    async fn set_provisioning_status(&self, id: &str, status: ProvisioningStatus) -> Result<(), AppError>;
    async fn list_by_provisioning_status(&self, status: ProvisioningStatus, limit: i64) -> Result<Vec<Session>, AppError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &Notification) -> Result<Notification, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Notification>, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Notification>, AppError>;
    async fn mark_read(&self, id: &str) -> Result<(), AppError>;
    async fn mark_all_read(&self, user_id: &str) -> Result<u64, AppError>;
    /// Claims up to `limit` notifications not yet emailed whose claim is absent
    /// or older than `stale_before`, oldest attempt first.
    async fn claim_undelivered(&self, limit: i64, stale_before: DateTime<Utc>) -> Result<Vec<Notification>, AppError>;
    async fn mark_emailed(&self, id: &str) -> Result<(), AppError>;
}

/// Hands a notice to whatever delivers it (in-app, email, realtime).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: Notice) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct CallMember {
    pub user_id: String,
    pub role: String,
}

#[async_trait]
pub trait VideoProvider: Send + Sync {
    async fn upsert_user(&self, user_id: &str, display_name: &str) -> Result<(), AppError>;
    async fn create_or_get_call(&self, room_id: &str, creator_id: &str, members: &[CallMember]) -> Result<(), AppError>;
    fn create_user_token(&self, user_id: &str) -> Result<String, AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str, attachment_name: Option<&str>, attachment_data: Option<&[u8]>) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct RealtimeEvent {
    pub title: String,
    pub message: String,
}

/// Connection-management seam: pushes an event to whatever transport the user is on.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, user_id: &str, event: RealtimeEvent);
}

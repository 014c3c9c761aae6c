use std::sync::Arc;
use crate::domain::ports::{
    CourseRepository, EmailService, EnrollmentRepository, EventPublisher, NotificationRepository,
    Notifier, SessionRepository, UserRepository, VideoProvider,
};
use crate::domain::services::{scheduler::SessionScheduler, time_normalizer::TimeNormalizer};
use crate::config::Config;
use tera::Tera;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub clock: TimeNormalizer,
    pub user_repo: Arc<dyn UserRepository>,
    pub course_repo: Arc<dyn CourseRepository>,
    pub enrollment_repo: Arc<dyn EnrollmentRepository>,
    pub session_repo: Arc<dyn SessionRepository>,
    pub notification_repo: Arc<dyn NotificationRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub scheduler: Arc<SessionScheduler>,
    pub video_provider: Arc<dyn VideoProvider>,
    pub email_service: Arc<dyn EmailService>,
    pub publisher: Arc<dyn EventPublisher>,
    pub templates: Arc<Tera>,
}

/// The persistence and delivery collaborators `AppState` is assembled from.
pub struct Collaborators {
    pub user_repo: Arc<dyn UserRepository>,
    pub course_repo: Arc<dyn CourseRepository>,
    pub enrollment_repo: Arc<dyn EnrollmentRepository>,
    pub session_repo: Arc<dyn SessionRepository>,
    pub notification_repo: Arc<dyn NotificationRepository>,
    pub video_provider: Arc<dyn VideoProvider>,
    pub email_service: Arc<dyn EmailService>,
    pub publisher: Arc<dyn EventPublisher>,
}

impl AppState {
    /// Wires the notifier and scheduler on top of the given collaborators.
    pub fn assemble(config: Config, clock: TimeNormalizer, parts: Collaborators, templates: Arc<Tera>) -> Self {
        let notifier: Arc<dyn Notifier> = Arc::new(
            crate::domain::services::notifier::InAppNotifier::new(parts.notification_repo.clone()),
        );
        let scheduler = Arc::new(SessionScheduler::new(
            parts.user_repo.clone(),
            parts.course_repo.clone(),
            parts.enrollment_repo.clone(),
            parts.session_repo.clone(),
            parts.video_provider.clone(),
            notifier.clone(),
            clock,
        ));

        Self {
            config,
            clock,
            user_repo: parts.user_repo,
            course_repo: parts.course_repo,
            enrollment_repo: parts.enrollment_repo,
            session_repo: parts.session_repo,
            notification_repo: parts.notification_repo,
            notifier,
            scheduler,
            video_provider: parts.video_provider,
            email_service: parts.email_service,
            publisher: parts.publisher,
            templates,
        }
    }
}

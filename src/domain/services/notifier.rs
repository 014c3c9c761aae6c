use std::sync::Arc;
use async_trait::async_trait;
use tracing::debug;
use crate::domain::{
    models::notification::{Notice, Notification},
    ports::{NotificationRepository, Notifier},
};
use crate::error::AppError;

/// Persists notices as pending in-app notifications; the background worker
/// picks them up for email and realtime delivery.
pub struct InAppNotifier {
    repo: Arc<dyn NotificationRepository>,
}

impl InAppNotifier {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl Notifier for InAppNotifier {
    async fn notify(&self, notice: Notice) -> Result<(), AppError> {
        let notification = Notification::from_notice(notice);
        let created = self.repo.create(&notification).await?;
        debug!("Queued notification {} for user {}", created.id, created.user_id);
        Ok(())
    }
}

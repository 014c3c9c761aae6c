use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    InApp,
    Email,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::InApp => "IN_APP",
            NotificationKind::Email => "EMAIL",
        }
    }
}

impl TryFrom<String> for NotificationKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "IN_APP" => Ok(NotificationKind::InApp),
            "EMAIL" => Ok(NotificationKind::Email),
            other => Err(format!("unknown notification kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Read,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "PENDING",
            NotificationStatus::Sent => "SENT",
            NotificationStatus::Read => "READ",
        }
    }
}

impl TryFrom<String> for NotificationStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "PENDING" => Ok(NotificationStatus::Pending),
            "SENT" => Ok(NotificationStatus::Sent),
            "READ" => Ok(NotificationStatus::Read),
            other => Err(format!("unknown notification status '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub session_id: Option<String>,
    pub title: String,
    pub message: String,
    #[sqlx(try_from = "String")]
    pub kind: NotificationKind,
    #[sqlx(try_from = "String")]
    pub status: NotificationStatus,
    #[serde(skip_serializing)]
    pub delivery_claimed_at: Option<DateTime<Utc>>,
    pub sent_at: DateTime<Utc>,
}

/// What a caller hands to the notifier: target user and content only.
#[derive(Debug, Clone)]
pub struct Notice {
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub session_id: Option<String>,
}

impl Notification {
    pub fn from_notice(notice: Notice) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: notice.user_id,
            session_id: notice.session_id,
            title: notice.title,
            message: notice.message,
            kind: NotificationKind::InApp,
            status: NotificationStatus::Pending,
            delivery_claimed_at: None,
            sent_at: Utc::now(),
        }
    }
}

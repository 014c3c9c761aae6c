use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoQuality {
    #[serde(rename = "480p")]
    Low,
    #[serde(rename = "720p")]
    Standard,
    #[serde(rename = "1080p")]
    High,
    #[serde(rename = "4K")]
    Ultra,
}

impl VideoQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoQuality::Low => "480p",
            VideoQuality::Standard => "720p",
            VideoQuality::High => "1080p",
            VideoQuality::Ultra => "4K",
        }
    }
}

impl TryFrom<String> for VideoQuality {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "480p" => Ok(VideoQuality::Low),
            "720p" => Ok(VideoQuality::Standard),
            "1080p" => Ok(VideoQuality::High),
            "4K" => Ok(VideoQuality::Ultra),
            other => Err(format!("unknown video quality '{}'", other)),
        }
    }
}

/// Stored and serialized with the same lowercase spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvisioningStatus {
    Pending,
    Provisioned,
    Failed,
}

impl ProvisioningStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisioningStatus::Pending => "pending",
            ProvisioningStatus::Provisioned => "provisioned",
            ProvisioningStatus::Failed => "failed",
        }
    }
}

impl TryFrom<String> for ProvisioningStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(ProvisioningStatus::Pending),
            "provisioned" => Ok(ProvisioningStatus::Provisioned),
            "failed" => Ok(ProvisioningStatus::Failed),
            other => Err(format!("unknown provisioning status '{}'", other)),
        }
    }
}

/// A scheduled virtual meeting. `start_time`/`end_time` hold UTC wall-clock digits.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Session {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub call_id: String,
    pub call_link: String,
    #[sqlx(try_from = "String")]
    pub video_quality: VideoQuality,
    #[sqlx(try_from = "String")]
    pub provisioning_status: ProvisioningStatus,
    /// Last time the video room was requested; the retry queue is ordered on it.
    pub provisioning_attempted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

pub struct NewSessionParams {
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub origin_url: String,
}

impl Session {
    pub fn new(params: NewSessionParams) -> Self {
        let call_id = Uuid::new_v4().to_string();
        let origin = params.origin_url.trim_end_matches('/');
        let call_link = format!("{}/call/{}/{}", origin, call_id, params.course_id);

        Self {
            id: Uuid::new_v4().to_string(),
            course_id: params.course_id,
            title: params.title,
            description: params.description,
            start_time: params.start,
            end_time: params.end,
            call_id,
            call_link,
            video_quality: VideoQuality::Ultra,
            provisioning_status: ProvisioningStatus::Pending,
            provisioning_attempted_at: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallRole {
    #[serde(rename = "HOST")]
    Host,
    #[serde(rename = "PARTICIPANT")]
    Participant,
}

impl CallRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallRole::Host => "HOST",
            CallRole::Participant => "PARTICIPANT",
        }
    }

    /// Member role understood by the video provider.
    pub fn provider_role(&self) -> &'static str {
        match self {
            CallRole::Host => "admin",
            CallRole::Participant => "user",
        }
    }
}

impl TryFrom<String> for CallRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "HOST" => Ok(CallRole::Host),
            "PARTICIPANT" => Ok(CallRole::Participant),
            other => Err(format!("unknown call role '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Participant {
    pub id: String,
    pub session_id: String,
    pub user_id: String,
    #[sqlx(try_from = "String")]
    pub role: CallRole,
    pub joined_at: Option<NaiveDateTime>,
}

impl Participant {
    pub fn new(session_id: String, user_id: String, role: CallRole, joined_at: Option<NaiveDateTime>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id,
            user_id,
            role,
            joined_at,
        }
    }
}

/// A participant row joined with the user it binds.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct ParticipantProfile {
    pub user_id: String,
    pub display_name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: CallRole,
    pub joined_at: Option<NaiveDateTime>,
}

/// A session with the context a calendar entry needs.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct SessionDetails {
    #[sqlx(flatten)]
    pub session: Session,
    pub course_title: String,
    pub teacher_name: String,
    pub participant_count: i64,
}

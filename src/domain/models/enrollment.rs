use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvitationStatus {
    #[serde(rename = "Pendiente")]
    Pending,
    #[serde(rename = "Aceptada")]
    Accepted,
    #[serde(rename = "Rechazada")]
    Rejected,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "Pendiente",
            InvitationStatus::Accepted => "Aceptada",
            InvitationStatus::Rejected => "Rechazada",
        }
    }
}

impl TryFrom<String> for InvitationStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "Pendiente" => Ok(InvitationStatus::Pending),
            "Aceptada" => Ok(InvitationStatus::Accepted),
            "Rechazada" => Ok(InvitationStatus::Rejected),
            other => Err(format!("unknown invitation status '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Enrollment {
    pub id: String,
    pub course_id: String,
    pub student_id: String,
    #[sqlx(try_from = "String")]
    pub status: InvitationStatus,
    pub join_code: String,
    pub created_at: DateTime<Utc>,
}

impl Enrollment {
    pub fn new(course_id: String, student_id: String, status: InvitationStatus) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            course_id,
            student_id,
            status,
            join_code: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        }
    }
}

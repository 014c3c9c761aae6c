use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseStatus {
    #[serde(rename = "Activo")]
    Active,
    #[serde(rename = "Inactivo")]
    Inactive,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Active => "Activo",
            CourseStatus::Inactive => "Inactivo",
        }
    }
}

impl TryFrom<String> for CourseStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "Activo" => Ok(CourseStatus::Active),
            "Inactivo" => Ok(CourseStatus::Inactive),
            other => Err(format!("unknown course status '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub teacher_id: String,
    #[sqlx(try_from = "String")]
    pub status: CourseStatus,
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn new(teacher_id: String, title: String, description: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            teacher_id,
            status: CourseStatus::Active,
            created_at: Utc::now(),
        }
    }
}

/// A course joined with the display name of the teacher who owns it.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct CourseListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub course: Course,
    pub teacher_name: String,
}

/// Admin overview row: course, owner and accepted-student head count.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct CourseOverview {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub course: Course,
    pub teacher_name: String,
    pub student_count: i64,
}

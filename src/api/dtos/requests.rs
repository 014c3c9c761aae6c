use crate::domain::models::course::CourseStatus;
use crate::domain::services::time_normalizer::TimeInput;
use crate::error::AppError;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct CourseListQuery {
    pub status: Option<String>,
}

impl CourseListQuery {
    pub fn status_filter(&self) -> Result<Option<CourseStatus>, AppError> {
        match self.status.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("") | Some("all") => Ok(None),
            Some("active") => Ok(Some(CourseStatus::Active)),
            Some("inactive") => Ok(Some(CourseStatus::Inactive)),
            Some(other) => Err(AppError::Validation(format!("Unknown course status filter '{}'", other))),
        }
    }
}

/// Start and end accept RFC 3339 with an offset, or offset-less wall clock in
/// the display zone.
#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub course_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_time: TimeInput,
    pub end_time: TimeInput,
    pub origin_url: Option<String>,
}

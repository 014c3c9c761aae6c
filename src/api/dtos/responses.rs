use serde::Serialize;
use crate::domain::models::{course::Course, user::User};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct JoinCallResponse {
    pub authorized: bool,
    pub user_id: String,
    pub course_id: String,
    pub call_id: Option<String>,
    pub token: String,
}

#[derive(Serialize)]
pub struct MarkedReadResponse {
    pub updated: u64,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct CountResponse {
    pub count: usize,
}

#[derive(Serialize)]
pub struct MemberSummary {
    pub id: String,
    pub display_name: String,
    pub email: String,
}

impl From<User> for MemberSummary {
    fn from(user: User) -> Self {
        Self {
            display_name: user.display_name(),
            id: user.id,
            email: user.email,
        }
    }
}

#[derive(Serialize)]
pub struct CourseDetailsResponse {
    pub course: Course,
    pub teacher: MemberSummary,
    pub students: Vec<MemberSummary>,
}

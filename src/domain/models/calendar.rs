use serde::Serialize;
use chrono::NaiveDateTime;
use crate::domain::models::session::VideoQuality;

/// Temporal state of a session relative to a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    #[serde(rename = "futura")]
    Future,
    #[serde(rename = "en_curso")]
    Ongoing,
    #[serde(rename = "concluida")]
    Concluded,
}

/// Monday 00:00:00 through Sunday 23:59:59, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarEntry {
    pub session_id: String,
    pub course_title: String,
    pub title: String,
    pub description: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub call_link: String,
    pub video_quality: VideoQuality,
    pub teacher_name: String,
    pub participant_count: i64,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyCalendar {
    pub entries: Vec<CalendarEntry>,
    pub total: usize,
    pub week_start: NaiveDateTime,
    pub week_end: NaiveDateTime,
    pub now: NaiveDateTime,
}

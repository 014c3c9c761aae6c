use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, TimeZone, Utc};
use icalendar::{Calendar, Component, Event as IcalEvent, EventLike};
use crate::domain::models::calendar::{CalendarEntry, SessionStatus, WeekWindow};
use crate::domain::models::session::{Session, SessionDetails};
use crate::domain::services::time_normalizer::TimeNormalizer;

/// Boundary instants count as ongoing.
pub fn derive_status(start: NaiveDateTime, end: NaiveDateTime, now: NaiveDateTime) -> SessionStatus {
    if end < now {
        SessionStatus::Concluded
    } else if start <= now && now <= end {
        SessionStatus::Ongoing
    } else {
        SessionStatus::Future
    }
}

/// The Monday-to-Sunday week containing `reference`.
pub fn week_containing(reference: NaiveDateTime) -> WeekWindow {
    let monday = reference.date() - Duration::days(i64::from(reference.weekday().num_days_from_monday()));
    let sunday = monday + Duration::days(6);
    WeekWindow {
        start: monday.and_time(NaiveTime::MIN),
        end: sunday.and_hms_opt(23, 59, 59).unwrap_or_else(|| sunday.and_time(NaiveTime::MIN)),
    }
}

fn to_entry(details: &SessionDetails, start: NaiveDateTime, end: NaiveDateTime, now: NaiveDateTime) -> CalendarEntry {
    let session = &details.session;
    CalendarEntry {
        session_id: session.id.clone(),
        course_title: details.course_title.clone(),
        title: session.title.clone(),
        description: session.description.clone(),
        start_time: start,
        end_time: end,
        call_link: session.call_link.clone(),
        video_quality: session.video_quality,
        teacher_name: details.teacher_name.clone(),
        participant_count: details.participant_count,
        status: derive_status(start, end, now),
    }
}

/// Builds the status-tagged entries for one week.
///
/// `reference_now` and `week` are display-zone wall clock; stored session bounds
/// are converted through `clock` before any comparison.
pub fn build_weekly_calendar(
    sessions: &[SessionDetails],
    clock: &TimeNormalizer,
    reference_now: NaiveDateTime,
    week: WeekWindow,
) -> Vec<CalendarEntry> {
    let mut entries: Vec<CalendarEntry> = sessions
        .iter()
        .filter_map(|details| {
            let start = clock.display(details.session.start_time);
            let end = clock.display(details.session.end_time);
            (start <= week.end && end >= week.start).then(|| to_entry(details, start, end, reference_now))
        })
        .collect();

    entries.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.session_id.cmp(&b.session_id)));
    entries
}

/// Every session of a course, status-tagged, without week filtering.
pub fn list_course_sessions(
    sessions: &[SessionDetails],
    clock: &TimeNormalizer,
    reference_now: NaiveDateTime,
) -> Vec<CalendarEntry> {
    let mut entries: Vec<CalendarEntry> = sessions
        .iter()
        .map(|details| {
            let start = clock.display(details.session.start_time);
            let end = clock.display(details.session.end_time);
            to_entry(details, start, end, reference_now)
        })
        .collect();

    entries.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.session_id.cmp(&b.session_id)));
    entries
}

/// Generates an iCalendar (.ics) invite for a session
pub fn generate_ics(session: &Session, course_title: &str) -> String {
    let mut calendar = Calendar::new();

    let ical_event = IcalEvent::new()
        .summary(&format!("{}: {}", course_title, session.title))
        .description(&session.description)
        .location(&session.call_link)
        .starts(Utc.from_utc_datetime(&session.start_time))
        .ends(Utc.from_utc_datetime(&session.end_time))
        .uid(&session.id)
        .done();

    calendar.push(ical_event);
    calendar.to_string()
}

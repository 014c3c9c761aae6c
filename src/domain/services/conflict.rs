//! Double-booking detection for one teacher's sessions.
//!
//! Windows are half-open: `[start, end)`. A session ending exactly when another
//! begins does not conflict with it.

use chrono::NaiveDateTime;
use crate::domain::models::session::Session;
use crate::error::AppError;

pub fn overlaps(s1: NaiveDateTime, e1: NaiveDateTime, s2: NaiveDateTime, e2: NaiveDateTime) -> bool {
    s1 < e2 && e1 > s2
}

pub fn validate_range(start: NaiveDateTime, end: NaiveDateTime) -> Result<(), AppError> {
    if start >= end {
        return Err(AppError::InvalidRange { start, end });
    }
    Ok(())
}

/// Returns the earliest-starting existing session that overlaps the proposal.
///
/// `existing` must already be restricted to the teacher's own sessions.
pub fn has_conflict<'a>(
    existing: &'a [Session],
    proposed_start: NaiveDateTime,
    proposed_end: NaiveDateTime,
) -> Result<Option<&'a Session>, AppError> {
    validate_range(proposed_start, proposed_end)?;

    Ok(existing
        .iter()
        .filter(|s| overlaps(s.start_time, s.end_time, proposed_start, proposed_end))
        .min_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id))))
}

/// Like [`has_conflict`] but turns a collision into `AppError::SchedulingConflict`.
pub fn ensure_free(existing: &[Session], proposed_start: NaiveDateTime, proposed_end: NaiveDateTime) -> Result<(), AppError> {
    match has_conflict(existing, proposed_start, proposed_end)? {
        Some(hit) => Err(AppError::SchedulingConflict {
            session_id: hit.id.clone(),
            title: hit.title.clone(),
            start: hit.start_time,
            end: hit.end_time,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::session::NewSessionParams;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    fn session(title: &str, start: NaiveDateTime, end: NaiveDateTime) -> Session {
        Session::new(NewSessionParams {
            course_id: "course".into(),
            title: title.into(),
            description: String::new(),
            start,
            end,
            origin_url: "http://localhost".into(),
        })
    }

    #[test]
    fn touching_windows_do_not_conflict() {
        let existing = vec![session("A", at(14, 0), at(15, 0))];
        assert!(has_conflict(&existing, at(15, 0), at(16, 0)).unwrap().is_none());
        assert!(has_conflict(&existing, at(13, 0), at(14, 0)).unwrap().is_none());
    }

    #[test]
    fn overlap_is_symmetric() {
        let pairs = [
            ((at(14, 0), at(15, 0)), (at(14, 30), at(15, 30))),
            ((at(9, 0), at(12, 0)), (at(10, 0), at(11, 0))),
            ((at(9, 0), at(10, 0)), (at(9, 0), at(10, 0))),
        ];
        for ((s1, e1), (s2, e2)) in pairs {
            assert!(overlaps(s1, e1, s2, e2));
            assert!(overlaps(s2, e2, s1, e1));
            assert!(has_conflict(&[session("a", s1, e1)], s2, e2).unwrap().is_some());
            assert!(has_conflict(&[session("b", s2, e2)], s1, e1).unwrap().is_some());
        }
    }

    #[test]
    fn reports_the_colliding_session() {
        let existing = vec![
            session("Morning", at(9, 0), at(10, 0)),
            session("Algebra", at(14, 0), at(15, 0)),
        ];
        let hit = has_conflict(&existing, at(14, 30), at(15, 30)).unwrap().unwrap();
        assert_eq!(hit.title, "Algebra");

        match ensure_free(&existing, at(14, 30), at(15, 30)) {
            Err(AppError::SchedulingConflict { title, start, end, .. }) => {
                assert_eq!(title, "Algebra");
                assert_eq!(start, at(14, 0));
                assert_eq!(end, at(15, 0));
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn earliest_collision_wins() {
        let existing = vec![
            session("Late", at(11, 0), at(12, 0)),
            session("Early", at(9, 0), at(10, 30)),
        ];
        let hit = has_conflict(&existing, at(10, 0), at(11, 30)).unwrap().unwrap();
        assert_eq!(hit.title, "Early");
    }

    #[test]
    fn empty_or_inverted_range_is_rejected_first() {
        let existing = vec![session("A", at(14, 0), at(15, 0))];
        assert!(matches!(has_conflict(&existing, at(14, 0), at(14, 0)), Err(AppError::InvalidRange { .. })));
        assert!(matches!(has_conflict(&[], at(15, 0), at(14, 0)), Err(AppError::InvalidRange { .. })));
    }
}

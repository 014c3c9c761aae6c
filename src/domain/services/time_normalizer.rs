//! Conversions between the storage clock and the display zone.
//!
//! Sessions are stored as naive timestamps holding UTC wall-clock digits. Users
//! see times in a single fixed offset configured for the deployment. Every
//! conversion between the two goes through [`TimeNormalizer`].

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use crate::error::AppError;

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// A timestamp as submitted by a client, with or without an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum TimeInput {
    Zoned(DateTime<FixedOffset>),
    /// No offset given: read as display-zone wall clock.
    Local(NaiveDateTime),
}

impl TimeInput {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let raw = raw.trim();
        if let Ok(zoned) = DateTime::parse_from_rfc3339(raw) {
            return Ok(TimeInput::Zoned(zoned));
        }

        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(TimeInput::Local)
            .ok_or_else(|| AppError::Validation(format!("Invalid timestamp '{}'", raw)))
    }
}

impl TryFrom<String> for TimeInput {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TimeInput::parse(&value).map_err(|e| e.to_string())
    }
}

/// Discards the offset without shifting the wall-clock digits.
pub fn strip_offset<Tz: TimeZone>(ts: Option<DateTime<Tz>>) -> Option<NaiveDateTime> {
    ts.map(|t| t.naive_local())
}

#[derive(Debug, Clone, Copy)]
pub struct TimeNormalizer {
    zone: FixedOffset,
}

impl TimeNormalizer {
    pub fn new(offset_hours: i32) -> Result<Self, AppError> {
        if !(-23..=23).contains(&offset_hours) {
            return Err(AppError::Validation(format!("Display offset {}h is out of range", offset_hours)));
        }
        let zone = FixedOffset::east_opt(offset_hours * 3600)
            .ok_or_else(|| AppError::Validation(format!("Display offset {}h is out of range", offset_hours)))?;
        Ok(Self { zone })
    }

    pub fn zone(&self) -> FixedOffset {
        self.zone
    }

    pub fn now_in_display_zone(&self) -> NaiveDateTime {
        self.project(Utc::now())
    }

    /// Projects an instant onto the display zone and drops the offset.
    pub fn project(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.zone).naive_local()
    }

    /// Reads `stored` as UTC and returns display-zone wall clock.
    pub fn to_display_zone(&self, stored: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
        strip_offset(stored.map(|s| Utc.from_utc_datetime(&s).with_timezone(&self.zone)))
    }

    pub fn display(&self, stored: NaiveDateTime) -> NaiveDateTime {
        self.project(Utc.from_utc_datetime(&stored))
    }

    /// Inverse of [`display`](Self::display).
    pub fn from_display_zone(&self, local: NaiveDateTime) -> NaiveDateTime {
        local - Duration::seconds(i64::from(self.zone.local_minus_utc()))
    }

    /// The only way a client timestamp enters storage.
    pub fn to_storage(&self, input: &TimeInput) -> NaiveDateTime {
        match input {
            TimeInput::Zoned(dt) => dt.with_timezone(&Utc).naive_utc(),
            TimeInput::Local(local) => self.from_display_zone(*local),
        }
    }
}

//! Schedule entries ("termini") as served by the timetable service.
//!
//! Field names on the wire follow the timetable service so that merged output can
//! be consumed by the same clients as the raw timetables.

mod clock;
mod merge;

pub use clock::wrapped_end;
pub use merge::merge_overlapping_terms;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Day of the week, 1 (Monday) through 7 (Sunday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Day(u8);

impl Day {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 7;

    pub fn new(value: u8) -> Result<Self, InvalidDay> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidDay(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Day {
    type Error = InvalidDay;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Day> for u8 {
    fn from(day: Day) -> Self {
        day.get()
    }
}

/// Returned when a day code falls outside 1..=7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidDay(pub u8);

impl fmt::Display for InvalidDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "day must be between {} and {}, got {}",
            Day::MIN,
            Day::MAX,
            self.0
        )
    }
}

impl std::error::Error for InvalidDay {}

/// A single scheduled interval on a day of the week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    /// Present on entries from the timetable service, `None` on merged entries.
    #[serde(rename = "termin_id")]
    pub id: Option<i64>,

    #[serde(rename = "dan")]
    pub day: Day,

    /// Wall-clock start, no date component.
    #[serde(rename = "zacetek")]
    pub start: NaiveTime,

    #[serde(rename = "dolzina")]
    pub duration_minutes: u32,

    #[serde(rename = "lokacija")]
    pub location: Option<String>,

    #[serde(rename = "tip")]
    pub kind: Option<String>,

    /// Forwarded untouched; its shape belongs to the timetable service.
    #[serde(rename = "predmet")]
    pub subject: Option<serde_json::Value>,

    /// Forwarded untouched; its shape belongs to the timetable service.
    #[serde(rename = "aktivnost")]
    pub activity: Option<serde_json::Value>,
}

impl Term {
    /// Builds a synthesized term covering several source terms.
    ///
    /// Merged terms carry no identifier and no descriptive metadata.
    pub fn merged(day: Day, start: NaiveTime, duration_minutes: u32) -> Self {
        Self {
            id: None,
            day,
            start,
            duration_minutes,
            location: None,
            kind: None,
            subject: None,
            activity: None,
        }
    }

    /// End of the term under the timetable's field-wise wraparound rule.
    pub fn end(&self) -> NaiveTime {
        wrapped_end(self.start, self.duration_minutes)
    }
}

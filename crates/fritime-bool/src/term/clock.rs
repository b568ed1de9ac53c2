//! Time-of-day arithmetic used by the merge engine.
//!
//! The timetable clients compute end times field by field: the hour and the
//! minute are each advanced and wrapped on their own, with no carry from minutes
//! into hours. `08:30` plus 45 minutes is therefore `08:15`, not `09:15`. Merged
//! output has always been produced under this rule, so it is kept here behind two
//! functions that the merge loop calls and nothing else.

use chrono::{NaiveTime, Timelike};

/// End of an interval under the field-wise wraparound rule.
///
/// `hour = (start.hour + duration / 60) mod 24` and
/// `minute = (start.minute + duration mod 60) mod 60`. Seconds are dropped.
pub fn wrapped_end(start: NaiveTime, duration_minutes: u32) -> NaiveTime {
    let hour = (start.hour() + duration_minutes / 60) % 24;
    let minute = (start.minute() + duration_minutes % 60) % 60;

    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

/// Signed minutes from `from` to `to`, comparing hour and minute fields only.
pub fn clock_offset_minutes(from: NaiveTime, to: NaiveTime) -> i64 {
    let hours = i64::from(to.hour()) - i64::from(from.hour());
    let minutes = i64::from(to.minute()) - i64::from(from.minute());

    hours * 60 + minutes
}

//! Day/weekday segmenter
//!
//! Splits a time span into day-aligned pieces so each piece can take its
//! weekday's colour and each boundary can carry a pair of weekday badges.

use chrono::{DateTime, Datelike, Duration, NaiveDateTime, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::error::TimelineError;

/// A `[start, end)` piece of the timeline sharing one weekday
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineSegment {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Local weekday of `start`
    pub weekday: Weekday,
}

/// Lowercase weekday name, used as the palette key
pub fn weekday_key(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Three-letter badge text
pub fn weekday_abbrev(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MON",
        Weekday::Tue => "TUE",
        Weekday::Wed => "WED",
        Weekday::Thu => "THU",
        Weekday::Fri => "FRI",
        Weekday::Sat => "SAT",
        Weekday::Sun => "SUN",
    }
}

pub const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Local weekday of an instant
pub fn local_weekday(instant: DateTime<Utc>, tz: Tz) -> Weekday {
    instant.with_timezone(&tz).weekday()
}

/// Resolve a local wall-clock time to an instant
///
/// Ambiguous times (DST fall-back) take the earlier reading; times inside a
/// spring-forward gap move to the first valid reading after the gap.
pub fn resolve_local(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    let mut probe = naive;
    // Gaps are at most a few hours in practice
    for _ in 0..4 {
        if let Some(instant) = tz.from_local_datetime(&probe).earliest() {
            return instant.with_timezone(&Utc);
        }
        probe += Duration::hours(1);
    }
    Utc.from_utc_datetime(&naive)
}

/// Start of the `step_hours` grid cell containing `instant`, in local time
pub fn floor_to_hour_grid(instant: DateTime<Utc>, step_hours: u32, tz: Tz) -> NaiveDateTime {
    let local = instant.with_timezone(&tz);
    let hour = (local.hour() / step_hours) * step_hours;
    // hour <= local.hour() < 24, so the time is always valid
    local.date_naive().and_time(chrono::NaiveTime::MIN) + Duration::hours(hour as i64)
}

/// Ordered, duplicate-free grid instants in `(start, end]`
///
/// The grid is aligned to `floor(start.hour / granularity) * granularity` in
/// local time and stepped by `granularity_hours` of wall-clock time, so a
/// 24-hour grid lands on local midnight on both sides of a DST change.
pub fn day_boundaries(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    granularity_hours: u32,
    tz: Tz,
) -> Result<Vec<DateTime<Utc>>, TimelineError> {
    if granularity_hours == 0 {
        return Err(TimelineError::InvalidGranularity);
    }

    let step = Duration::hours(granularity_hours as i64);
    let mut candidate = floor_to_hour_grid(start, granularity_hours, tz);
    let mut boundaries: Vec<DateTime<Utc>> = Vec::new();

    loop {
        candidate += step;
        let instant = resolve_local(candidate, tz);
        if instant > end {
            break;
        }
        let is_new = boundaries.last().map_or(true, |last| instant > *last);
        if instant > start && is_new {
            boundaries.push(instant);
        }
    }

    Ok(boundaries)
}

/// Contiguous segments covering `[start, end]`, split at `boundaries`
///
/// `start` and `end` are the outer fenceposts. Boundaries outside
/// `(start, end)` are ignored and zero-length pieces are dropped.
pub fn segments_from_boundaries(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    boundaries: &[DateTime<Utc>],
    tz: Tz,
) -> Vec<TimelineSegment> {
    let inner = boundaries.iter().copied().filter(|b| *b > start && *b < end);
    let fenceposts: Vec<DateTime<Utc>> = std::iter::once(start)
        .chain(inner)
        .chain(std::iter::once(end))
        .collect();

    fenceposts
        .windows(2)
        .filter(|pair| pair[1] > pair[0])
        .map(|pair| TimelineSegment {
            start: pair[0],
            end: pair[1],
            weekday: local_weekday(pair[0], tz),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn utc_zone() -> Tz {
        "UTC".parse().unwrap()
    }

    #[test]
    fn test_daily_boundaries_over_two_days() {
        let start = utc(2024, 1, 1, 10, 0);
        let end = utc(2024, 1, 3, 10, 0);
        let boundaries = day_boundaries(start, end, 24, utc_zone()).unwrap();
        assert_eq!(boundaries, vec![utc(2024, 1, 2, 0, 0), utc(2024, 1, 3, 0, 0)]);
    }

    #[test]
    fn test_boundary_equal_to_end_is_included() {
        let start = utc(2024, 1, 1, 10, 0);
        let end = utc(2024, 1, 2, 0, 0);
        let boundaries = day_boundaries(start, end, 24, utc_zone()).unwrap();
        assert_eq!(boundaries, vec![utc(2024, 1, 2, 0, 0)]);
    }

    #[test]
    fn test_start_on_boundary_is_excluded() {
        let start = utc(2024, 1, 2, 0, 0);
        let end = utc(2024, 1, 3, 12, 0);
        let boundaries = day_boundaries(start, end, 24, utc_zone()).unwrap();
        assert_eq!(boundaries, vec![utc(2024, 1, 3, 0, 0)]);
    }

    #[test]
    fn test_sub_day_granularity_aligns_to_hour_grid() {
        let start = utc(2024, 1, 1, 10, 30);
        let end = utc(2024, 1, 1, 23, 0);
        let boundaries = day_boundaries(start, end, 6, utc_zone()).unwrap();
        assert_eq!(boundaries, vec![utc(2024, 1, 1, 12, 0), utc(2024, 1, 1, 18, 0)]);
    }

    #[test]
    fn test_zero_granularity_is_an_error() {
        let start = utc(2024, 1, 1, 10, 0);
        let err = day_boundaries(start, start + Duration::days(1), 0, utc_zone()).unwrap_err();
        assert_eq!(err, TimelineError::InvalidGranularity);
    }

    #[test]
    fn test_boundaries_follow_local_midnight() {
        let tz: Tz = "America/New_York".parse().unwrap();
        // 2024-03-10 springs forward; midnights are 05:00Z before and 04:00Z after
        let start = utc(2024, 3, 9, 15, 0);
        let end = utc(2024, 3, 12, 15, 0);
        let boundaries = day_boundaries(start, end, 24, tz).unwrap();
        assert_eq!(
            boundaries,
            vec![
                utc(2024, 3, 10, 5, 0),
                utc(2024, 3, 11, 4, 0),
                utc(2024, 3, 12, 4, 0)
            ]
        );
    }

    #[test]
    fn test_segments_carry_start_weekday() {
        let start = utc(2024, 1, 1, 10, 0);
        let end = utc(2024, 1, 3, 10, 0);
        let boundaries = day_boundaries(start, end, 24, utc_zone()).unwrap();
        let segments = segments_from_boundaries(start, end, &boundaries, utc_zone());

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].start, start);
        assert_eq!(segments[0].end, utc(2024, 1, 2, 0, 0));
        assert_eq!(segments[1].start, utc(2024, 1, 2, 0, 0));
        assert_eq!(segments[1].end, utc(2024, 1, 3, 0, 0));
        assert_eq!(segments[2].end, end);

        let weekdays: Vec<_> = segments.iter().map(|s| s.weekday).collect();
        assert_eq!(weekdays, vec![Weekday::Mon, Weekday::Tue, Weekday::Wed]);
    }

    #[test]
    fn test_segments_without_boundaries() {
        let start = utc(2024, 1, 1, 10, 0);
        let end = utc(2024, 1, 1, 20, 0);
        let segments = segments_from_boundaries(start, end, &[], utc_zone());
        assert_eq!(
            segments,
            vec![TimelineSegment {
                start,
                end,
                weekday: Weekday::Mon
            }]
        );
    }

    #[test]
    fn test_segments_drop_zero_length_tail() {
        let start = utc(2024, 1, 1, 10, 0);
        let end = utc(2024, 1, 2, 0, 0);
        let segments = segments_from_boundaries(start, end, &[end], utc_zone());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].end, end);
    }

    #[test]
    fn test_weekday_uses_local_date() {
        let tz: Tz = "Asia/Tokyo".parse().unwrap();
        // 20:00Z on Sunday is already Monday in Tokyo
        assert_eq!(local_weekday(utc(2024, 1, 7, 20, 0), tz), Weekday::Mon);
    }

    #[test]
    fn test_weekday_names() {
        assert_eq!(weekday_key(Weekday::Wed), "wednesday");
        assert_eq!(weekday_abbrev(Weekday::Sun), "SUN");
        assert_eq!(ALL_WEEKDAYS.len(), 7);
    }
}

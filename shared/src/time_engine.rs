//! Time Engine - wall-clock data for a single render tick
//!
//! Converts a UTC instant into the local quantities a clock face needs:
//! hand angles and the heading date line.

use chrono::{DateTime, Datelike, Local, Timelike, Utc};
use chrono_tz::Tz;
use std::f64::consts::TAU;

/// Seconds in one revolution of the hour hand
pub const HALF_DAY_SECONDS: f64 = 12.0 * 3600.0;

/// Local clock data for a single render tick
#[derive(Debug, Clone)]
pub struct ClockTime {
    /// Hour in 24-hour format (0-23)
    pub hour24: u32,
    /// Minute (0-59)
    pub minute: u32,
    /// Second (0-59)
    pub second: u32,
    /// Fractional seconds (0.0-1.0)
    pub second_fraction: f64,
    /// The local DateTime for additional formatting needs
    pub local_datetime: DateTime<Tz>,
}

impl ClockTime {
    /// Seconds elapsed since local midnight, including the fraction
    pub fn seconds_since_midnight(&self) -> f64 {
        (self.hour24 * 3600 + self.minute * 60 + self.second) as f64 + self.second_fraction
    }

    /// Hour hand angle in radians, clockwise from 12 o'clock
    pub fn hour_hand_angle(&self) -> f64 {
        (self.seconds_since_midnight() % HALF_DAY_SECONDS) / HALF_DAY_SECONDS * TAU
    }

    /// Minute hand angle in radians, clockwise from 12 o'clock
    pub fn minute_hand_angle(&self) -> f64 {
        let seconds_in_hour = (self.minute * 60 + self.second) as f64 + self.second_fraction;
        seconds_in_hour / 3600.0 * TAU
    }

    /// Format the heading line, e.g. "Monday, 21st of October 2024"
    pub fn format_heading(&self) -> String {
        let local = &self.local_datetime;
        format!(
            "{}, {}{} of {}",
            local.format("%A"),
            local.day(),
            ordinal_suffix(local.day()),
            local.format("%B %Y")
        )
    }
}

/// English ordinal suffix for a day of the month
pub fn ordinal_suffix(day: u32) -> &'static str {
    if (11..=13).contains(&(day % 100)) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Compute clock data for a given timezone at a specific instant
pub fn compute_clock_time_at(tz: Tz, now_utc: DateTime<Utc>) -> ClockTime {
    let local = now_utc.with_timezone(&tz);

    // Leap seconds report nanos above 1e9; clamp so the hands never jump back
    let nanos = local.nanosecond().min(999_999_999);
    let second_fraction = nanos as f64 / 1_000_000_000.0;

    ClockTime {
        hour24: local.hour(),
        minute: local.minute(),
        second: local.second(),
        second_fraction,
        local_datetime: local,
    }
}

/// Hour hand angle of an instant in the given zone, clockwise from 12 o'clock
pub fn hour_hand_angle_at(tz: Tz, instant: DateTime<Utc>) -> f64 {
    compute_clock_time_at(tz, instant).hour_hand_angle()
}

/// Get the system's local timezone as a chrono-tz Tz
///
/// Honours `TZ` first, then falls back to the abbreviation chrono reports,
/// which only resolves for zones whose abbreviation is also an IANA name.
pub fn system_timezone() -> Option<Tz> {
    if let Ok(name) = std::env::var("TZ") {
        if let Ok(tz) = name.trim_start_matches(':').parse::<Tz>() {
            return Some(tz);
        }
    }
    Local::now().format("%Z").to_string().parse::<Tz>().ok()
}

/// Parse a timezone string into a Tz
pub fn parse_timezone(tz_str: &str) -> Result<Tz, String> {
    tz_str
        .parse::<Tz>()
        .map_err(|_| format!("Invalid timezone: {}", tz_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_hour_hand_angle_quarter_positions() {
        let tz: Tz = "UTC".parse().unwrap();
        let three = compute_clock_time_at(tz, utc(2024, 1, 1, 3, 0, 0));
        assert!((three.hour_hand_angle() - TAU / 4.0).abs() < 1e-9);

        // 15:00 shares the 3 o'clock position
        let fifteen = compute_clock_time_at(tz, utc(2024, 1, 1, 15, 0, 0));
        assert!((fifteen.hour_hand_angle() - TAU / 4.0).abs() < 1e-9);

        let midnight = compute_clock_time_at(tz, utc(2024, 1, 1, 0, 0, 0));
        assert!(midnight.hour_hand_angle().abs() < 1e-9);
    }

    #[test]
    fn test_minute_hand_angle() {
        let tz: Tz = "UTC".parse().unwrap();
        let data = compute_clock_time_at(tz, utc(2024, 1, 1, 7, 30, 0));
        assert!((data.minute_hand_angle() - TAU / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_local_zone_shifts_angle() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        // 02:00 UTC is 03:00 in Berlin during winter
        let angle = hour_hand_angle_at(tz, utc(2024, 1, 1, 2, 0, 0));
        assert!((angle - TAU / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_fields_are_local() {
        let tz: Tz = "Asia/Tokyo".parse().unwrap();
        let data = compute_clock_time_at(tz, utc(2024, 1, 1, 13, 5, 7));
        assert_eq!((data.hour24, data.minute, data.second), (22, 5, 7));
        assert_eq!(data.seconds_since_midnight(), (22 * 3600 + 5 * 60 + 7) as f64);
    }

    #[test]
    fn test_ordinal_suffix() {
        assert_eq!(ordinal_suffix(1), "st");
        assert_eq!(ordinal_suffix(2), "nd");
        assert_eq!(ordinal_suffix(3), "rd");
        assert_eq!(ordinal_suffix(4), "th");
        assert_eq!(ordinal_suffix(11), "th");
        assert_eq!(ordinal_suffix(12), "th");
        assert_eq!(ordinal_suffix(13), "th");
        assert_eq!(ordinal_suffix(21), "st");
        assert_eq!(ordinal_suffix(22), "nd");
        assert_eq!(ordinal_suffix(31), "st");
    }

    #[test]
    fn test_format_heading() {
        let tz: Tz = "UTC".parse().unwrap();
        let data = compute_clock_time_at(tz, utc(2024, 1, 1, 10, 0, 0));
        assert_eq!(data.format_heading(), "Monday, 1st of January 2024");
    }

    #[test]
    fn test_parse_timezone() {
        assert!(parse_timezone("America/New_York").is_ok());
        assert!(parse_timezone("Not/AZone").is_err());
    }
}

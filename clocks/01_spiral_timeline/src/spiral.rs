//! Spiral model - maps time onto an Archimedean spiral around the clock face
//!
//! The angle parameter `t` counts elapsed half-day revolutions from the
//! render's reference instant: `t = 0` is "now" and every `2π` is twelve
//! hours further into the future. The curve is
//!
//! ```text
//! radius(t) = a*t + b
//! angle(t)  = c*t + d
//! point(t)  = (cx + radius(t)*sin(angle(t)), cy + radius(t)*cos(angle(t)))
//! ```
//!
//! in y-down display coordinates. With `c = -1` and `d = π - φ(now)`, where
//! `φ(now)` is the hour-hand angle, the spiral starts under the hour hand and
//! winds clockwise and inward by `pitch` pixels per revolution.
//!
//! Every instant fed through one [`SpiralModel`] must be measured against the
//! same reference instant; `d` changes with every tick.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use nannou::prelude::{pt2, Point2};
use shared::{hour_hand_angle_at, HALF_DAY_SECONDS};
use std::f64::consts::{PI, TAU};

use crate::error::TimelineError;

/// Seconds per revolution, as an integer for grid arithmetic
pub const HALF_TURN_SECONDS: i64 = 12 * 3600;

/// Default angular sampling step for polylines, in radians of `t`
pub const DEFAULT_STEP: f64 = 0.1;

/// Spans shorter than this collapse to a single duplicated endpoint
const SPAN_EPSILON: f64 = 1e-9;

/// Fractional seconds in a chrono duration
pub fn duration_seconds(d: Duration) -> f64 {
    match d.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => d.num_milliseconds() as f64 / 1e3,
    }
}

/// Angle parameter of `instant` relative to `reference_now`
pub fn time_to_angle_param(instant: DateTime<Utc>, reference_now: DateTime<Utc>) -> f64 {
    duration_seconds(instant - reference_now) / HALF_DAY_SECONDS * TAU
}

/// Parameters `(a, b, c, d)` of one spiral ring plus its center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpiralParams {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub cx: f64,
    pub cy: f64,
}

impl SpiralParams {
    pub fn radius_at(&self, t: f64) -> f64 {
        self.a * t + self.b
    }

    pub fn angle_at(&self, t: f64) -> f64 {
        self.c * t + self.d
    }
}

/// Build the spiral for one ring
///
/// `now_angle` is the hour-hand angle of the reference instant (clockwise
/// from 12 o'clock). `radius_offset` pulls the ring inward from `max_radius`
/// so separators, labels and events can nest on the same model.
pub fn build_spiral_params(
    now_angle: f64,
    center: Point2,
    radius_offset: f64,
    pitch: f64,
    max_radius: f64,
) -> Result<SpiralParams, TimelineError> {
    if !pitch.is_finite() || pitch <= 0.0 {
        return Err(TimelineError::InvalidPitch(pitch));
    }

    Ok(SpiralParams {
        a: -pitch / TAU,
        b: max_radius - radius_offset,
        c: -1.0,
        d: PI - now_angle,
        cx: center.x as f64,
        cy: center.y as f64,
    })
}

/// Point on the spiral at `t`. Defined for every real `t`.
pub fn point_at(params: &SpiralParams, t: f64) -> Point2 {
    let r = params.radius_at(t);
    let angle = params.angle_at(t);
    pt2(
        (params.cx + r * angle.sin()) as f32,
        (params.cy + r * angle.cos()) as f32,
    )
}

/// Sampling plan for the spiral between two angle parameters
///
/// Iterating yields `pointAt` at `t_min`, `t_min + step`, ... and always ends
/// on the exact `t_max` point. A plan never yields fewer than two points: a
/// collapsed span (or an inverted one) produces the endpoint twice so stroke
/// backends always receive a drawable segment. The plan is `Copy`; call
/// [`SpiralPolyline::iter`] again to restart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpiralPolyline {
    params: SpiralParams,
    t_min: f64,
    t_max: f64,
    step: f64,
    samples: usize,
}

/// Plan a polyline from `t_min` to `t_max` inclusive
pub fn polyline_between(params: &SpiralParams, t_min: f64, t_max: f64, step: f64) -> SpiralPolyline {
    let step = if step.is_finite() && step > 0.0 {
        step
    } else {
        DEFAULT_STEP
    };
    let span = t_max - t_min;
    let samples = if span > SPAN_EPSILON {
        ((span - SPAN_EPSILON) / step).ceil() as usize
    } else {
        0
    };

    SpiralPolyline {
        params: *params,
        t_min,
        t_max,
        step,
        samples,
    }
}

impl SpiralPolyline {
    /// Number of points the plan yields
    pub fn len(&self) -> usize {
        (self.samples + 1).max(2)
    }

    pub fn iter(&self) -> SpiralPoints {
        SpiralPoints {
            plan: *self,
            index: 0,
        }
    }

    #[cfg(test)]
    pub fn to_vec(&self) -> Vec<Point2> {
        self.iter().collect()
    }

    fn t_at(&self, index: usize) -> f64 {
        if index < self.samples {
            self.t_min + index as f64 * self.step
        } else {
            self.t_max
        }
    }
}

impl IntoIterator for SpiralPolyline {
    type Item = Point2;
    type IntoIter = SpiralPoints;

    fn into_iter(self) -> SpiralPoints {
        self.iter()
    }
}

/// Lazy iterator over a [`SpiralPolyline`]
#[derive(Debug, Clone)]
pub struct SpiralPoints {
    plan: SpiralPolyline,
    index: usize,
}

impl Iterator for SpiralPoints {
    type Item = Point2;

    fn next(&mut self) -> Option<Point2> {
        if self.index >= self.plan.len() {
            return None;
        }
        let t = self.plan.t_at(self.index);
        self.index += 1;
        Some(point_at(&self.plan.params, t))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.plan.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SpiralPoints {}

/// One ring of the spiral bound to a render's reference instant
///
/// This is the point/line generator handed to the timeline renderer and to
/// the event overlay.
#[derive(Debug, Clone, Copy)]
pub struct SpiralModel {
    now: DateTime<Utc>,
    now_angle: f64,
    params: SpiralParams,
    step: f64,
}

impl SpiralModel {
    pub fn new(
        now: DateTime<Utc>,
        tz: Tz,
        center: Point2,
        radius_offset: f64,
        pitch: f64,
        max_radius: f64,
        step: f64,
    ) -> Result<Self, TimelineError> {
        let now_angle = hour_hand_angle_at(tz, now);
        let params = build_spiral_params(now_angle, center, radius_offset, pitch, max_radius)?;
        Ok(Self {
            now,
            now_angle,
            params,
            step,
        })
    }

    pub fn t_for(&self, instant: DateTime<Utc>) -> f64 {
        time_to_angle_param(instant, self.now)
    }

    /// Clockwise screen angle of an instant, for aligning text with the spiral
    pub fn tangent_rotation(&self, instant: DateTime<Utc>) -> f64 {
        self.now_angle + self.t_for(instant)
    }

    pub fn point_for(&self, instant: DateTime<Utc>) -> Point2 {
        point_at(&self.params, self.t_for(instant))
    }

    pub fn polyline_for(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> SpiralPolyline {
        polyline_between(&self.params, self.t_for(start), self.t_for(end), self.step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn angle_param_to_elapsed(t: f64) -> Duration {
        Duration::microseconds((t / TAU * HALF_DAY_SECONDS * 1e6).round() as i64)
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn params() -> SpiralParams {
        build_spiral_params(0.0, pt2(200.0, 200.0), 0.0, 15.0, 180.0).unwrap()
    }

    #[test]
    fn test_now_maps_to_zero() {
        let now = utc(2024, 3, 9, 17, 42);
        assert_eq!(time_to_angle_param(now, now), 0.0);
    }

    #[test]
    fn test_linear_in_elapsed_time() {
        let now = utc(2024, 3, 9, 17, 42);
        let six_hours = time_to_angle_param(now + Duration::hours(6), now);
        assert!((six_hours - PI).abs() < 1e-12);
        let day = time_to_angle_param(now + Duration::hours(24), now);
        assert!((day - 2.0 * TAU).abs() < 1e-12);
        let past = time_to_angle_param(now - Duration::minutes(90), now);
        assert!((past + 90.0 * 60.0 / HALF_DAY_SECONDS * TAU).abs() < 1e-12);
    }

    #[test]
    fn test_inverse_recovers_elapsed() {
        for seconds in [0i64, 1, 59, 3600, 43_199, 86_400 * 6 + 17] {
            let now = utc(2024, 1, 1, 0, 0);
            let delta = Duration::seconds(seconds);
            let t = time_to_angle_param(now + delta, now);
            let back = angle_param_to_elapsed(t);
            assert!((back - delta).num_microseconds().unwrap().abs() <= 1);
        }
    }

    #[test]
    fn test_params_formula() {
        let p = build_spiral_params(1.0, pt2(10.0, 20.0), 7.5, 15.0, 100.0).unwrap();
        assert!((p.a + 15.0 / TAU).abs() < 1e-12);
        assert_eq!(p.b, 92.5);
        assert_eq!(p.c, -1.0);
        assert!((p.d - (PI - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_zero_pitch_is_rejected() {
        let err = build_spiral_params(0.0, pt2(0.0, 0.0), 0.0, 0.0, 100.0).unwrap_err();
        assert_eq!(err, TimelineError::InvalidPitch(0.0));
        assert!(build_spiral_params(0.0, pt2(0.0, 0.0), 0.0, -3.0, 100.0).is_err());
        assert!(build_spiral_params(0.0, pt2(0.0, 0.0), 0.0, f64::NAN, 100.0).is_err());
    }

    #[test]
    fn test_t_zero_sits_under_hour_hand() {
        // At 03:00 the hour hand points right, so t = 0 lies right of center
        let tz: Tz = "UTC".parse().unwrap();
        let now = utc(2024, 1, 1, 3, 0);
        let model = SpiralModel::new(now, tz, pt2(200.0, 200.0), 0.0, 15.0, 180.0, DEFAULT_STEP).unwrap();
        let p = model.point_for(now);
        assert!((p.x - 380.0).abs() < 1e-3);
        assert!((p.y - 200.0).abs() < 1e-3);

        // and it is the point at angle d and radius b
        let params = model.params;
        let expected = pt2(
            (params.cx + params.b * params.d.sin()) as f32,
            (params.cy + params.b * params.d.cos()) as f32,
        );
        assert_eq!(p, expected);
    }

    #[test]
    fn test_spiral_winds_inward_by_pitch() {
        let p = params();
        let start = point_at(&p, 0.0);
        let one_turn = point_at(&p, TAU);
        // midnight origin: both at 12 o'clock, one pitch apart
        assert!((start.x - 200.0).abs() < 1e-3);
        assert!((start.y - 20.0).abs() < 1e-3);
        assert!((one_turn.x - 200.0).abs() < 1e-3);
        assert!((one_turn.y - 35.0).abs() < 1e-3);
    }

    #[test]
    fn test_quarter_turn_is_clockwise() {
        let p = params();
        let quarter = point_at(&p, TAU / 4.0);
        assert!(quarter.x > 200.0);
        assert!((quarter.y - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_polyline_ends_on_exact_endpoint() {
        let p = params();
        let plan = polyline_between(&p, 0.0, 1.05, DEFAULT_STEP);
        let points = plan.to_vec();
        assert_eq!(points.len(), 12);
        assert_eq!(points.len(), plan.len());
        assert_eq!(points[0], point_at(&p, 0.0));
        assert_eq!(*points.last().unwrap(), point_at(&p, 1.05));
    }

    #[test]
    fn test_polyline_exact_multiple_has_no_duplicate_end() {
        let p = params();
        let points = polyline_between(&p, 0.0, 1.0, DEFAULT_STEP).to_vec();
        assert_eq!(points.len(), 11);
        assert_ne!(points[9], points[10]);
    }

    #[test]
    fn test_collapsed_span_duplicates_point() {
        let p = params();
        let points = polyline_between(&p, 2.0, 2.0, DEFAULT_STEP).to_vec();
        assert_eq!(points, vec![point_at(&p, 2.0), point_at(&p, 2.0)]);
    }

    #[test]
    fn test_inverted_span_yields_endpoint_only() {
        let p = params();
        let points = polyline_between(&p, 3.0, 1.0, DEFAULT_STEP).to_vec();
        assert_eq!(points, vec![point_at(&p, 1.0), point_at(&p, 1.0)]);
    }

    #[test]
    fn test_polyline_is_restartable() {
        let p = params();
        let plan = polyline_between(&p, 0.0, 0.35, DEFAULT_STEP);
        let first: Vec<_> = plan.iter().collect();
        let second: Vec<_> = plan.into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(plan.iter().len(), 5);
    }

    #[test]
    fn test_bad_step_falls_back_to_default() {
        let p = params();
        let plan = polyline_between(&p, 0.0, 1.0, 0.0);
        assert_eq!(plan.len(), 11);
    }

    #[test]
    fn test_tangent_rotation_matches_hour_hand() {
        let tz: Tz = "UTC".parse().unwrap();
        let now = utc(2024, 1, 1, 1, 30);
        let model = SpiralModel::new(now, tz, pt2(0.0, 0.0), 0.0, 15.0, 100.0, DEFAULT_STEP).unwrap();
        let later = now + Duration::hours(3);
        let expected = hour_hand_angle_at(tz, later);
        assert!((model.tangent_rotation(later) - expected).abs() < 1e-9);
    }
}

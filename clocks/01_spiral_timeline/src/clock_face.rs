//! Analog clock face - rim, tick marks and hands

use nannou::prelude::{pt2, Point2};
use std::f32::consts::TAU;

use crate::config::{ClockFaceConfig, HandConfig, TickConfig};
use crate::surface::{trace_polygon, Scoped, Surface};
use shared::ClockTime;

/// Hand outline pointing at 12 o'clock around the origin, y-down
///
/// The back end sits below the pivot, the front end above it.
pub fn hand_outline(hand: &HandConfig, radius: f32) -> [Point2; 4] {
    let front = hand.front_depth_pc * radius;
    let back = hand.back_depth_pc * radius;
    let front_half = hand.front_thickness_pc * radius / 2.0;
    let back_half = hand.back_thickness_pc * radius / 2.0;
    [
        pt2(-back_half, back),
        pt2(-front_half, -front),
        pt2(front_half, -front),
        pt2(back_half, back),
    ]
}

/// Tick rectangle at 12 o'clock, inside the rim
pub fn tick_outline(tick: &TickConfig, radius: f32) -> [Point2; 4] {
    let depth = tick.depth_pc * radius;
    let half = tick.thickness_pc * radius / 2.0;
    [
        pt2(-half, -radius),
        pt2(half, -radius),
        pt2(half, -radius + depth),
        pt2(-half, -radius + depth),
    ]
}

fn draw_ticks<S: Surface + ?Sized>(surface: &mut S, tick: &TickConfig, count: usize, radius: f32) {
    if tick.fill.colour[3] <= 0.0 {
        return;
    }
    let outline = tick_outline(tick, radius);
    for i in 0..count {
        let mut scoped = Scoped::new(&mut *surface);
        scoped.rotate(i as f32 * TAU / count as f32);
        trace_polygon(&mut *scoped, &outline);
        scoped.fill(&tick.fill);
    }
}

fn draw_hand<S: Surface + ?Sized>(surface: &mut S, hand: &HandConfig, angle: f32, radius: f32) {
    let outline = hand_outline(hand, radius);
    let mut scoped = Scoped::new(surface);
    scoped.rotate(angle);
    trace_polygon(&mut *scoped, &outline);
    scoped.fill(&hand.fill);
    if let Some(stroke) = &hand.stroke {
        trace_polygon(&mut *scoped, &outline);
        scoped.stroke(stroke);
    }
}

/// Draw the face inside `config.bounding_box` showing `time`
pub fn draw_clock_face<S: Surface + ?Sized>(surface: &mut S, config: &ClockFaceConfig, time: &ClockTime) {
    let fitted = config.bounding_box.square_fit();
    let radius = fitted.width / 2.0;
    if radius <= 0.0 {
        return;
    }
    let center = fitted.center();

    let mut scoped = Scoped::new(surface);
    scoped.translate(center.x, center.y);

    if let Some(stroke) = &config.face_stroke {
        scoped.move_to(pt2(radius, 0.0));
        scoped.arc(pt2(0.0, 0.0), radius, 0.0, TAU);
        scoped.stroke(stroke);
    }

    draw_ticks(&mut *scoped, &config.minute_ticks, 60, radius);
    draw_ticks(&mut *scoped, &config.hour_ticks, 12, radius);

    draw_hand(&mut *scoped, &config.hour_hand, time.hour_hand_angle() as f32, radius);
    draw_hand(&mut *scoped, &config.minute_hand, time.minute_hand_angle() as f32, radius);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::recording::RecordingSurface;
    use chrono::{TimeZone, Utc};
    use chrono_tz::Tz;

    fn close(a: Point2, b: Point2) -> bool {
        (a - b).length() < 1e-3
    }

    fn time_at(h: u32, m: u32) -> ClockTime {
        let tz: Tz = "UTC".parse().unwrap();
        shared::compute_clock_time_at(tz, Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap())
    }

    #[test]
    fn test_hand_outline_points_up() {
        let config = ClockFaceConfig::default();
        let outline = hand_outline(&config.minute_hand, 100.0);
        assert!(close(outline[1], pt2(-0.5, -50.0)));
        assert!(close(outline[2], pt2(0.5, -50.0)));
        assert!(close(outline[0], pt2(-1.0, 5.0)));
    }

    #[test]
    fn test_face_draws_ticks_and_hands() {
        let config = ClockFaceConfig::default();
        let mut surface = RecordingSurface::new();
        draw_clock_face(&mut surface, &config, &time_at(3, 0));

        // minute ticks are transparent by default: 12 hour ticks + 2 hands
        assert_eq!(surface.fills().len(), 14);
        // rim + two hand outlines
        assert_eq!(surface.strokes().len(), 3);
        assert_eq!(surface.depth(), 0);
    }

    #[test]
    fn test_hour_hand_at_three_points_right() {
        let config = ClockFaceConfig::default();
        let mut surface = RecordingSurface::new();
        draw_clock_face(&mut surface, &config, &time_at(3, 0));

        let fitted = config.bounding_box.square_fit();
        let center = fitted.center();
        let radius = fitted.width / 2.0;
        let fills = surface.fills();
        let (hour_hand, _) = fills[12];
        let tip = (hour_hand[0][1] + hour_hand[0][2]) / 2.0;
        assert!(close(tip, pt2(center.x + 0.40 * radius, center.y)));
    }

    #[test]
    fn test_first_tick_sits_at_twelve() {
        let config = ClockFaceConfig::default();
        let mut surface = RecordingSurface::new();
        draw_clock_face(&mut surface, &config, &time_at(0, 0));

        let fitted = config.bounding_box.square_fit();
        let center = fitted.center();
        let radius = fitted.width / 2.0;
        let (tick, _) = surface.fills()[0];
        let top_mid = (tick[0][0] + tick[0][1]) / 2.0;
        assert!(close(top_mid, pt2(center.x, center.y - radius)));
    }

    #[test]
    fn test_degenerate_box_draws_nothing() {
        let mut config = ClockFaceConfig::default();
        config.bounding_box.width = 0.0;
        let mut surface = RecordingSurface::new();
        draw_clock_face(&mut surface, &config, &time_at(3, 0));
        assert!(surface.ops.is_empty());
    }
}

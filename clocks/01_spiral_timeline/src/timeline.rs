//! Timeline renderer - separators, hour labels and day badges on the spiral
//!
//! One call to [`TimelineRenderer::render`] draws a complete pass for a single
//! reference instant. Nothing is carried between passes.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use nannou::prelude::{pt2, Point2};

use crate::config::{BadgePlacement, BadgeStyle, DayLabelConfig, TimelineConfig};
use crate::error::TimelineError;
use crate::events::{render_events, OverlayReport, TimelineEvent};
use crate::geometry::Bounds;
use crate::segments::{
    day_boundaries, floor_to_hour_grid, local_weekday, resolve_local, segments_from_boundaries,
    weekday_abbrev, TimelineSegment,
};
use crate::spiral::{SpiralModel, HALF_TURN_SECONDS};
use crate::surface::{show_text_centered, trace_polyline, Scoped, Surface};
use std::f32::consts::{FRAC_PI_2, PI};

/// The three rings of one render pass
#[derive(Debug, Clone, Copy)]
pub struct SpiralRings {
    pub separator: SpiralModel,
    pub label: SpiralModel,
    pub event: SpiralModel,
}

/// Text label placed on the label ring
#[derive(Debug, Clone, PartialEq)]
pub struct HourLabel {
    pub instant: DateTime<Utc>,
    pub text: String,
}

/// "+Nh" where N is the whole hours into the current 12-hour turn
pub fn hour_label_text(elapsed: Duration) -> String {
    let into_turn = elapsed.num_seconds().rem_euclid(HALF_TURN_SECONDS);
    format!("+{}h", into_turn / 3600)
}

/// Label instants on the local `step_hours` grid in `(now, now + window]`
pub fn hour_labels(
    now: DateTime<Utc>,
    window: Duration,
    step_hours: u32,
    tz: Tz,
) -> Result<Vec<HourLabel>, TimelineError> {
    if step_hours == 0 {
        return Err(TimelineError::InvalidLabelStep);
    }

    let end = now + window;
    let step = Duration::hours(step_hours as i64);
    let mut cursor = floor_to_hour_grid(now, step_hours, tz);
    let mut labels: Vec<HourLabel> = Vec::new();

    loop {
        let instant = resolve_local(cursor, tz);
        if instant > end {
            break;
        }
        let is_new = labels.last().map_or(true, |l| instant > l.instant);
        if instant > now && is_new {
            labels.push(HourLabel {
                instant,
                text: hour_label_text(instant - now),
            });
        }
        cursor += step;
    }

    Ok(labels)
}

/// Draws the spiral timeline for one configuration
pub struct TimelineRenderer<'a> {
    config: &'a TimelineConfig,
    tz: Tz,
}

impl<'a> TimelineRenderer<'a> {
    /// Validate the configuration up front so a bad palette fails before drawing
    pub fn new(config: &'a TimelineConfig, tz: Tz) -> Result<Self, TimelineError> {
        config.validate()?;
        Ok(Self { config, tz })
    }

    /// Spiral rings for a reference instant
    pub fn rings(&self, now: DateTime<Utc>) -> Result<SpiralRings, TimelineError> {
        let square: Bounds = self.config.bounding_box.square_fit().inset(self.config.margin);
        let center = square.center();
        let max_radius = (square.width / 2.0) as f64;
        let pitch = self.config.thickness as f64;
        let step = self.config.polyline_step;

        let ring = |offset: f32| {
            SpiralModel::new(now, self.tz, center, offset as f64, pitch, max_radius, step)
        };

        Ok(SpiralRings {
            separator: ring(0.0)?,
            label: ring(self.config.label_ring_offset())?,
            event: ring(self.config.event_ring_offset())?,
        })
    }

    /// Day-aligned segments from `now` to one granularity period past the window
    ///
    /// The extra period keeps the last visible day from being cut short.
    pub fn segments(
        &self,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<(Vec<DateTime<Utc>>, Vec<TimelineSegment>), TimelineError> {
        let granularity = Duration::hours(self.config.granularity_hours as i64);
        let end_plus = now + window + granularity;
        let boundaries = day_boundaries(now, end_plus, self.config.granularity_hours, self.tz)?;
        let segments = segments_from_boundaries(now, end_plus, &boundaries, self.tz);
        Ok((boundaries, segments))
    }

    /// Draw separators, hour labels and day badges
    pub fn render<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<SpiralRings, TimelineError> {
        if window <= Duration::zero() {
            return Err(TimelineError::EmptyWindow);
        }

        let rings = self.rings(now)?;
        let (boundaries, segments) = self.segments(now, window)?;

        // Resolve every style before drawing so a bad palette never half-renders
        let strokes = segments
            .iter()
            .map(|segment| self.config.weekday_stroke(segment.weekday))
            .collect::<Result<Vec<_>, _>>()?;

        for (segment, stroke) in segments.iter().zip(strokes) {
            trace_polyline(surface, rings.separator.polyline_for(segment.start, segment.end));
            surface.stroke(stroke);
        }

        for label in hour_labels(now, window, self.config.label_step_hours, self.tz)? {
            self.draw_hour_label(surface, &rings.label, &label);
        }

        for boundary in &boundaries {
            self.draw_day_badges(surface, &rings.label, *boundary)?;
        }

        Ok(rings)
    }

    /// Full pass: timeline, then the event overlay clipped to the window
    pub fn render_with_events<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        now: DateTime<Utc>,
        window: Duration,
        events: &[TimelineEvent],
    ) -> Result<OverlayReport, TimelineError> {
        let rings = self.render(surface, now, window)?;
        Ok(render_events(
            surface,
            events,
            now,
            now + window,
            &rings.event,
            &self.config.events,
        ))
    }

    fn draw_hour_label<S: Surface + ?Sized>(&self, surface: &mut S, ring: &SpiralModel, label: &HourLabel) {
        let at = ring.point_for(label.instant);
        let mut scoped = Scoped::new(surface);
        scoped.translate(at.x, at.y);
        scoped.rotate(ring.tangent_rotation(label.instant) as f32);
        show_text_centered(&mut *scoped, &label.text, &self.config.hour_label_font);
    }

    fn draw_day_badges<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        ring: &SpiralModel,
        boundary: DateTime<Utc>,
    ) -> Result<(), TimelineError> {
        let labels = &self.config.day_labels;
        let outgoing = local_weekday(boundary - Duration::seconds(1), self.tz);
        let incoming = local_weekday(boundary, self.tz);
        let outgoing_style = labels.style(outgoing)?;
        let incoming_style = labels.style(incoming)?;

        let at = ring.point_for(boundary);
        let mut scoped = Scoped::new(surface);
        scoped.translate(at.x, at.y);
        scoped.rotate(ring.tangent_rotation(boundary) as f32);

        draw_badge(
            &mut *scoped,
            labels,
            &labels.day_end_label,
            outgoing_style,
            weekday_abbrev(outgoing),
        );
        draw_badge(
            &mut *scoped,
            labels,
            &labels.day_start_label,
            incoming_style,
            weekday_abbrev(incoming),
        );
        Ok(())
    }
}

/// Rounded rectangle centered on `(placement.offset, 0)` with optional open sides
fn draw_badge<S: Surface + ?Sized>(
    surface: &mut S,
    labels: &DayLabelConfig,
    placement: &BadgePlacement,
    style: &BadgeStyle,
    text: &str,
) {
    let outline = BadgeOutline::new(placement.offset, labels.width, labels.height, labels.radius, placement);

    outline.trace(surface, true);
    surface.fill(&style.fill);

    if let Some(stroke) = &style.stroke {
        outline.trace(surface, false);
        surface.stroke(stroke);
    }

    let mut scoped = Scoped::new(surface);
    scoped.translate(placement.offset, 0.0);
    show_text_centered(&mut *scoped, text, &style.font);
}

/// Badge shape in badge-local coordinates
#[derive(Debug, Clone, Copy)]
struct BadgeOutline {
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
    radius: f32,
    open_left: bool,
    open_right: bool,
}

impl BadgeOutline {
    fn new(center_x: f32, width: f32, height: f32, radius: f32, placement: &BadgePlacement) -> Self {
        let radius = radius.clamp(0.0, width.min(height) / 2.0);
        Self {
            left: center_x - width / 2.0,
            right: center_x + width / 2.0,
            top: -height / 2.0,
            bottom: height / 2.0,
            radius,
            open_left: placement.open_left,
            open_right: placement.open_right,
        }
    }

    /// Trace the outline. Open sides keep square corners; when `closed` is
    /// false the open edges are left out so the stroke does not draw them.
    fn trace<S: Surface + ?Sized>(&self, surface: &mut S, closed: bool) {
        let r_left = if self.open_left { 0.0 } else { self.radius };
        let r_right = if self.open_right { 0.0 } else { self.radius };

        if !closed && self.open_left && self.open_right {
            trace_polyline(surface, [pt2(self.left, self.top), pt2(self.right, self.top)]);
            trace_polyline(surface, [pt2(self.right, self.bottom), pt2(self.left, self.bottom)]);
            return;
        }

        if !closed && self.open_right {
            // start at the bottom-right corner and go round to the top-right
            surface.move_to(pt2(self.right, self.bottom));
            self.bottom_edge(surface, r_left);
            self.left_side(surface, r_left);
            surface.line_to(pt2(self.right, self.top));
            return;
        }

        // top-left corner, clockwise
        surface.move_to(pt2(self.left + r_left, self.top));
        self.top_edge_and_right_side(surface, r_right);
        self.bottom_edge(surface, r_left);
        if closed || !self.open_left {
            self.left_side(surface, r_left);
            surface.close_path();
        }
    }

    fn top_edge_and_right_side<S: Surface + ?Sized>(&self, surface: &mut S, r: f32) {
        surface.line_to(pt2(self.right - r, self.top));
        corner(surface, pt2(self.right - r, self.top + r), r, -FRAC_PI_2, 0.0);
        surface.line_to(pt2(self.right, self.bottom - r));
        corner(surface, pt2(self.right - r, self.bottom - r), r, 0.0, FRAC_PI_2);
    }

    fn bottom_edge<S: Surface + ?Sized>(&self, surface: &mut S, r_left: f32) {
        surface.line_to(pt2(self.left + r_left, self.bottom));
    }

    fn left_side<S: Surface + ?Sized>(&self, surface: &mut S, r: f32) {
        corner(surface, pt2(self.left + r, self.bottom - r), r, FRAC_PI_2, PI);
        surface.line_to(pt2(self.left, self.top + r));
        corner(surface, pt2(self.left + r, self.top + r), r, PI, PI + FRAC_PI_2);
    }
}

fn corner<S: Surface + ?Sized>(surface: &mut S, center: Point2, radius: f32, a0: f32, a1: f32) {
    if radius > 0.0 {
        surface.arc(center, radius, a0, a1);
    }
}

//! Event overlay - calendar events drawn as arcs on the spiral
//!
//! Events arrive as an immutable snapshot, already sorted by the feed.
//! They are drawn in the order given; later events paint over earlier ones.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::{EventOverlayConfig, EventStyle};
use crate::error::EventError;
use crate::spiral::SpiralModel;
use crate::surface::{trace_polyline, LineCap, StrokeStyle, Surface};

/// A time-ranged item supplied by an event source
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Date-granular event; `start`/`end` are local midnights
    pub all_day: bool,
    /// Name of the source that produced the event
    pub source: String,
}

impl TimelineEvent {
    /// Reject events that cannot be placed on a timeline
    pub fn check(&self) -> Result<(), EventError> {
        if self.end < self.start {
            return Err(EventError::EndBeforeStart {
                id: self.id.clone(),
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

/// Snapshot handed from the feed to the renderer
pub type EventSnapshot = Arc<[TimelineEvent]>;

/// Intersection of `[start, end)` with `[window_start, window_end]`
///
/// `None` when the intersection is empty or inverted.
pub fn clip_to_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let clipped_start = start.max(window_start);
    let clipped_end = end.min(window_end);
    (clipped_start < clipped_end).then_some((clipped_start, clipped_end))
}

/// What happened to each event in a render pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayReport {
    pub drawn: usize,
    /// Outside the visible window
    pub hidden: usize,
    /// Malformed, logged and skipped
    pub rejected: usize,
}

/// Draw `events` onto the event ring
///
/// Timed events get a thick round-capped stroke over their visible part.
/// All-day events get a thin stroke over their visible part plus round caps
/// at their own start and end, even when those fall outside the window.
pub fn render_events<S: Surface + ?Sized>(
    surface: &mut S,
    events: &[TimelineEvent],
    now: DateTime<Utc>,
    window_end: DateTime<Utc>,
    ring: &SpiralModel,
    policy: &EventOverlayConfig,
) -> OverlayReport {
    let mut report = OverlayReport::default();

    for event in events {
        if let Err(err) = event.check() {
            log::warn!("skipping event: {}", err);
            report.rejected += 1;
            continue;
        }

        let Some((start, end)) = clip_to_window(event.start, event.end, now, window_end) else {
            report.hidden += 1;
            continue;
        };

        let style = policy.style_for(&event.source);
        if event.all_day {
            draw_all_day(surface, event, start, end, ring, style);
        } else {
            trace_polyline(surface, ring.polyline_for(start, end));
            surface.stroke(&body_stroke(style, style.width));
        }
        report.drawn += 1;
    }

    report
}

fn body_stroke(style: &EventStyle, width: f32) -> StrokeStyle {
    StrokeStyle::solid(style.colour, width).with_cap(LineCap::Round)
}

fn draw_all_day<S: Surface + ?Sized>(
    surface: &mut S,
    event: &TimelineEvent,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    ring: &SpiralModel,
    style: &EventStyle,
) {
    trace_polyline(surface, ring.polyline_for(start, end));
    surface.stroke(&body_stroke(style, style.all_day_width));

    // A collapsed polyline is a duplicated point; with a round cap it draws a dot
    let cap = body_stroke(style, style.all_day_cap_width);
    for anchor in [event.start, event.end] {
        trace_polyline(surface, ring.polyline_for(anchor, anchor));
        surface.stroke(&cap);
    }
}

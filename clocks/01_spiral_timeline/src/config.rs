//! Clock configuration
//!
//! Loaded once from `spiral_timeline.toml` and treated as read-only by every
//! render pass. Missing keys fall back to the defaults below.

use chrono::{Duration, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::TimelineError;
use crate::geometry::Bounds;
use crate::segments::{weekday_key, ALL_WEEKDAYS};
use crate::surface::{FillStyle, FontSpec, LineCap, Rgba, StrokeStyle, BLACK, WHITE};

/// Weekday colours, Monday first
pub const PALETTE: [(&str, Rgba); 7] = [
    ("monday", [0.60, 0.00, 0.00, 1.0]),
    ("tuesday", [0.60, 0.27, 0.00, 1.0]),
    ("wednesday", [0.66, 0.50, 0.01, 1.0]),
    ("thursday", [0.05, 0.54, 0.00, 1.0]),
    ("friday", [0.00, 0.51, 0.35, 1.0]),
    ("saturday", [0.00, 0.39, 0.51, 1.0]),
    ("sunday", [0.51, 0.00, 0.46, 1.0]),
];

const MONO: &str = "FreeMono";
const SANS: &str = "DejaVu Sans";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// IANA zone for local dates and hand positions; empty means system zone
    pub timezone: String,
    /// How far ahead the spiral reaches
    pub timespan_hours: u32,
    /// Seconds between redraw ticks
    pub refresh_seconds: u64,
    pub window: WindowConfig,
    pub heading: HeadingConfig,
    pub clock: ClockFaceConfig,
    pub timeline: TimelineConfig,
    pub event_list: EventListConfig,
    pub sources: Vec<SourceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: String::new(),
            timespan_hours: 24 * 6,
            refresh_seconds: 5,
            window: WindowConfig::default(),
            heading: HeadingConfig::default(),
            clock: ClockFaceConfig::default(),
            timeline: TimelineConfig::default(),
            event_list: EventListConfig::default(),
            sources: vec![SourceConfig::Demo {
                refresh_seconds: 120,
            }],
        }
    }
}

impl Config {
    /// Resolve the configured zone, falling back to the system zone then UTC
    pub fn tz(&self) -> Result<Tz, TimelineError> {
        if self.timezone.is_empty() {
            return Ok(shared::system_timezone().unwrap_or(Tz::UTC));
        }
        shared::parse_timezone(&self.timezone)
            .map_err(|_| TimelineError::UnknownTimezone(self.timezone.clone()))
    }

    pub fn timespan(&self) -> Duration {
        Duration::hours(self.timespan_hours as i64)
    }

    /// Check everything a render pass would otherwise trip over
    pub fn validate(&self) -> Result<(), TimelineError> {
        self.tz()?;
        if self.timespan_hours == 0 {
            return Err(TimelineError::EmptyWindow);
        }
        self.timeline.validate()
    }
}

/// The configuration in use, and whether it came from a readable file
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// Why the timeline cannot be drawn, shown in place of it
    pub error: Option<String>,
    /// False when the file on disk could not be read; it is never overwritten then
    pub writable: bool,
}

impl LoadedConfig {
    /// Fall back to defaults on any problem
    pub fn from_load(loaded: Result<Option<Config>, shared::ConfigError>) -> Self {
        let config = match loaded {
            Ok(Some(config)) => config,
            Ok(None) => Config::default(),
            Err(err) => {
                log::error!("{}", err);
                return Self {
                    config: Config::default(),
                    error: Some(err.to_string()),
                    writable: false,
                };
            }
        };

        let error = config.validate().err().map(|err| {
            log::error!("invalid configuration: {}", err);
            err.to_string()
        });
        Self {
            config,
            error,
            writable: true,
        }
    }

    /// Take validated settings; returns whether they should be saved
    pub fn apply(&mut self, updated: Config) -> bool {
        self.config = updated;
        self.error = None;
        if !self.writable {
            log::warn!("configuration file could not be read; settings are not saved");
        }
        self.writable
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub background_colour: Rgba,
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 480,
            background_colour: BLACK,
            fullscreen: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingConfig {
    pub bounding_box: Bounds,
    pub fill: Option<FillStyle>,
    pub font: FontSpec,
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            bounding_box: Bounds::new(0.0, 0.0, 800.0, 40.0),
            fill: Some(FillStyle { colour: WHITE }),
            font: FontSpec::new(MONO, 30.0, BLACK).italic(),
        }
    }
}

/// Rectangular tick marks around the face rim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickConfig {
    pub fill: FillStyle,
    /// Length as a fraction of the face radius
    pub depth_pc: f32,
    /// Width as a fraction of the face radius
    pub thickness_pc: f32,
}

/// Tapered hand, sizes as fractions of the face radius
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandConfig {
    pub fill: FillStyle,
    pub stroke: Option<StrokeStyle>,
    pub front_depth_pc: f32,
    pub back_depth_pc: f32,
    pub front_thickness_pc: f32,
    pub back_thickness_pc: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockFaceConfig {
    pub bounding_box: Bounds,
    pub face_stroke: Option<StrokeStyle>,
    pub hour_ticks: TickConfig,
    pub minute_ticks: TickConfig,
    pub hour_hand: HandConfig,
    pub minute_hand: HandConfig,
}

impl Default for ClockFaceConfig {
    fn default() -> Self {
        let outline = StrokeStyle::solid(BLACK, 1.0);
        Self {
            bounding_box: Bounds::new(20.0, 70.0, 390.0, 390.0),
            face_stroke: Some(StrokeStyle::solid(WHITE, 1.5)),
            hour_ticks: TickConfig {
                fill: FillStyle { colour: WHITE },
                depth_pc: 0.01,
                thickness_pc: 0.01,
            },
            minute_ticks: TickConfig {
                fill: FillStyle {
                    colour: [0.0, 0.0, 0.0, 0.0],
                },
                depth_pc: 0.01,
                thickness_pc: 0.01,
            },
            hour_hand: HandConfig {
                fill: FillStyle { colour: WHITE },
                stroke: Some(outline.clone()),
                front_depth_pc: 0.40,
                back_depth_pc: 0.05,
                front_thickness_pc: 0.015,
                back_thickness_pc: 0.03,
            },
            minute_hand: HandConfig {
                fill: FillStyle {
                    colour: [0.5, 0.5, 1.0, 1.0],
                },
                stroke: Some(outline),
                front_depth_pc: 0.50,
                back_depth_pc: 0.05,
                front_thickness_pc: 0.01,
                back_thickness_pc: 0.02,
            },
        }
    }
}

/// Where a day badge sits relative to its boundary point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BadgePlacement {
    /// Tangential offset of the badge center, positive = later in time
    pub offset: f32,
    pub open_left: bool,
    pub open_right: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeStyle {
    pub fill: FillStyle,
    pub stroke: Option<StrokeStyle>,
    pub font: FontSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayLabelConfig {
    pub width: f32,
    pub height: f32,
    pub radius: f32,
    /// Badge naming the day that begins at the boundary
    pub day_start_label: BadgePlacement,
    /// Badge naming the day that ends at the boundary
    pub day_end_label: BadgePlacement,
    /// Keyed by lowercase weekday name
    pub styles: BTreeMap<String, BadgeStyle>,
}

impl Default for DayLabelConfig {
    fn default() -> Self {
        let styles = PALETTE
            .iter()
            .map(|(day, colour)| {
                let style = BadgeStyle {
                    fill: FillStyle { colour: *colour },
                    stroke: Some(StrokeStyle::solid(WHITE, 1.5)),
                    font: FontSpec::new(MONO, 8.0, WHITE).bold(),
                };
                (day.to_string(), style)
            })
            .collect();

        Self {
            width: 24.0,
            height: 12.0,
            radius: 3.0,
            day_start_label: BadgePlacement {
                offset: 12.0,
                open_left: true,
                open_right: false,
            },
            day_end_label: BadgePlacement {
                offset: -12.0,
                open_left: false,
                open_right: true,
            },
            styles,
        }
    }
}

impl DayLabelConfig {
    pub fn style(&self, weekday: Weekday) -> Result<&BadgeStyle, TimelineError> {
        let key = weekday_key(weekday);
        self.styles
            .get(key)
            .ok_or_else(|| TimelineError::MissingDayLabelStyle(key.to_string()))
    }
}

/// Rendering policy for one event source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStyle {
    pub colour: Rgba,
    /// Body stroke width for timed events
    pub width: f32,
    /// Body stroke width for all-day events
    pub all_day_width: f32,
    /// Diameter of the round end caps on all-day events
    pub all_day_cap_width: f32,
}

impl Default for EventStyle {
    fn default() -> Self {
        Self {
            colour: [1.0, 0.0, 0.0, 1.0],
            width: 10.0,
            all_day_width: 2.0,
            all_day_cap_width: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventOverlayConfig {
    /// Inward offset of the event ring; `None` means half the thickness
    pub ring_offset: Option<f32>,
    pub default_style: EventStyle,
    /// Overrides keyed by source name
    pub sources: BTreeMap<String, EventStyle>,
}

impl Default for EventOverlayConfig {
    fn default() -> Self {
        Self {
            ring_offset: None,
            default_style: EventStyle::default(),
            sources: BTreeMap::new(),
        }
    }
}

impl EventOverlayConfig {
    pub fn style_for(&self, source: &str) -> &EventStyle {
        self.sources.get(source).unwrap_or(&self.default_style)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub bounding_box: Bounds,
    /// Gap between the bounding square and the outermost ring
    pub margin: f32,
    /// Radial pitch of the spiral in pixels per 12-hour turn
    pub thickness: f32,
    pub granularity_hours: u32,
    pub label_step_hours: u32,
    /// Angular sampling step of spiral polylines, radians
    pub polyline_step: f64,
    /// Inward offset of the hour-label and badge ring; `None` means half the thickness
    pub label_ring_offset: Option<f32>,
    pub hour_label_font: FontSpec,
    /// Separator stroke per weekday, keyed by lowercase weekday name
    pub weekday_strokes: BTreeMap<String, StrokeStyle>,
    pub day_labels: DayLabelConfig,
    pub events: EventOverlayConfig,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        let weekday_strokes = PALETTE
            .iter()
            .map(|(day, colour)| {
                let stroke = StrokeStyle::solid(*colour, 1.5).with_cap(LineCap::Butt);
                (day.to_string(), stroke)
            })
            .collect();

        Self {
            bounding_box: Bounds::new(20.0, 70.0, 390.0, 390.0),
            margin: 0.0,
            thickness: 15.0,
            granularity_hours: 24,
            label_step_hours: 3,
            polyline_step: crate::spiral::DEFAULT_STEP,
            label_ring_offset: None,
            hour_label_font: FontSpec::new(MONO, 7.0, [0.7, 0.7, 0.7, 1.0]),
            weekday_strokes,
            day_labels: DayLabelConfig::default(),
            events: EventOverlayConfig::default(),
        }
    }
}

impl TimelineConfig {
    pub fn validate(&self) -> Result<(), TimelineError> {
        if !self.thickness.is_finite() || self.thickness <= 0.0 {
            return Err(TimelineError::InvalidPitch(self.thickness as f64));
        }
        if self.granularity_hours == 0 {
            return Err(TimelineError::InvalidGranularity);
        }
        if self.label_step_hours == 0 {
            return Err(TimelineError::InvalidLabelStep);
        }
        for weekday in ALL_WEEKDAYS {
            self.weekday_stroke(weekday)?;
            self.day_labels.style(weekday)?;
        }
        Ok(())
    }

    pub fn weekday_stroke(&self, weekday: Weekday) -> Result<&StrokeStyle, TimelineError> {
        let key = weekday_key(weekday);
        self.weekday_strokes
            .get(key)
            .ok_or_else(|| TimelineError::MissingWeekdayStyle(key.to_string()))
    }

    pub fn label_ring_offset(&self) -> f32 {
        self.label_ring_offset.unwrap_or(self.thickness / 2.0)
    }

    pub fn event_ring_offset(&self) -> f32 {
        self.events.ring_offset.unwrap_or(self.thickness / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventListConfig {
    pub bounding_box: Bounds,
    pub heading_font: FontSpec,
    pub heading_height: f32,
    pub event_font: FontSpec,
    pub event_height: f32,
    pub today_heading: String,
    pub tomorrow_heading: String,
    pub max_events: usize,
}

impl Default for EventListConfig {
    fn default() -> Self {
        Self {
            bounding_box: Bounds::new(520.0, 40.0, 300.0, 400.0),
            heading_font: FontSpec::new(SANS, 24.0, WHITE).italic(),
            heading_height: 40.0,
            event_font: FontSpec::new(SANS, 16.0, WHITE),
            event_height: 20.0,
            today_heading: "Today".to_string(),
            tomorrow_heading: "Tomorrow".to_string(),
            max_events: 20,
        }
    }
}

/// An event source and its polling period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Demo {
        #[serde(default = "default_source_refresh")]
        refresh_seconds: u64,
    },
    File {
        path: String,
        #[serde(default = "default_source_refresh")]
        refresh_seconds: u64,
    },
}

fn default_source_refresh() -> u64 {
    120
}

impl SourceConfig {
    pub fn refresh_seconds(&self) -> u64 {
        match self {
            SourceConfig::Demo { refresh_seconds } | SourceConfig::File { refresh_seconds, .. } => {
                *refresh_seconds
            }
        }
    }
}

//! Error types for the spiral timeline
//!
//! `TimelineError` is a configuration error and aborts the render pass.
//! `EventError` and `SourceError` are per-item and per-source; callers log
//! them and carry on with whatever data is still valid.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    #[error("spiral thickness must be a positive finite number of pixels, got {0}")]
    InvalidPitch(f64),
    #[error("day boundary granularity must be at least one hour")]
    InvalidGranularity,
    #[error("hour label step must be at least one hour")]
    InvalidLabelStep,
    #[error("visible timespan must be at least one hour")]
    EmptyWindow,
    #[error("no timeline stroke style configured for {0}")]
    MissingWeekdayStyle(String),
    #[error("no day label style configured for {0}")]
    MissingDayLabelStyle(String),
    #[error("unknown time zone {0:?}")]
    UnknownTimezone(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventError {
    #[error("event {id:?} ends ({end}) before it starts ({start})")]
    EndBeforeStart {
        id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("event {id:?} has no {field}")]
    MissingInstant { id: String, field: &'static str },
    #[error("event {id:?} has an unreadable {field}: {value:?}")]
    BadInstant {
        id: String,
        field: &'static str,
        value: String,
    },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

//! Event sources and the background feed that polls them
//!
//! Sources are polled on a worker thread. Each poll merges the latest items
//! of every source, sorts them by start time and publishes the result as an
//! immutable snapshot; the render loop only ever picks up whole snapshots.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::SourceConfig;
use crate::error::{EventError, SourceError};
use crate::events::{EventSnapshot, TimelineEvent};
use crate::segments::resolve_local;

/// Something that can list timeline items for a time frame
pub trait EventSource: Send {
    /// Name used to route rendering policy for this source's events
    fn name(&self) -> &str;

    /// Items overlapping `[start, end]`
    fn timeline_items(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimelineEvent>, SourceError>;
}

/// Fixed sample items relative to the requested window
pub struct DemoSource {
    tz: Tz,
}

impl DemoSource {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl EventSource for DemoSource {
    fn name(&self) -> &str {
        "demo"
    }

    fn timeline_items(
        &mut self,
        start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<TimelineEvent>, SourceError> {
        let tomorrow = start.with_timezone(&self.tz).date_naive() + Duration::days(1);
        let (day_start, day_end) = local_day_bounds(tomorrow, self.tz);

        Ok(vec![
            TimelineEvent {
                id: "demo-0".to_string(),
                title: "Demo event".to_string(),
                start: start + Duration::minutes(10),
                end: start + Duration::minutes(30),
                all_day: false,
                source: self.name().to_string(),
            },
            TimelineEvent {
                id: "demo-1".to_string(),
                title: "Demo all-day event".to_string(),
                start: day_start,
                end: day_end,
                all_day: true,
                source: self.name().to_string(),
            },
        ])
    }
}

/// Local midnight to the following local midnight
pub fn local_day_bounds(date: NaiveDate, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = |d: NaiveDate| resolve_local(d.and_time(chrono::NaiveTime::MIN), tz);
    (midnight(date), midnight(date + Duration::days(1)))
}

#[derive(Debug, Deserialize)]
struct EventFile {
    #[serde(default, rename = "event")]
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: String,
    #[serde(default)]
    title: String,
    start: Option<String>,
    end: Option<String>,
}

/// Either an RFC 3339 instant or a `YYYY-MM-DD` date
enum When {
    Instant(DateTime<Utc>),
    Date(NaiveDate),
}

fn parse_when(id: &str, field: &'static str, value: Option<&str>) -> Result<When, EventError> {
    let value = value.ok_or_else(|| EventError::MissingInstant {
        id: id.to_string(),
        field,
    })?;
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(When::Instant(instant.with_timezone(&Utc)));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(When::Date(date));
    }
    Err(EventError::BadInstant {
        id: id.to_string(),
        field,
        value: value.to_string(),
    })
}

impl RawEvent {
    fn into_event(self, source: &str, tz: Tz) -> Result<TimelineEvent, EventError> {
        let start = parse_when(&self.id, "start", self.start.as_deref())?;
        let end = parse_when(&self.id, "end", self.end.as_deref())?;

        let (start, end, all_day) = match (start, end) {
            (When::Instant(s), When::Instant(e)) => (s, e, false),
            // date-only bounds use the calendar convention of an exclusive end date
            (When::Date(s), When::Date(e)) => (local_day_bounds(s, tz).0, local_day_bounds(e, tz).0, true),
            (When::Date(s), When::Instant(e)) => (local_day_bounds(s, tz).0, e, true),
            (When::Instant(s), When::Date(e)) => (s, local_day_bounds(e, tz).0, true),
        };

        let event = TimelineEvent {
            id: self.id,
            title: self.title,
            start,
            end,
            all_day,
            source: source.to_string(),
        };
        event.check()?;
        Ok(event)
    }
}

/// Parse an event file, skipping malformed entries
pub fn parse_event_file(
    text: &str,
    path: &str,
    source: &str,
    tz: Tz,
) -> Result<Vec<TimelineEvent>, SourceError> {
    let file: EventFile = toml::from_str(text).map_err(|source| SourceError::Parse {
        path: path.to_string(),
        source,
    })?;

    let events = file
        .events
        .into_iter()
        .filter_map(|raw| match raw.into_event(source, tz) {
            Ok(event) => Some(event),
            Err(err) => {
                log::warn!("{}: skipping event: {}", path, err);
                None
            }
        })
        .collect();
    Ok(events)
}

/// Events read from a TOML file of `[[event]]` tables
pub struct FileSource {
    name: String,
    path: PathBuf,
    tz: Tz,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, tz: Tz) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        Self { name, path, tz }
    }
}

impl EventSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeline_items(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimelineEvent>, SourceError> {
        let display = self.path.display().to_string();
        let text = std::fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: display.clone(),
            source,
        })?;
        let events = parse_event_file(&text, &display, &self.name, self.tz)?;
        Ok(events
            .into_iter()
            .filter(|e| e.end >= start && e.start <= end)
            .collect())
    }
}

/// Build the sources named in the configuration
pub fn build_sources(configs: &[SourceConfig], tz: Tz) -> Vec<(Box<dyn EventSource>, Duration)> {
    configs
        .iter()
        .map(|config| {
            let source: Box<dyn EventSource> = match config {
                SourceConfig::Demo { .. } => Box::new(DemoSource::new(tz)),
                SourceConfig::File { path, .. } => Box::new(FileSource::new(path, tz)),
            };
            let period = Duration::seconds(config.refresh_seconds().max(1) as i64);
            (source, period)
        })
        .collect()
}

/// Per-source polling state inside the worker
struct Poller {
    source: Box<dyn EventSource>,
    period: Duration,
    last_poll: Option<DateTime<Utc>>,
    items: Vec<TimelineEvent>,
}

impl Poller {
    fn due(&self, now: DateTime<Utc>) -> bool {
        self.last_poll.map_or(true, |last| now - last >= self.period)
    }

    /// Refresh if due; a failing source keeps its previous items
    fn poll(&mut self, now: DateTime<Utc>, horizon: Duration) -> bool {
        if !self.due(now) {
            return false;
        }
        self.last_poll = Some(now);
        match self.source.timeline_items(now, now + horizon) {
            Ok(items) => {
                log::debug!("{}: {} items", self.source.name(), items.len());
                self.items = items;
                true
            }
            Err(err) => {
                log::warn!("{}: refresh failed: {}", self.source.name(), err);
                false
            }
        }
    }
}

/// Merge per-source items into one snapshot sorted by start time
pub fn merge_snapshot<'a, I>(lists: I) -> EventSnapshot
where
    I: IntoIterator<Item = &'a [TimelineEvent]>,
{
    let mut merged: Vec<TimelineEvent> = lists.into_iter().flatten().cloned().collect();
    merged.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.end.cmp(&b.end)));
    merged.into()
}

/// Background worker publishing event snapshots
pub struct EventFeed {
    receiver: Receiver<EventSnapshot>,
    latest: EventSnapshot,
    /// Look-ahead in seconds, read by the worker on every tick
    horizon: Arc<AtomicI64>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl EventFeed {
    /// Interval at which the worker wakes to check its sources
    const TICK: std::time::Duration = std::time::Duration::from_millis(500);

    pub fn start(sources: Vec<(Box<dyn EventSource>, Duration)>, horizon: Duration) -> Self {
        let (sender, receiver) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);
        let horizon = Arc::new(AtomicI64::new(horizon.num_seconds()));
        let worker_horizon = Arc::clone(&horizon);

        let pollers = sources
            .into_iter()
            .map(|(source, period)| Poller {
                source,
                period,
                last_poll: None,
                items: Vec::new(),
            })
            .collect();

        let worker = thread::Builder::new()
            .name("event-feed".to_string())
            .spawn(move || run_feed(pollers, worker_horizon, sender, worker_stop));

        let worker = match worker {
            Ok(handle) => {
                log::info!("event feed started");
                Some(handle)
            }
            Err(err) => {
                log::error!("could not start event feed: {}", err);
                None
            }
        };

        Self {
            receiver,
            latest: Arc::from(Vec::new()),
            horizon,
            stop,
            worker,
        }
    }

    /// Most recent snapshot, draining anything newer from the worker
    pub fn latest(&mut self) -> EventSnapshot {
        while let Ok(snapshot) = self.receiver.try_recv() {
            self.latest = snapshot;
        }
        Arc::clone(&self.latest)
    }

    /// Change how far ahead sources are asked for; every source is polled again
    pub fn set_horizon(&self, horizon: Duration) {
        let seconds = horizon.num_seconds();
        if self.horizon.swap(seconds, Ordering::Relaxed) != seconds {
            log::info!("event horizon now {}h", horizon.num_hours());
        }
    }
}

impl Drop for EventFeed {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("event feed worker panicked");
            }
        }
        log::info!("event feed stopped");
    }
}

fn run_feed(
    mut pollers: Vec<Poller>,
    horizon: Arc<AtomicI64>,
    sender: Sender<EventSnapshot>,
    stop: Arc<AtomicBool>,
) {
    let mut current = horizon.load(Ordering::Relaxed);
    while !stop.load(Ordering::Relaxed) {
        let requested = horizon.load(Ordering::Relaxed);
        if requested != current {
            current = requested;
            for poller in pollers.iter_mut() {
                poller.last_poll = None;
            }
        }
        let horizon = Duration::seconds(current);

        let now = Utc::now();
        let mut changed = false;
        for poller in pollers.iter_mut() {
            changed |= poller.poll(now, horizon);
        }

        if changed {
            let snapshot = merge_snapshot(pollers.iter().map(|p| p.items.as_slice()));
            if sender.send(snapshot).is_err() {
                break;
            }
        }

        thread::sleep(EventFeed::TICK);
    }
}

//! Upcoming events as a text list, grouped by local date

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use nannou::prelude::pt2;

use crate::config::EventListConfig;
use crate::events::TimelineEvent;
use crate::surface::{Scoped, Surface};

#[derive(Debug, Clone, PartialEq)]
pub enum ListRow {
    Heading(String),
    Event { time: String, title: String },
}

fn day_heading(date: NaiveDate, today: NaiveDate, config: &EventListConfig) -> String {
    if date == today {
        config.today_heading.clone()
    } else if date == today + Duration::days(1) {
        config.tomorrow_heading.clone()
    } else {
        date.format("%A").to_string()
    }
}

/// Rows for every event still running at `now`, in the order given
///
/// Events already in progress are listed under today.
pub fn group_events(
    events: &[TimelineEvent],
    now: DateTime<Utc>,
    tz: Tz,
    config: &EventListConfig,
) -> Vec<ListRow> {
    let today = now.with_timezone(&tz).date_naive();
    let mut rows = Vec::new();
    let mut current_day = None;

    for event in events.iter().filter(|e| e.end > now).take(config.max_events) {
        let date = event.start.max(now).with_timezone(&tz).date_naive();
        if current_day != Some(date) {
            rows.push(ListRow::Heading(day_heading(date, today, config)));
            current_day = Some(date);
        }

        let time = if event.all_day {
            "All day".to_string()
        } else {
            event.start.with_timezone(&tz).format("%H:%M").to_string()
        };
        rows.push(ListRow::Event {
            time,
            title: event.title.clone(),
        });
    }
    rows
}

/// Draw `rows` top-down inside the list box; rows that would overflow it are dropped
pub fn draw_event_list<S: Surface + ?Sized>(surface: &mut S, rows: &[ListRow], config: &EventListConfig) -> usize {
    let bounds = config.bounding_box;
    let mut scoped = Scoped::new(surface);
    scoped.translate(bounds.left, bounds.top);

    scoped.set_font(&config.event_font);
    let (time_column, _) = scoped.measure_text("All day  ");

    let mut y = 0.0;
    let mut drawn = 0;
    for row in rows {
        let height = match row {
            ListRow::Heading(_) => config.heading_height,
            ListRow::Event { .. } => config.event_height,
        };
        if y + height > bounds.height {
            break;
        }

        match row {
            ListRow::Heading(text) => {
                scoped.set_font(&config.heading_font);
                scoped.move_to(pt2(0.0, y + config.heading_font.size));
                scoped.show_text(text);
            }
            ListRow::Event { time, title } => {
                scoped.set_font(&config.event_font);
                let baseline = y + config.event_font.size;
                scoped.move_to(pt2(0.0, baseline));
                scoped.show_text(time);
                scoped.move_to(pt2(time_column, baseline));
                scoped.show_text(title);
            }
        }
        y += height;
        drawn += 1;
    }
    drawn
}

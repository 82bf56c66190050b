//! Spiral Timeline Clock
//!
//! An analog clock face wrapped in an Archimedean spiral that winds inward
//! from "now", one turn per twelve hours. Day boundaries, hour offsets and
//! calendar events are laid out along the spiral.

mod clock_face;
mod config;
mod drawing;
mod error;
mod event_list;
mod events;
mod geometry;
mod nannou_surface;
mod segments;
mod sources;
mod spiral;
mod surface;
mod timeline;
mod ui;

use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use nannou::prelude::*;
use nannou_egui::{self, Egui};
use shared::{compute_clock_time_at, ClockTime};

use crate::config::{Config, LoadedConfig};
use crate::error::TimelineError;
use crate::events::EventSnapshot;
use crate::nannou_surface::NannouSurface;
use crate::sources::{build_sources, EventFeed};
use crate::timeline::TimelineRenderer;
use crate::ui::SettingsState;

const CLOCK_NAME: &str = "spiral_timeline";

fn main() {
    env_logger::init();
    nannou::app(model).update(update).run();
}

/// Application state
pub struct Model {
    loaded: LoadedConfig,
    tz: Tz,

    // Reference instant shared by every part of a render pass
    now: DateTime<Utc>,
    clock_time: ClockTime,
    last_tick: Instant,

    feed: EventFeed,
    events: EventSnapshot,

    settings: SettingsState,
    settings_error: Option<String>,

    egui: Egui,
}

impl Model {
    /// Sample the clock; everything drawn until the next tick uses this instant
    fn tick(&mut self) {
        self.now = Utc::now();
        self.clock_time = compute_clock_time_at(self.tz, self.now);
        self.last_tick = Instant::now();
        log::debug!("tick at {}", self.now);
    }

    fn config(&self) -> &Config {
        &self.loaded.config
    }

    fn tick_due(&self) -> bool {
        self.last_tick.elapsed() >= StdDuration::from_secs(self.config().refresh_seconds.max(1))
    }

    fn apply_settings(&mut self) {
        match self.settings.apply_to(self.config()) {
            Ok(updated) => {
                let writable = self.loaded.apply(updated);
                self.feed.set_horizon(self.config().timespan());
                self.settings_error = None;
                self.settings.close();
                if writable {
                    save_config(self.config());
                }
            }
            Err(err) => {
                log::warn!("rejected settings: {}", err);
                self.settings_error = Some(err.to_string());
            }
        }
    }
}

fn save_config(config: &Config) {
    if let Err(e) = shared::save_config(CLOCK_NAME, config) {
        log::error!("Failed to save config: {}", e);
    }
}

fn model(app: &App) -> Model {
    app.set_exit_on_escape(false);

    let loaded = LoadedConfig::from_load(shared::load_config::<Config>(CLOCK_NAME));
    let config = &loaded.config;
    let tz = config.tz().unwrap_or(Tz::UTC);

    let window_id = app
        .new_window()
        .title("Spiral Timeline Clock")
        .size(config.window.width, config.window.height)
        .view(view)
        .key_pressed(key_pressed)
        .raw_event(raw_window_event)
        .build()
        .unwrap_or_else(|err| {
            log::error!("could not open window: {:?}", err);
            std::process::exit(1);
        });

    let Some(window) = app.window(window_id) else {
        log::error!("window closed during startup");
        std::process::exit(1);
    };
    if config.window.fullscreen {
        window.set_fullscreen(true);
    }
    let egui = Egui::from_window(&window);

    let feed = EventFeed::start(build_sources(&config.sources, tz), config.timespan());

    let now = Utc::now();
    Model {
        clock_time: compute_clock_time_at(tz, now),
        now,
        last_tick: Instant::now(),
        loaded,
        tz,
        feed,
        events: EventSnapshot::from(Vec::new()),
        settings: SettingsState::default(),
        settings_error: None,
        egui,
    }
}

fn update(_app: &App, model: &mut Model, update: Update) {
    if model.tick_due() {
        model.tick();
    }
    model.events = model.feed.latest();

    model.egui.set_elapsed_time(update.since_start);
    let ctx = model.egui.begin_frame();
    let ui_result = ui::draw_settings_panel(&ctx, &mut model.settings, model.settings_error.as_deref());
    drop(ctx);

    if ui_result.apply {
        model.apply_settings();
    }
    if ui_result.close {
        model.settings.close();
        model.settings_error = None;
    }
}

/// Everything drawn through the surface for one pass
fn render_pass(surface: &mut NannouSurface, model: &Model) -> Result<(), TimelineError> {
    let config = model.config();

    drawing::draw_heading(surface, &config.heading, &model.clock_time);

    let renderer = TimelineRenderer::new(&config.timeline, model.tz)?;
    let report = renderer.render_with_events(surface, model.now, config.timespan(), &model.events)?;
    log::trace!(
        "events: {} drawn, {} hidden, {} rejected",
        report.drawn,
        report.hidden,
        report.rejected
    );

    clock_face::draw_clock_face(surface, &config.clock, &model.clock_time);

    let rows = event_list::group_events(&model.events, model.now, model.tz, &config.event_list);
    event_list::draw_event_list(surface, &rows, &config.event_list);
    Ok(())
}

fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    let window_rect = app.window_rect();

    draw.background()
        .color(nannou_surface::colour(model.config().window.background_colour));

    match &model.loaded.error {
        Some(message) => drawing::draw_error_banner(&draw, window_rect, message),
        None => {
            let mut surface = NannouSurface::new(&draw, window_rect);
            if let Err(err) = render_pass(&mut surface, model) {
                drawing::draw_error_banner(&draw, window_rect, &err.to_string());
            }
        }
    }

    if let Err(err) = draw.to_frame(app, &frame) {
        log::error!("failed to render frame: {:?}", err);
    }
    if let Err(err) = model.egui.draw_to_frame(&frame) {
        log::error!("failed to render settings panel: {:?}", err);
    }
}

fn key_pressed(_app: &App, model: &mut Model, key: Key) {
    match key {
        // S - toggle settings panel
        Key::S => {
            model.settings_error = None;
            model.settings.toggle(&model.loaded.config);
        }

        // Escape - close settings panel
        Key::Escape => {
            model.settings.close();
            model.settings_error = None;
        }

        _ => {}
    }
}

fn raw_window_event(_app: &App, model: &mut Model, event: &nannou::winit::event::WindowEvent) {
    model.egui.handle_raw_event(event);
}

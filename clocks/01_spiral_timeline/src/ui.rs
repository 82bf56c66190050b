//! UI module - egui settings panel for spiral pitch and visible days
//!
//! Provides the interactive settings window using nannou_egui.

use nannou_egui::egui;

use crate::config::Config;
use crate::error::TimelineError;

pub const PITCH_RANGE: std::ops::RangeInclusive<f32> = 4.0..=40.0;
pub const DAYS_RANGE: std::ops::RangeInclusive<u32> = 1..=14;

/// Edit buffer for the settings panel
#[derive(Debug, Default)]
pub struct SettingsState {
    pub is_open: bool,
    pub thickness: f32,
    pub days: u32,
}

impl SettingsState {
    /// Open with the current configuration as starting values
    pub fn open(&mut self, config: &Config) {
        self.is_open = true;
        self.thickness = config.timeline.thickness;
        self.days = (config.timespan_hours / 24).max(1);
    }

    pub fn close(&mut self) {
        self.is_open = false;
    }

    pub fn toggle(&mut self, config: &Config) {
        if self.is_open {
            self.close();
        } else {
            self.open(config);
        }
    }

    /// A copy of `config` with the edited values, validated
    pub fn apply_to(&self, config: &Config) -> Result<Config, TimelineError> {
        let mut updated = config.clone();
        updated.timeline.thickness = self.thickness;
        updated.timespan_hours = self.days * 24;
        updated.validate()?;
        Ok(updated)
    }
}

/// Result of UI interactions
#[derive(Debug, Default)]
pub struct UiResult {
    /// The user pressed Apply
    pub apply: bool,
    /// The user closed the panel
    pub close: bool,
}

/// Draw the settings window
pub fn draw_settings_panel(ctx: &egui::Context, state: &mut SettingsState, error: Option<&str>) -> UiResult {
    let mut result = UiResult::default();

    if !state.is_open {
        return result;
    }

    egui::Window::new("Settings")
        .collapsible(false)
        .resizable(false)
        .default_width(280.0)
        .anchor(egui::Align2::RIGHT_TOP, [-10.0, 50.0])
        .show(ctx, |ui| {
            ui.add(egui::Slider::new(&mut state.thickness, PITCH_RANGE).text("Spiral pitch"));
            ui.add(egui::Slider::new(&mut state.days, DAYS_RANGE).text("Visible days"));

            if let Some(error) = error {
                ui.colored_label(egui::Color32::from_rgb(255, 120, 120), error);
            }

            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("Apply").clicked() {
                    result.apply = true;
                }
                if ui.button("Close (Esc)").clicked() {
                    result.close = true;
                }
            });
        });

    result
}

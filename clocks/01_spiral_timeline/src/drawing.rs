//! Drawing module - heading bar and the error banner

use nannou::prelude::*;

use crate::config::HeadingConfig;
use crate::surface::{show_text_centered, trace_polygon, Scoped, Surface};
use shared::ClockTime;

/// Filled bar with the local date centered in it
pub fn draw_heading<S: Surface + ?Sized>(surface: &mut S, config: &HeadingConfig, time: &ClockTime) {
    let bounds = config.bounding_box;
    if let Some(fill) = &config.fill {
        trace_polygon(surface, &bounds.corners());
        surface.fill(fill);
    }

    let center = bounds.center();
    let mut scoped = Scoped::new(surface);
    scoped.translate(center.x, center.y);
    show_text_centered(&mut *scoped, &time.format_heading(), &config.font);
}

/// Red banner across the top of the window
pub fn draw_error_banner(draw: &Draw, window_rect: Rect, message: &str) {
    let banner_height = 40.0;
    let banner_y = window_rect.top() - banner_height / 2.0;

    draw.rect()
        .x_y(window_rect.x(), banner_y)
        .w_h(window_rect.w(), banner_height)
        .color(srgba(120u8, 40u8, 40u8, 220u8));

    draw.text(&format!("⚠ {}", message))
        .x_y(window_rect.x(), banner_y)
        .color(srgb(240u8, 240u8, 240u8))
        .font_size(14)
        .w(window_rect.w() - 40.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::recording::RecordingSurface;
    use chrono::TimeZone;
    use chrono_tz::Tz;

    #[test]
    fn test_heading_fills_bar_and_shows_date() {
        let tz: Tz = "UTC".parse().unwrap();
        let time = shared::compute_clock_time_at(tz, chrono::Utc.with_ymd_and_hms(2026, 10, 21, 9, 0, 0).unwrap());
        let config = HeadingConfig::default();
        let mut surface = RecordingSurface::new();

        draw_heading(&mut surface, &config, &time);

        let fills = surface.fills();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].0[0].len(), 5);
        assert_eq!(surface.texts(), vec!["Wednesday, 21st of October 2026"]);
        assert_eq!(surface.depth(), 0);
    }

    #[test]
    fn test_heading_without_fill() {
        let tz: Tz = "UTC".parse().unwrap();
        let time = shared::compute_clock_time_at(tz, chrono::Utc.with_ymd_and_hms(2026, 10, 22, 9, 0, 0).unwrap());
        let config = HeadingConfig {
            fill: None,
            ..HeadingConfig::default()
        };
        let mut surface = RecordingSurface::new();

        draw_heading(&mut surface, &config, &time);

        assert!(surface.fills().is_empty());
        assert_eq!(surface.texts(), vec!["Thursday, 22nd of October 2026"]);
    }
}

//! Surface implementation on top of nannou's `Draw`
//!
//! User space is y-down with the origin at the window's top-left. The
//! transform stack is tracked here; only final device points reach nannou.

use nannou::prelude::*;

use crate::geometry::Transform2;
use crate::surface::{drawable_subpaths, FillStyle, FontSpec, LineCap, Rgba, StrokeStyle, Surface};

/// Segments per radian when flattening arcs
const ARC_SEGMENTS_PER_RADIAN: f32 = 12.0;
/// Character advance as a fraction of the font size
const GLYPH_ADVANCE: f32 = 0.6;

#[derive(Debug, Clone, Default)]
struct State {
    transform: Transform2,
    font: Option<FontSpec>,
    current: Option<Point2>,
}

pub struct NannouSurface<'a> {
    draw: &'a Draw,
    rect: Rect,
    state: State,
    stack: Vec<State>,
    /// Device-space sub-paths of the current path
    subpaths: Vec<Vec<Point2>>,
}

impl<'a> NannouSurface<'a> {
    pub fn new(draw: &'a Draw, rect: Rect) -> Self {
        Self {
            draw,
            rect,
            state: State::default(),
            stack: Vec::new(),
            subpaths: Vec::new(),
        }
    }

    /// Device (y-down, top-left origin) to nannou (y-up, centered)
    fn to_window(&self, p: Point2) -> Point2 {
        pt2(self.rect.left() + p.x, self.rect.top() - p.y)
    }

    fn push_point(&mut self, p: Point2) {
        let device = self.state.transform.apply(p);
        match self.subpaths.last_mut() {
            Some(path) => path.push(device),
            None => self.subpaths.push(vec![device]),
        }
        self.state.current = Some(p);
    }

    fn stroke_polyline(&self, points: &[Point2], style: &StrokeStyle) {
        if points.is_empty() {
            return;
        }
        let points: Vec<Point2> = points.iter().map(|p| self.to_window(*p)).collect();

        // A path with no extent only shows up through its caps
        if points.iter().all(|p| *p == points[0]) {
            let size = style.line_width;
            match style.line_cap {
                LineCap::Butt => {}
                LineCap::Round => {
                    self.draw.ellipse().xy(points[0]).w_h(size, size).color(colour(style.colour));
                }
                LineCap::Square => {
                    self.draw.rect().xy(points[0]).w_h(size, size).color(colour(style.colour));
                }
            }
            return;
        }

        let line = self
            .draw
            .polyline()
            .weight(style.line_width)
            .join_round();
        let line = match style.line_cap {
            LineCap::Butt => line.caps_butt(),
            LineCap::Round => line.caps_round(),
            LineCap::Square => line.caps_square(),
        };
        line.points(points).color(colour(style.colour));
    }
}

pub fn colour(c: Rgba) -> Srgba {
    srgba(c[0], c[1], c[2], c[3])
}

/// Split a polyline into the "on" runs of a dash pattern
///
/// Odd-length patterns repeat twice, as in cairo. A pattern with no positive
/// length leaves the polyline solid.
pub fn dash_polyline(points: &[Point2], pattern: &[f32]) -> Vec<Vec<Point2>> {
    if pattern.is_empty() || pattern.iter().all(|d| *d <= 0.0) || pattern.iter().any(|d| *d < 0.0) {
        return vec![points.to_vec()];
    }
    let pattern: Vec<f32> = if pattern.len() % 2 == 1 {
        pattern.iter().chain(pattern.iter()).copied().collect()
    } else {
        pattern.to_vec()
    };

    let mut runs = Vec::new();
    let mut index = 0;
    let mut remaining = pattern[0];
    let mut current: Vec<Point2> = Vec::new();
    if let Some(first) = points.first() {
        current.push(*first);
    }

    for pair in points.windows(2) {
        let (mut from, to) = (pair[0], pair[1]);
        let mut length = from.distance(to);
        while length > 0.0 {
            let on = index % 2 == 0;
            if remaining > length {
                remaining -= length;
                if on {
                    current.push(to);
                }
                break;
            }
            let split = from.lerp(to, remaining / length);
            length -= remaining;
            from = split;
            if on {
                current.push(split);
                runs.push(std::mem::take(&mut current));
            } else {
                current = vec![split];
            }
            index = (index + 1) % pattern.len();
            remaining = pattern[index];
        }
    }

    if index % 2 == 0 && current.len() > 1 {
        runs.push(current);
    }
    runs
}

impl Surface for NannouSurface<'_> {
    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        match self.stack.pop() {
            Some(state) => self.state = state,
            None => log::warn!("restore without matching save"),
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.state.transform.translate(dx, dy);
    }

    fn rotate(&mut self, radians: f32) {
        self.state.transform.rotate(radians);
    }

    fn move_to(&mut self, p: Point2) {
        self.subpaths.push(Vec::new());
        self.push_point(p);
    }

    fn line_to(&mut self, p: Point2) {
        self.push_point(p);
    }

    fn arc(&mut self, center: Point2, radius: f32, a0: f32, a1: f32) {
        let sweep = a1 - a0;
        let steps = ((sweep.abs() * ARC_SEGMENTS_PER_RADIAN).ceil() as usize).max(1);
        for i in 0..=steps {
            let a = a0 + sweep * i as f32 / steps as f32;
            self.push_point(pt2(center.x + radius * a.cos(), center.y + radius * a.sin()));
        }
    }

    fn close_path(&mut self) {
        if let Some(path) = self.subpaths.last_mut() {
            if let Some(first) = path.first().copied() {
                path.push(first);
            }
        }
    }

    fn stroke(&mut self, style: &StrokeStyle) {
        let subpaths = drawable_subpaths(std::mem::take(&mut self.subpaths));
        for path in &subpaths {
            for run in dash_polyline(path, &style.dash) {
                self.stroke_polyline(&run, style);
            }
        }
        self.state.current = None;
    }

    fn fill(&mut self, style: &FillStyle) {
        let subpaths = drawable_subpaths(std::mem::take(&mut self.subpaths));
        for path in subpaths.iter().filter(|p| p.len() >= 3) {
            let points: Vec<Point2> = path.iter().map(|p| self.to_window(*p)).collect();
            self.draw.polygon().points(points).color(colour(style.colour));
        }
        self.state.current = None;
    }

    fn set_font(&mut self, font: &FontSpec) {
        self.state.font = Some(font.clone());
    }

    fn measure_text(&self, text: &str) -> (f32, f32) {
        let size = self.state.font.as_ref().map_or(12.0, |f| f.size);
        (text.chars().count() as f32 * size * GLYPH_ADVANCE, size)
    }

    fn show_text(&mut self, text: &str) {
        let Some(font) = self.state.font.clone() else {
            log::warn!("show_text called before set_font: {:?}", text);
            return;
        };
        let (w, h) = self.measure_text(text);
        let origin = self.state.current.unwrap_or(pt2(0.0, 0.0));
        // nannou lays text out around a center point
        let center = self.state.transform.apply(origin + pt2(w / 2.0, -h / 2.0));

        self.draw
            .text(text)
            .font_size(font.size.round().max(1.0) as u32)
            .color(colour(font.colour))
            .w_h(w + font.size, h * 2.0)
            .xy(self.to_window(center))
            .rotate(-self.state.transform.rotation);
        self.state.current = Some(origin + pt2(w, 0.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point2, b: Point2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_solid_pattern_passes_through() {
        let line = vec![pt2(0.0, 0.0), pt2(10.0, 0.0)];
        assert_eq!(dash_polyline(&line, &[]), vec![line.clone()]);
        assert_eq!(dash_polyline(&line, &[0.0, 0.0]), vec![line]);
    }

    #[test]
    fn test_dash_splits_straight_line() {
        let line = [pt2(0.0, 0.0), pt2(10.0, 0.0)];
        let runs = dash_polyline(&line, &[2.0, 3.0]);
        assert_eq!(runs.len(), 2);
        assert!(close(runs[0][0], pt2(0.0, 0.0)));
        assert!(close(runs[0][1], pt2(2.0, 0.0)));
        assert!(close(runs[1][0], pt2(5.0, 0.0)));
        assert!(close(runs[1][1], pt2(7.0, 0.0)));
    }

    #[test]
    fn test_dash_follows_corners() {
        let line = [pt2(0.0, 0.0), pt2(2.0, 0.0), pt2(2.0, 4.0)];
        let runs = dash_polyline(&line, &[3.0, 1.0]);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].len(), 3);
        assert!(close(runs[0][1], pt2(2.0, 0.0)));
        assert!(close(runs[0][2], pt2(2.0, 1.0)));
        assert!(close(runs[1][0], pt2(2.0, 2.0)));
        assert!(close(*runs[1].last().unwrap(), pt2(2.0, 4.0)));
    }

    #[test]
    fn test_odd_pattern_repeats() {
        let line = [pt2(0.0, 0.0), pt2(8.0, 0.0)];
        let runs = dash_polyline(&line, &[2.0]);
        assert_eq!(runs.len(), 2);
        assert!(close(runs[1][0], pt2(4.0, 0.0)));
        assert!(close(runs[1][1], pt2(6.0, 0.0)));
    }
}

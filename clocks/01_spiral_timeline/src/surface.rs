//! Drawing surface abstraction
//!
//! The geometry engine draws through [`Surface`], a small cairo-like path API
//! in y-down display coordinates. Positive rotation turns user space
//! clockwise on screen. [`Scoped`] pairs every `save` with a `restore`.

use nannou::prelude::Point2;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

/// RGBA colour with components in 0..1
pub type Rgba = [f32; 4];

pub const WHITE: Rgba = [1.0, 1.0, 1.0, 1.0];
pub const BLACK: Rgba = [0.0, 0.0, 0.0, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub colour: Rgba,
    pub line_width: f32,
    /// Alternating on/off lengths; empty for a solid line
    #[serde(default)]
    pub dash: Vec<f32>,
    #[serde(default)]
    pub line_cap: LineCap,
}

impl StrokeStyle {
    pub fn solid(colour: Rgba, line_width: f32) -> Self {
        Self {
            colour,
            line_width,
            dash: Vec::new(),
            line_cap: LineCap::Butt,
        }
    }

    pub fn with_cap(mut self, line_cap: LineCap) -> Self {
        self.line_cap = line_cap;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillStyle {
    pub colour: Rgba,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub face: String,
    pub size: f32,
    pub colour: Rgba,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

impl FontSpec {
    pub fn new(face: &str, size: f32, colour: Rgba) -> Self {
        Self {
            face: face.to_string(),
            size,
            colour,
            bold: false,
            italic: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }
}

/// Path-based drawing backend
///
/// `stroke` and `fill` consume the current path; sub-paths made of a lone
/// `move_to` draw nothing, as in cairo. `save`/`restore` cover the
/// transform, the current font and the current point.
pub trait Surface {
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f32, dy: f32);
    fn rotate(&mut self, radians: f32);

    fn move_to(&mut self, p: Point2);
    fn line_to(&mut self, p: Point2);
    /// Circular arc from `a0` to `a1` (radians, 0 = +x, increasing clockwise).
    /// Joins the current point to the arc start with a line, like cairo.
    fn arc(&mut self, center: Point2, radius: f32, a0: f32, a1: f32);
    fn close_path(&mut self);

    fn stroke(&mut self, style: &StrokeStyle);
    fn fill(&mut self, style: &FillStyle);

    fn set_font(&mut self, font: &FontSpec);
    /// Width and height of `text` in the current font
    fn measure_text(&self, text: &str) -> (f32, f32);
    /// Draw `text` with its baseline starting at the current point
    fn show_text(&mut self, text: &str);
}

/// Saves surface state on creation and restores it when dropped
pub struct Scoped<'a, S: Surface + ?Sized> {
    surface: &'a mut S,
}

impl<'a, S: Surface + ?Sized> Scoped<'a, S> {
    pub fn new(surface: &'a mut S) -> Self {
        surface.save();
        Self { surface }
    }
}

impl<S: Surface + ?Sized> Deref for Scoped<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: Surface + ?Sized> DerefMut for Scoped<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

impl<S: Surface + ?Sized> Drop for Scoped<'_, S> {
    fn drop(&mut self) {
        self.surface.restore();
    }
}

/// Append a polyline to the current path as a new sub-path
pub fn trace_polyline<S, I>(surface: &mut S, points: I)
where
    S: Surface + ?Sized,
    I: IntoIterator<Item = Point2>,
{
    let mut points = points.into_iter();
    if let Some(first) = points.next() {
        surface.move_to(first);
        for p in points {
            surface.line_to(p);
        }
    }
}

/// Append a closed polygon to the current path
pub fn trace_polygon<S: Surface + ?Sized>(surface: &mut S, points: &[Point2]) {
    trace_polyline(surface, points.iter().copied());
    surface.close_path();
}

/// Drop sub-paths that hold only a starting point
pub fn drawable_subpaths(subpaths: Vec<Vec<Point2>>) -> Vec<Vec<Point2>> {
    subpaths.into_iter().filter(|path| path.len() >= 2).collect()
}

/// Draw `text` centered on the user-space origin
pub fn show_text_centered<S: Surface + ?Sized>(surface: &mut S, text: &str, font: &FontSpec) {
    surface.set_font(font);
    let (w, h) = surface.measure_text(text);
    surface.move_to(nannou::prelude::pt2(-w / 2.0, h / 2.0));
    surface.show_text(text);
}


#[cfg(test)]
mod tests {
    use super::recording::*;
    use super::*;
    use nannou::prelude::pt2;

    #[test]
    fn test_scoped_restores_on_drop() {
        let mut surface = RecordingSurface::new();
        {
            let mut scoped = Scoped::new(&mut surface);
            scoped.translate(10.0, 0.0);
            assert_eq!(scoped.depth(), 1);
        }
        assert_eq!(surface.depth(), 0);

        trace_polyline(&mut surface, [pt2(0.0, 0.0), pt2(1.0, 0.0)]);
        surface.stroke(&StrokeStyle::solid(WHITE, 1.0));
        let strokes = surface.strokes();
        assert_eq!(strokes[0].0[0][0], pt2(0.0, 0.0));
    }

    #[test]
    fn test_scoped_restores_on_early_return() {
        fn draw_until_negative(surface: &mut RecordingSurface, values: &[f32]) -> Option<f32> {
            let mut scoped = Scoped::new(surface);
            for v in values {
                scoped.translate(*v, 0.0);
                if *v < 0.0 {
                    return None;
                }
            }
            Some(values.iter().sum())
        }

        let mut surface = RecordingSurface::new();
        assert_eq!(draw_until_negative(&mut surface, &[1.0, -1.0, 2.0]), None);
        assert_eq!(surface.depth(), 0);
        assert_eq!(surface.max_depth, 1);
    }

    #[test]
    fn test_transform_applies_to_path_and_text() {
        let mut surface = RecordingSurface::new();
        {
            let mut scoped = Scoped::new(&mut surface);
            scoped.translate(100.0, 50.0);
            trace_polyline(&mut *scoped, [pt2(0.0, 0.0), pt2(5.0, 0.0)]);
            scoped.stroke(&StrokeStyle::solid(WHITE, 1.0));
            show_text_centered(&mut *scoped, "MON", &FontSpec::new("FreeMono", 10.0, WHITE));
        }

        let strokes = surface.strokes();
        assert_eq!(strokes[0].0[0], vec![pt2(100.0, 50.0), pt2(105.0, 50.0)]);
        match &surface.ops[1] {
            Op::Text { text, at, .. } => {
                assert_eq!(text, "MON");
                assert!((at.x - (100.0 - 9.0)).abs() < 1e-4);
                assert!((at.y - 55.0).abs() < 1e-4);
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_polygon_is_closed() {
        let mut surface = RecordingSurface::new();
        trace_polygon(&mut surface, &[pt2(0.0, 0.0), pt2(1.0, 0.0), pt2(1.0, 1.0)]);
        surface.fill(&FillStyle { colour: BLACK });
        let fills = surface.fills();
        let path = &fills[0].0[0];
        assert_eq!(path.first(), path.last());
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn test_text_cursor_does_not_leak_into_next_stroke() {
        let mut surface = RecordingSurface::new();
        {
            let mut scoped = Scoped::new(&mut surface);
            scoped.translate(40.0, 40.0);
            show_text_centered(&mut *scoped, "+12h", &FontSpec::new("FreeMono", 10.0, WHITE));
        }
        trace_polyline(&mut surface, [pt2(0.0, 0.0), pt2(3.0, 4.0)]);
        surface.stroke(&StrokeStyle::solid(WHITE, 2.0).with_cap(LineCap::Round));

        let strokes = surface.strokes();
        assert_eq!(strokes.len(), 1);
        assert_eq!(strokes[0].0, &vec![vec![pt2(0.0, 0.0), pt2(3.0, 4.0)]]);
    }

    #[test]
    fn test_lone_move_to_is_not_drawn() {
        let subpaths = vec![vec![pt2(1.0, 1.0)], vec![pt2(0.0, 0.0), pt2(0.0, 0.0)]];
        assert_eq!(drawable_subpaths(subpaths), vec![vec![pt2(0.0, 0.0), pt2(0.0, 0.0)]]);
    }
}

use serde::{Deserialize, Serialize};

use crate::Point;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_css(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Brush {
    pub color: Rgb,
    pub width: f32,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: Rgb::BLACK,
            width: 8.0,
        }
    }
}

impl Brush {
    pub fn radius(&self) -> f32 {
        if self.width.is_finite() {
            (self.width / 2.0).max(0.5)
        } else {
            0.5
        }
    }
}

/// A drawing primitive emitted by the stroke smoother.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Segment {
    Dot(Point),
    Quad { from: Point, control: Point, to: Point },
    Line { from: Point, to: Point },
}

/// Quadratic piece that ends at the midpoint of `points[index - 1]` and
/// `points[index]`, with `points[index - 1]` as control point.
pub fn segment_into(points: &[Point], index: usize) -> Option<Segment> {
    if index == 0 || index >= points.len() {
        return None;
    }
    let control = points[index - 1];
    let from = if index == 1 {
        points[0]
    } else {
        points[index - 2].midpoint(control)
    };
    Some(Segment::Quad {
        from,
        control,
        to: control.midpoint(points[index]),
    })
}

/// Straight tail from the last midpoint to the last sample of a finished stroke.
pub fn closing_segment(points: &[Point]) -> Option<Segment> {
    let n = points.len();
    if n < 2 {
        return None;
    }
    Some(Segment::Line {
        from: points[n - 2].midpoint(points[n - 1]),
        to: points[n - 1],
    })
}

pub fn stroke_segments(points: &[Point], finished: bool) -> Vec<Segment> {
    let Some(&first) = points.first() else {
        return Vec::new();
    };
    let mut segments = Vec::with_capacity(points.len() + 1);
    segments.push(Segment::Dot(first));
    segments.extend((1..points.len()).filter_map(|index| segment_into(points, index)));
    if finished {
        segments.extend(closing_segment(points));
    }
    segments
}

pub const QUAD_STEPS: usize = 16;

pub fn flatten_quad(from: Point, control: Point, to: Point) -> Vec<Point> {
    let mut out = Vec::with_capacity(QUAD_STEPS + 1);
    out.push(from);
    for step in 1..=QUAD_STEPS {
        let t = step as f32 / QUAD_STEPS as f32;
        let inv = 1.0 - t;
        out.push(Point {
            x: inv * inv * from.x + 2.0 * inv * t * control.x + t * t * to.x,
            y: inv * inv * from.y + 2.0 * inv * t * control.y + t * t * to.y,
        });
    }
    out
}

pub fn distance_sq_to_segment(px: f32, py: f32, a: Point, b: Point) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((px - a.x) * dx + (py - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let cx = a.x + t * dx;
    let cy = a.y + t * dy;
    (px - cx) * (px - cx) + (py - cy) * (py - cy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn single_point_is_a_dot() {
        assert_eq!(stroke_segments(&[p(3.0, 4.0)], true), vec![Segment::Dot(p(3.0, 4.0))]);
    }

    #[test]
    fn curves_run_between_midpoints() {
        let points = [p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0)];
        let segments = stroke_segments(&points, true);
        assert_eq!(
            segments,
            vec![
                Segment::Dot(p(0.0, 0.0)),
                Segment::Quad { from: p(0.0, 0.0), control: p(0.0, 0.0), to: p(5.0, 0.0) },
                Segment::Quad { from: p(5.0, 0.0), control: p(10.0, 0.0), to: p(10.0, 5.0) },
                Segment::Line { from: p(10.0, 5.0), to: p(10.0, 10.0) },
            ]
        );
    }

    #[test]
    fn unfinished_stroke_has_no_tail() {
        let points = [p(0.0, 0.0), p(4.0, 4.0)];
        let segments = stroke_segments(&points, false);
        assert_eq!(segments.len(), 2);
        assert!(!segments.iter().any(|s| matches!(s, Segment::Line { .. })));
    }

    #[test]
    fn flattened_quad_hits_both_ends() {
        let flat = flatten_quad(p(0.0, 0.0), p(5.0, 10.0), p(10.0, 0.0));
        assert_eq!(flat.len(), QUAD_STEPS + 1);
        assert_eq!(flat[0], p(0.0, 0.0));
        assert_eq!(*flat.last().unwrap(), p(10.0, 0.0));
    }

    #[test]
    fn distance_to_degenerate_segment() {
        let d = distance_sq_to_segment(3.0, 4.0, p(0.0, 0.0), p(0.0, 0.0));
        assert!((d - 25.0).abs() < 1e-4);
    }

    #[test]
    fn css_color() {
        assert_eq!(Rgb::new(255, 0, 16).to_css(), "#ff0010");
    }
}

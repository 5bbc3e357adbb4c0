use image::{Rgb as Pixel, RgbImage};

use crate::geometry::{distance_sq_to_segment, flatten_quad, Brush, Rgb, Segment};
use crate::normalize::area_resize;
use crate::Point;

/// Drawing capabilities the recorder and normalizer rely on.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgb);
    fn draw_segment(&mut self, segment: &Segment, brush: &Brush);
    fn read_pixels(&self) -> RgbImage;

    fn fill(&mut self, color: Rgb) {
        let (width, height) = (self.width(), self.height());
        self.fill_rect(0, 0, width, height, color);
    }

    /// Area-averaged copy of the whole surface at a new size.
    fn downscale(&self, width: u32, height: u32) -> RgbImage {
        area_resize(&self.read_pixels(), width, height)
    }
}

/// Software surface: round-capped strokes, no anti-aliasing, so the same
/// segments always produce the same bitmap.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterSurface {
    image: RgbImage,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32, background: Rgb) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            image: RgbImage::from_pixel(width, height, Pixel(background.to_array())),
        }
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.image.width() || y >= self.image.height() {
            return None;
        }
        let Pixel([r, g, b]) = *self.image.get_pixel(x, y);
        Some(Rgb::new(r, g, b))
    }

    fn stamp_capsule(&mut self, a: Point, b: Point, radius: f32, color: Rgb) {
        let max_x = self.image.width() as i64 - 1;
        let max_y = self.image.height() as i64 - 1;
        let x0 = ((a.x.min(b.x) - radius).floor() as i64).max(0);
        let x1 = ((a.x.max(b.x) + radius).ceil() as i64).min(max_x);
        let y0 = ((a.y.min(b.y) - radius).floor() as i64).max(0);
        let y1 = ((a.y.max(b.y) + radius).ceil() as i64).min(max_y);
        if x0 > x1 || y0 > y1 {
            return;
        }
        let radius_sq = radius * radius;
        let pixel = Pixel(color.to_array());
        for y in y0..=y1 {
            let py = y as f32 + 0.5;
            for x in x0..=x1 {
                let px = x as f32 + 0.5;
                if distance_sq_to_segment(px, py, a, b) <= radius_sq {
                    self.image.put_pixel(x as u32, y as u32, pixel);
                }
            }
        }
    }
}

impl Surface for RasterSurface {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgb) {
        let x_end = x.saturating_add(width).min(self.image.width());
        let y_end = y.saturating_add(height).min(self.image.height());
        let pixel = Pixel(color.to_array());
        for py in y..y_end {
            for px in x..x_end {
                self.image.put_pixel(px, py, pixel);
            }
        }
    }

    fn draw_segment(&mut self, segment: &Segment, brush: &Brush) {
        let radius = brush.radius();
        match *segment {
            Segment::Dot(center) => self.stamp_capsule(center, center, radius, brush.color),
            Segment::Line { from, to } => self.stamp_capsule(from, to, radius, brush.color),
            Segment::Quad { from, control, to } => {
                let flat = flatten_quad(from, control, to);
                for pair in flat.windows(2) {
                    self.stamp_capsule(pair[0], pair[1], radius, brush.color);
                }
            }
        }
    }

    fn read_pixels(&self) -> RgbImage {
        self.image.clone()
    }
}

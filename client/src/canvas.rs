use image::RgbImage;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use doodle_shared::{Brush, Rgb, Segment, Surface};

/// `Surface` backed by the page's 2D canvas. Anti-aliased, so pixel output is
/// only reproducible within one browser.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement, ctx: CanvasRenderingContext2d) -> Self {
        Self { canvas, ctx }
    }

    pub fn resize(&mut self, size: u32) {
        self.canvas.set_width(size);
        self.canvas.set_height(size);
    }

    fn apply_brush(&self, brush: &Brush) {
        let color = brush.color.to_css();
        self.ctx.set_stroke_style_str(&color);
        self.ctx.set_fill_style_str(&color);
        self.ctx.set_line_width(brush.width as f64);
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
    }
}

impl Surface for CanvasSurface {
    fn width(&self) -> u32 {
        self.canvas.width()
    }

    fn height(&self) -> u32 {
        self.canvas.height()
    }

    fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgb) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx
            .fill_rect(x as f64, y as f64, width as f64, height as f64);
    }

    fn draw_segment(&mut self, segment: &Segment, brush: &Brush) {
        self.apply_brush(brush);
        let ctx = &self.ctx;
        ctx.begin_path();
        match *segment {
            Segment::Dot(center) => {
                let _ = ctx.arc(
                    center.x as f64,
                    center.y as f64,
                    brush.radius() as f64,
                    0.0,
                    std::f64::consts::PI * 2.0,
                );
                ctx.fill();
            }
            Segment::Quad { from, control, to } => {
                ctx.move_to(from.x as f64, from.y as f64);
                ctx.quadratic_curve_to(
                    control.x as f64,
                    control.y as f64,
                    to.x as f64,
                    to.y as f64,
                );
                ctx.stroke();
            }
            Segment::Line { from, to } => {
                ctx.move_to(from.x as f64, from.y as f64);
                ctx.line_to(to.x as f64, to.y as f64);
                ctx.stroke();
            }
        }
    }

    fn read_pixels(&self) -> RgbImage {
        let (width, height) = (self.width(), self.height());
        let Ok(data) = self
            .ctx
            .get_image_data(0.0, 0.0, width as f64, height as f64)
        else {
            return RgbImage::new(width, height);
        };
        let rgba = data.data();
        let rgb = rgba
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect::<Vec<_>>();
        RgbImage::from_raw(width, height, rgb).unwrap_or_else(|| RgbImage::new(width, height))
    }
}

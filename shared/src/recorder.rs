use tracing::debug;

use crate::geometry::{closing_segment, segment_into, stroke_segments, Brush, Rgb, Segment};
use crate::surface::Surface;
use crate::{Point, Stroke};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up,
    Cancel,
}

/// Pointer capability a driver feeds; keeps the recorder free of any
/// windowing or DOM types.
pub trait PointerInput {
    fn on_pointer_down(&mut self, point: Point);
    fn on_pointer_move(&mut self, point: Point);
    fn on_pointer_up(&mut self);

    fn handle(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down(point) => self.on_pointer_down(point),
            PointerEvent::Move(point) => self.on_pointer_move(point),
            PointerEvent::Up | PointerEvent::Cancel => self.on_pointer_up(),
        }
    }
}

/// Owns the stroke history and the surface it is rendered on. The surface is
/// always the replay of `strokes` followed by the stroke in progress.
pub struct StrokeRecorder<S: Surface> {
    surface: S,
    brush: Brush,
    background: Rgb,
    strokes: Vec<Stroke>,
    current: Option<Vec<Point>>,
}

impl<S: Surface> StrokeRecorder<S> {
    pub fn new(mut surface: S, brush: Brush, background: Rgb) -> Self {
        surface.fill(background);
        Self {
            surface,
            brush,
            background,
            strokes: Vec::new(),
            current: None,
        }
    }

    pub fn begin_stroke(&mut self, point: Point) {
        if self.current.is_some() {
            self.end_stroke();
        }
        self.current = Some(vec![point]);
        self.surface.draw_segment(&Segment::Dot(point), &self.brush);
    }

    pub fn extend_stroke(&mut self, point: Point) {
        let Some(points) = self.current.as_mut() else {
            return;
        };
        points.push(point);
        if let Some(segment) = segment_into(points, points.len() - 1) {
            self.surface.draw_segment(&segment, &self.brush);
        }
    }

    pub fn end_stroke(&mut self) {
        let Some(points) = self.current.take() else {
            return;
        };
        if points.is_empty() {
            return;
        }
        if let Some(segment) = closing_segment(&points) {
            self.surface.draw_segment(&segment, &self.brush);
        }
        self.strokes.push(Stroke::new(points));
    }

    pub fn undo(&mut self) {
        if self.strokes.pop().is_some() {
            debug!(remaining = self.strokes.len(), "undo stroke");
            self.redraw();
        }
    }

    pub fn clear(&mut self) {
        debug!(strokes = self.strokes.len(), "clear canvas");
        self.strokes.clear();
        self.current = None;
        self.surface.fill(self.background);
    }

    /// Committed strokes only; a stroke in progress does not count.
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn is_drawing(&self) -> bool {
        self.current.is_some()
    }

    pub fn redraw(&mut self) {
        self.surface.fill(self.background);
        for stroke in &self.strokes {
            render_points(&mut self.surface, &self.brush, &stroke.points, true);
        }
        if let Some(points) = &self.current {
            render_points(&mut self.surface, &self.brush, points, false);
        }
    }

    /// Replaces brush and background and repaints the whole history with them.
    pub fn set_style(&mut self, brush: Brush, background: Rgb) {
        self.brush = brush;
        self.background = background;
        self.redraw();
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn current_stroke(&self) -> Option<&[Point]> {
        self.current.as_deref()
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}

impl<S: Surface> PointerInput for StrokeRecorder<S> {
    fn on_pointer_down(&mut self, point: Point) {
        self.begin_stroke(point);
    }

    fn on_pointer_move(&mut self, point: Point) {
        self.extend_stroke(point);
    }

    fn on_pointer_up(&mut self) {
        self.end_stroke();
    }
}

fn render_points<S: Surface>(surface: &mut S, brush: &Brush, points: &[Point], finished: bool) {
    for segment in stroke_segments(points, finished) {
        surface.draw_segment(&segment, brush);
    }
}

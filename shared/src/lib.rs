use serde::{Deserialize, Serialize};

pub mod classifier;
pub mod config;
pub mod error;
pub mod game;
pub mod geometry;
pub mod inference;
pub mod normalize;
pub mod recorder;
pub mod surface;

pub use classifier::{load_classifier, parse_labels, Classifier, DenseClassifier, Prediction, Predictions};
pub use config::{CanvasConfig, GameConfig};
pub use error::{ClassifyError, ConfigError, ModelLoadError};
pub use game::{ClassifierSlot, Game, GameRules, Outcome, Phase};
pub use geometry::{Brush, Rgb, Segment};
pub use inference::{run_inference, InferenceOutcome, SkipReason};
pub use normalize::{normalize, FrameNormalizer, FrameStats, NormalizedFrame, NormalizerConfig};
pub use recorder::{PointerEvent, PointerInput, StrokeRecorder};
pub use surface::{RasterSurface, Surface};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

/// One pointer-down-to-pointer-up gesture, samples in time order.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Stroke {
    pub points: Vec<Point>,
}

impl Stroke {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

use doodle_shared::{
    Classifier, ClassifierSlot, DenseClassifier, FrameNormalizer, Game, GameConfig,
    ModelLoadError, StrokeRecorder,
};

use crate::canvas::CanvasSurface;

pub struct State {
    pub recorder: StrokeRecorder<CanvasSurface>,
    pub normalizer: FrameNormalizer,
    pub classifier: ClassifierSlot<DenseClassifier>,
    pub game: Game,
    pub config: GameConfig,
    pub debug: bool,
    pub drawing_pointer: Option<i32>,
}

impl State {
    pub fn new(mut surface: CanvasSurface, config: GameConfig, debug: bool) -> Self {
        surface.resize(config.canvas.size);
        Self {
            recorder: StrokeRecorder::new(surface, config.canvas.brush, config.canvas.background),
            normalizer: FrameNormalizer::new(config.normalizer),
            classifier: ClassifierSlot::Loading,
            game: Game::new(config.rules, Vec::new()),
            config,
            debug,
            drawing_pointer: None,
        }
    }

    /// Swaps in a fetched config. Resizing the canvas wipes it, so the
    /// history is repainted with the new brush.
    pub fn apply_config(&mut self, config: GameConfig) {
        self.recorder.end_stroke();
        self.recorder.surface_mut().resize(config.canvas.size);
        self.recorder
            .set_style(config.canvas.brush, config.canvas.background);
        self.normalizer = FrameNormalizer::new(config.normalizer);
        self.game.set_rules(config.rules);
        self.config = config;
        self.drawing_pointer = None;
    }

    pub fn set_classifier(&mut self, result: Result<DenseClassifier, ModelLoadError>) {
        self.classifier = ClassifierSlot::from_load(result);
        if let Some(classifier) = self.classifier.classifier() {
            self.game.set_labels(classifier.labels().to_vec());
        }
    }

    pub fn status_text(&self) -> (&'static str, String) {
        match &self.classifier {
            ClassifierSlot::Loading => ("loading", "Loading model…".to_string()),
            ClassifierSlot::Ready(_) => ("ready", "Ready".to_string()),
            ClassifierSlot::Failed(error) => ("error", format!("Model unavailable: {error}")),
        }
    }
}

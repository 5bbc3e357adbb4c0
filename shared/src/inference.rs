use crate::classifier::{Classifier, Predictions};
use crate::error::ClassifyError;
use crate::game::{ClassifierSlot, Game, Phase};
use crate::normalize::{FrameNormalizer, NormalizedFrame};
use crate::recorder::StrokeRecorder;
use crate::surface::Surface;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    NotPlaying,
    ClassifierUnavailable,
    EmptyCanvas,
}

#[derive(Debug)]
pub enum InferenceOutcome {
    Skipped(SkipReason),
    Observed {
        frame: NormalizedFrame,
        predictions: Predictions,
        phase: Phase,
    },
    Failed(ClassifyError),
}

/// One timer tick of the guessing loop: advance the clock, then, if there is
/// something to look at, normalize the surface and hand the best guess to the game.
pub fn run_inference<S: Surface, C: Classifier>(
    recorder: &StrokeRecorder<S>,
    normalizer: &FrameNormalizer,
    slot: &ClassifierSlot<C>,
    game: &mut Game,
    now_ms: f64,
) -> InferenceOutcome {
    if game.tick(now_ms) != Phase::Playing {
        return InferenceOutcome::Skipped(SkipReason::NotPlaying);
    }
    let Some(classifier) = slot.classifier() else {
        return InferenceOutcome::Skipped(SkipReason::ClassifierUnavailable);
    };
    if recorder.is_empty() {
        return InferenceOutcome::Skipped(SkipReason::EmptyCanvas);
    }
    let frame = normalizer.normalize_surface(recorder.surface());
    let predictions = match classifier.classify(&frame) {
        Ok(predictions) => predictions,
        Err(error) => return InferenceOutcome::Failed(error),
    };
    let phase = match predictions.best() {
        Some(best) => game.observe(best.clone(), now_ms),
        None => game.phase(),
    };
    InferenceOutcome::Observed {
        frame,
        predictions,
        phase,
    }
}

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classifier::{Classifier, Prediction};
use crate::error::ModelLoadError;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct GameRules {
    pub time_limit_secs: f64,
    /// A guess wins only when its confidence is strictly above this.
    pub confidence_threshold: f32,
    pub inference_interval_ms: u32,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            time_limit_secs: 20.0,
            confidence_threshold: 0.5,
            inference_interval_ms: 500,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Won,
    TimeUp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Menu,
    Playing,
    GameOver(Outcome),
}

/// Classifier availability. A failed load stays failed.
#[derive(Debug)]
pub enum ClassifierSlot<C> {
    Loading,
    Ready(C),
    Failed(ModelLoadError),
}

impl<C: Classifier> ClassifierSlot<C> {
    pub fn from_load(result: Result<C, ModelLoadError>) -> Self {
        match result {
            Ok(classifier) => {
                info!(labels = classifier.labels().len(), "classifier ready");
                ClassifierSlot::Ready(classifier)
            }
            Err(error) => {
                warn!(%error, "classifier unavailable, inference disabled");
                ClassifierSlot::Failed(error)
            }
        }
    }

    pub fn classifier(&self) -> Option<&C> {
        match self {
            ClassifierSlot::Ready(classifier) => Some(classifier),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ModelLoadError> {
        match self {
            ClassifierSlot::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ClassifierSlot::Ready(_))
    }
}

pub struct Game {
    rules: GameRules,
    labels: Vec<String>,
    phase: Phase,
    target: Option<String>,
    round_started_ms: f64,
    score: u32,
    last_prediction: Option<Prediction>,
}

impl Game {
    pub fn new(rules: GameRules, labels: Vec<String>) -> Self {
        Self {
            rules,
            labels,
            phase: Phase::Menu,
            target: None,
            round_started_ms: 0.0,
            score: 0,
            last_prediction: None,
        }
    }

    pub fn set_labels(&mut self, labels: Vec<String>) {
        self.labels = labels;
    }

    pub fn set_rules(&mut self, rules: GameRules) {
        self.rules = rules;
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn last_prediction(&self) -> Option<&Prediction> {
        self.last_prediction.as_ref()
    }

    /// Starts (or skips to) a round on `labels[word_index % len]`. Returns
    /// false and stays put when there is nothing to draw.
    pub fn start_round(&mut self, word_index: usize, now_ms: f64) -> bool {
        if self.labels.is_empty() {
            return false;
        }
        let word = self.labels[word_index % self.labels.len()].clone();
        info!(word = %word, "new round");
        self.target = Some(word);
        self.round_started_ms = now_ms;
        self.last_prediction = None;
        self.phase = Phase::Playing;
        true
    }

    pub fn remaining_secs(&self, now_ms: f64) -> f64 {
        if !self.is_playing() {
            return 0.0;
        }
        let elapsed = (now_ms - self.round_started_ms) / 1000.0;
        (self.rules.time_limit_secs - elapsed).max(0.0)
    }

    pub fn tick(&mut self, now_ms: f64) -> Phase {
        if self.is_playing() && self.remaining_secs(now_ms) <= 0.0 {
            debug!(target_word = ?self.target, "time is up");
            self.phase = Phase::GameOver(Outcome::TimeUp);
        }
        self.phase
    }

    pub fn is_correct(&self, prediction: &Prediction) -> bool {
        let Some(target) = &self.target else {
            return false;
        };
        prediction.label.to_lowercase() == target.to_lowercase()
            && prediction.confidence > self.rules.confidence_threshold
    }

    pub fn observe(&mut self, prediction: Prediction, now_ms: f64) -> Phase {
        if self.tick(now_ms) != Phase::Playing {
            return self.phase;
        }
        let won = self.is_correct(&prediction);
        self.last_prediction = Some(prediction);
        if won {
            self.score += 1;
            self.phase = Phase::GameOver(Outcome::Won);
            info!(score = self.score, "round won");
        }
        self.phase
    }

    pub fn clear_prediction(&mut self) {
        self.last_prediction = None;
    }

    pub fn to_menu(&mut self) {
        self.phase = Phase::Menu;
        self.last_prediction = None;
    }
}

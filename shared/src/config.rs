use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::game::GameRules;
use crate::geometry::{Brush, Rgb};
use crate::normalize::NormalizerConfig;

pub const MAX_CANVAS_SIZE: u32 = 4096;
pub const MAX_TARGET_SIZE: u32 = 256;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct CanvasConfig {
    pub size: u32,
    pub background: Rgb,
    pub brush: Brush,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            size: 400,
            background: Rgb::WHITE,
            brush: Brush::default(),
        }
    }
}

/// Everything the front end needs to run a game; served as `/config.json`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub canvas: CanvasConfig,
    pub normalizer: NormalizerConfig,
    pub rules: GameRules,
}

impl GameConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_CANVAS_SIZE).contains(&self.canvas.size) {
            return Err(ConfigError::Invalid(format!(
                "canvas size must be within 1..={MAX_CANVAS_SIZE}"
            )));
        }
        if !(self.canvas.brush.width.is_finite() && self.canvas.brush.width > 0.0) {
            return Err(ConfigError::Invalid("brush width must be a positive number".into()));
        }
        if !(1..=MAX_TARGET_SIZE).contains(&self.normalizer.target_size) {
            return Err(ConfigError::Invalid(format!(
                "target size must be within 1..={MAX_TARGET_SIZE}"
            )));
        }
        if !(self.rules.time_limit_secs.is_finite() && self.rules.time_limit_secs > 0.0) {
            return Err(ConfigError::Invalid("time limit must be a positive number of seconds".into()));
        }
        if !(0.0..=1.0).contains(&self.rules.confidence_threshold) {
            return Err(ConfigError::Invalid("confidence threshold must be within [0, 1]".into()));
        }
        if self.rules.inference_interval_ms == 0 {
            return Err(ConfigError::Invalid("inference interval must be positive".into()));
        }
        Ok(())
    }
}

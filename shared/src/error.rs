use thiserror::Error;

/// Why a classifier could not be made ready. Loading is never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelLoadError {
    #[error("failed to fetch {asset}: {reason}")]
    Fetch { asset: String, reason: String },

    #[error("model file is malformed: {0}")]
    Malformed(String),

    #[error("model input size must be positive")]
    ZeroInput,

    #[error("model has no layers")]
    NoLayers,

    #[error("layer {layer} has no output units")]
    EmptyLayer { layer: usize },

    #[error("layer {layer} row {row} has {found} weights, expected {expected}")]
    LayerShape {
        layer: usize,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("layer {layer} has {rows} rows but {bias} bias values")]
    BiasShape {
        layer: usize,
        rows: usize,
        bias: usize,
    },

    #[error("label list is empty")]
    NoLabels,

    #[error("model produces {outputs} outputs but {labels} labels were supplied")]
    LabelCount { outputs: usize, labels: usize },
}

impl From<serde_json::Error> for ModelLoadError {
    fn from(err: serde_json::Error) -> Self {
        ModelLoadError::Malformed(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifyError {
    #[error("frame is {found}x{found}, classifier expects {expected}x{expected}")]
    InputSize { expected: usize, found: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("configuration is not valid JSON: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

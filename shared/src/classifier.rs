use serde::Deserialize;

use crate::error::{ClassifyError, ModelLoadError};
use crate::normalize::NormalizedFrame;

#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

/// One probability per label, in label order.
#[derive(Clone, Debug, PartialEq)]
pub struct Predictions {
    entries: Vec<Prediction>,
}

impl Predictions {
    pub fn new(labels: &[String], probabilities: &[f32]) -> Self {
        let entries = labels
            .iter()
            .zip(probabilities)
            .map(|(label, &confidence)| Prediction {
                label: label.clone(),
                confidence,
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[Prediction] {
        &self.entries
    }

    pub fn best(&self) -> Option<&Prediction> {
        self.entries
            .iter()
            .reduce(|best, entry| if entry.confidence.total_cmp(&best.confidence).is_gt() { entry } else { best })
    }

    /// Highest `k` predictions, most confident first; ties keep label order.
    pub fn top(&self, k: usize) -> Vec<&Prediction> {
        let mut sorted: Vec<&Prediction> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        sorted.truncate(k);
        sorted
    }
}

/// Anything that maps a normalized frame to label probabilities.
pub trait Classifier {
    fn labels(&self) -> &[String];

    /// Side length of the square frame the classifier accepts.
    fn input_size(&self) -> usize;

    fn classify(&self, frame: &NormalizedFrame) -> Result<Predictions, ClassifyError>;
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Softmax,
}

#[derive(Deserialize, Clone, Debug)]
struct LayerFile {
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
    #[serde(default)]
    activation: Activation,
}

#[derive(Deserialize, Clone, Debug)]
struct ModelFile {
    input_size: usize,
    layers: Vec<LayerFile>,
}

#[derive(Clone, Debug)]
struct DenseLayer {
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
    activation: Activation,
}

impl DenseLayer {
    fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut out: Vec<f32> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, bias)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>() + bias)
            .collect();
        match self.activation {
            Activation::Linear => {}
            Activation::Relu => {
                for value in &mut out {
                    *value = value.max(0.0);
                }
            }
            Activation::Softmax => softmax(&mut out),
        }
        out
    }
}

fn softmax(values: &mut [f32]) {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut total = 0.0;
    for value in values.iter_mut() {
        *value = (*value - max).exp();
        total += *value;
    }
    if total > 0.0 {
        for value in values.iter_mut() {
            *value /= total;
        }
    }
}

/// Fully connected network exported as JSON.
#[derive(Clone, Debug)]
pub struct DenseClassifier {
    input_size: usize,
    layers: Vec<DenseLayer>,
    labels: Vec<String>,
}

impl Classifier for DenseClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn classify(&self, frame: &NormalizedFrame) -> Result<Predictions, ClassifyError> {
        let found = frame.size() as usize;
        if found != self.input_size {
            return Err(ClassifyError::InputSize {
                expected: self.input_size,
                found,
            });
        }
        let mut activations = frame.values().to_vec();
        for layer in &self.layers {
            activations = layer.forward(&activations);
        }
        if self.layers.last().map(|layer| layer.activation) != Some(Activation::Softmax) {
            softmax(&mut activations);
        }
        Ok(Predictions::new(&self.labels, &activations))
    }
}

/// One label per line; surrounding whitespace and blank lines are dropped.
pub fn parse_labels(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn load_classifier(model_json: &str, labels_text: &str) -> Result<DenseClassifier, ModelLoadError> {
    let model: ModelFile = serde_json::from_str(model_json)?;
    let labels = parse_labels(labels_text);
    if labels.is_empty() {
        return Err(ModelLoadError::NoLabels);
    }
    if model.input_size == 0 {
        return Err(ModelLoadError::ZeroInput);
    }
    if model.layers.is_empty() {
        return Err(ModelLoadError::NoLayers);
    }
    let mut width = model.input_size * model.input_size;
    let mut layers = Vec::with_capacity(model.layers.len());
    for (index, layer) in model.layers.into_iter().enumerate() {
        if layer.weights.is_empty() {
            return Err(ModelLoadError::EmptyLayer { layer: index });
        }
        if let Some((row, found)) = layer
            .weights
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|&(_, len)| len != width)
        {
            return Err(ModelLoadError::LayerShape {
                layer: index,
                row,
                expected: width,
                found,
            });
        }
        if layer.bias.len() != layer.weights.len() {
            return Err(ModelLoadError::BiasShape {
                layer: index,
                rows: layer.weights.len(),
                bias: layer.bias.len(),
            });
        }
        width = layer.weights.len();
        layers.push(DenseLayer {
            weights: layer.weights,
            bias: layer.bias,
            activation: layer.activation,
        });
    }
    if width != labels.len() {
        return Err(ModelLoadError::LabelCount {
            outputs: width,
            labels: labels.len(),
        });
    }
    Ok(DenseClassifier {
        input_size: model.input_size,
        layers,
        labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2x2 input; output 0 fires on ink in the top row, output 1 on the bottom row.
    const MODEL: &str = r#"{
        "input_size": 2,
        "layers": [
            {"weights": [[-4, -4, 0, 0], [0, 0, -4, -4]], "bias": [4, 4], "activation": "softmax"}
        ]
    }"#;

    fn frame(values: [f32; 4]) -> NormalizedFrame {
        NormalizedFrame::from_values(2, values.to_vec()).unwrap()
    }

    #[test]
    fn labels_are_trimmed() {
        assert_eq!(parse_labels(" cat\n\ndog \r\n  \n"), vec!["cat", "dog"]);
    }

    #[test]
    fn classifies_a_frame() {
        let classifier = load_classifier(MODEL, "top\nbottom\n").unwrap();
        assert_eq!(classifier.input_size(), 2);
        let predictions = classifier.classify(&frame([0.0, 0.0, 1.0, 1.0])).unwrap();
        let best = predictions.best().unwrap();
        assert_eq!(best.label, "top");
        assert!(best.confidence > 0.99);
        let total: f32 = predictions.entries().iter().map(|p| p.confidence).sum();
        assert!((total - 1.0).abs() < 1e-5);
    }

    #[test]
    fn linear_output_is_softmaxed() {
        let model = r#"{"input_size": 1, "layers": [
            {"weights": [[1.0], [1.0]], "bias": [0.0, 0.0], "activation": "relu"},
            {"weights": [[2.0, 0.0], [0.0, 1.0]], "bias": [0.0, 0.0]}
        ]}"#;
        let classifier = load_classifier(model, "a\nb").unwrap();
        let frame = NormalizedFrame::from_values(1, vec![1.0]).unwrap();
        let predictions = classifier.classify(&frame).unwrap();
        let total: f32 = predictions.entries().iter().map(|p| p.confidence).sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert_eq!(predictions.best().unwrap().label, "a");
    }

    #[test]
    fn wrong_frame_size_is_rejected() {
        let classifier = load_classifier(MODEL, "top\nbottom").unwrap();
        let frame = NormalizedFrame::from_values(3, vec![0.0; 9]).unwrap();
        assert_eq!(
            classifier.classify(&frame).unwrap_err(),
            ClassifyError::InputSize { expected: 2, found: 3 }
        );
    }

    #[test]
    fn top_orders_by_confidence() {
        let labels: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let predictions = Predictions::new(&labels, &[0.1, 0.4, 0.4, 0.1]);
        let top: Vec<&str> = predictions.top(3).iter().map(|p| p.label.as_str()).collect();
        assert_eq!(top, vec!["b", "c", "a"]);
        assert_eq!(predictions.best().unwrap().label, "b");
    }

    #[test]
    fn malformed_models_fail_with_distinct_errors() {
        let cases = [
            ("not json", "a", "malformed"),
            (r#"{"input_size": 0, "layers": []}"#, "a", "zero"),
            (r#"{"input_size": 1, "layers": []}"#, "a", "no layers"),
            (r#"{"input_size": 1, "layers": [{"weights": [], "bias": []}]}"#, "a", "empty"),
            (r#"{"input_size": 1, "layers": [{"weights": [[1, 2]], "bias": [0]}]}"#, "a", "shape"),
            (r#"{"input_size": 1, "layers": [{"weights": [[1]], "bias": [0, 1]}]}"#, "a", "bias"),
            (r#"{"input_size": 1, "layers": [{"weights": [[1]], "bias": [0]}]}"#, "a\nb", "labels"),
            (r#"{"input_size": 1, "layers": [{"weights": [[1]], "bias": [0]}]}"#, "\n", "no labels"),
        ];
        for (model, labels, case) in cases {
            let err = load_classifier(model, labels).unwrap_err();
            let matched = match case {
                "malformed" => matches!(err, ModelLoadError::Malformed(_)),
                "zero" => err == ModelLoadError::ZeroInput,
                "no layers" => err == ModelLoadError::NoLayers,
                "empty" => err == ModelLoadError::EmptyLayer { layer: 0 },
                "shape" => matches!(err, ModelLoadError::LayerShape { expected: 1, found: 2, .. }),
                "bias" => matches!(err, ModelLoadError::BiasShape { rows: 1, bias: 2, .. }),
                "labels" => err == ModelLoadError::LabelCount { outputs: 1, labels: 2 },
                "no labels" => err == ModelLoadError::NoLabels,
                _ => false,
            };
            assert!(matched, "{case}: {err:?}");
        }
    }
}

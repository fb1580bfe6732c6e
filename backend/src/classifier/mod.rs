#[cfg(feature = "torch")]
pub mod torch;

use ndarray::ArrayView4;
use serde::{Deserialize, Serialize};

use crate::preprocess::{Preprocessing, ResizeFilter};

#[cfg(feature = "torch")]
pub use torch::TorchClassifier;

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Failed to load model from {path}: {reason}")]
    Load { path: String, reason: String },
    #[error("Model inference error: {0}")]
    Inference(String),
    #[error("Model returned no scores")]
    EmptyOutput,
    #[error("Model returned a non-finite score: {0}")]
    NonFinite(f32),
    #[error("Class index {index} is out of range for {classes} model outputs")]
    ClassIndex { index: usize, classes: usize },
}

/// What the loaded weights expect as input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSpec {
    pub width: u32,
    pub height: u32,
    pub preprocessing: Preprocessing,
    pub filter: ResizeFilter,
}

/// Memory layout the model consumes; batches are built NHWC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorLayout {
    Nhwc,
    Nchw,
}

/// An image classifier loaded once and shared read-only between requests.
pub trait Classifier: Send + Sync {
    fn input_spec(&self) -> &InputSpec;

    /// Runs one batch of shape `(n, height, width, 3)` and returns the raw
    /// output scores, flattened.
    fn predict(&self, batch: ArrayView4<'_, f32>) -> Result<Vec<f32>, ClassifierError>;
}

/// How the raw output of a single-image batch becomes a fake probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreMapping {
    /// The model head already emits a probability (sigmoid output).
    Probability,
    /// One logit.
    Sigmoid,
    /// Class logits, `fake_index` naming the synthetic class.
    Softmax { fake_index: usize },
}

impl ScoreMapping {
    pub fn probability(&self, scores: &[f32]) -> Result<f32, ClassifierError> {
        if scores.is_empty() {
            return Err(ClassifierError::EmptyOutput);
        }
        if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
            return Err(ClassifierError::NonFinite(*bad));
        }

        let probability = match self {
            ScoreMapping::Probability => scores[0],
            ScoreMapping::Sigmoid => 1.0 / (1.0 + (-scores[0]).exp()),
            ScoreMapping::Softmax { fake_index } => {
                if *fake_index >= scores.len() {
                    return Err(ClassifierError::ClassIndex {
                        index: *fake_index,
                        classes: scores.len(),
                    });
                }
                let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
                let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
                exps[*fake_index] / exps.iter().sum::<f32>()
            }
        };

        Ok(probability.clamp(0.0, 1.0))
    }
}

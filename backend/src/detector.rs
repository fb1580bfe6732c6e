use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::classifier::{Classifier, ScoreMapping};
use crate::error::DetectError;
use crate::preprocess::preprocess;
use crate::upload::UploadedMedia;

/// Turns one uploaded image into a fake probability using the shared classifier.
#[derive(Clone)]
pub struct Detector {
    classifier: Arc<dyn Classifier>,
    mapping: ScoreMapping,
}

impl Detector {
    pub fn new(classifier: Arc<dyn Classifier>, mapping: ScoreMapping) -> Self {
        Self {
            classifier,
            mapping,
        }
    }

    pub fn media_digest(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    pub fn detect(&self, media: &UploadedMedia) -> Result<f32, DetectError> {
        let spec = self.classifier.input_spec();
        let batch = preprocess(&media.data, spec)?;
        let scores = self.classifier.predict(batch.view())?;
        let probability = self.mapping.probability(&scores)?;

        log::info!(
            "Scored {} byte upload {} -> {}",
            media.data.len(),
            Self::media_digest(&media.data),
            probability
        );
        Ok(probability)
    }
}

use image::imageops::FilterType;
use image::{ImageReader, RgbImage};
use ndarray::Array4;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::classifier::InputSpec;

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("{0}")]
    Decode(#[from] image::ImageError),
}

/// Numeric transform that makes pixels match what the classifier saw during training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preprocessing {
    /// Raw `[0, 255]` values; EfficientNet rescales inside the network.
    #[serde(rename = "efficientnet")]
    EfficientNet,
    /// `[0, 1]`.
    UnitScale,
    /// `[0, 1]` followed by per-channel ImageNet mean/std normalization.
    Imagenet,
}

impl Preprocessing {
    pub fn apply(&self, channel: usize, value: u8) -> f32 {
        let value = value as f32;
        match self {
            Preprocessing::EfficientNet => value,
            Preprocessing::UnitScale => value / 255.0,
            Preprocessing::Imagenet => (value / 255.0 - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Decodes a single still image, sniffing the format from its bytes.
pub fn decode_rgb(image_bytes: &[u8]) -> Result<RgbImage, PreprocessError> {
    let img = ImageReader::new(Cursor::new(image_bytes))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?
        .decode()?;
    Ok(img.to_rgb8())
}

/// Exact resize to the classifier's spatial size, then preprocessing into a
/// `(1, height, width, 3)` batch.
pub fn to_batch(rgb: &RgbImage, spec: &InputSpec) -> Array4<f32> {
    let resized = image::imageops::resize(rgb, spec.width, spec.height, spec.filter.into());

    let mut batch = Array4::<f32>::zeros((1, spec.height as usize, spec.width as usize, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for channel in 0..3 {
            batch[[0, y as usize, x as usize, channel]] =
                spec.preprocessing.apply(channel, pixel[channel]);
        }
    }
    batch
}

pub fn preprocess(image_bytes: &[u8], spec: &InputSpec) -> Result<Array4<f32>, PreprocessError> {
    let rgb = decode_rgb(image_bytes)?;
    Ok(to_batch(&rgb, spec))
}

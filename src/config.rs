use crate::error::{PipelineError, Result};
use crate::photo::Size;
use image::imageops::FilterType;

/// How RGB bytes are scaled before they reach the model
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PixelNormalization {
    /// `x / 255`
    Unit,
    /// `(x / 255 - mean) / std` with ImageNet statistics
    ImageNet,
}

impl PixelNormalization {
    const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
    const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

    #[inline]
    pub fn apply(&self, channel: usize, value: u8) -> f32 {
        let unit = value as f32 / 255.0;
        match self {
            Self::Unit => unit,
            Self::ImageNet => (unit - Self::IMAGENET_MEAN[channel]) / Self::IMAGENET_STD[channel],
        }
    }
}

/// Which classes of the segmentation are kept in the cutout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForegroundClass {
    /// Every class other than background (label 0). Label maps are passed
    /// through `NormalizationBounds` as raw ids, so any id at or above the
    /// upper bound is keyed.
    AnyNonBackground,
    /// A single class id, e.g. 15 for "person" in VOC-trained models
    Index(usize),
}

/// Range a class layer is mapped from onto `[0, 1]`.
///
/// Values at `max` become the key value (full brightness); anything
/// outside the range is clamped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizationBounds {
    pub min: f32,
    pub max: f32,
}

impl Default for NormalizationBounds {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl NormalizationBounds {
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Tunables for the segmentation-to-composite pipeline
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Fixed resolution the model consumes
    pub model_input: Size,
    pub normalization: PixelNormalization,
    /// Classes keyed out of the mask and therefore kept by the composite
    pub foreground: ForegroundClass,
    pub bounds: NormalizationBounds,
    /// Lattice points per axis of the chroma-key cube
    pub cube_dimension: usize,
    /// Gaussian sigma used to feather the mask, in model pixels
    pub blur_radius: f32,
    pub resize_filter: FilterType,
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_input: Size::square(513),
            normalization: PixelNormalization::ImageNet,
            foreground: ForegroundClass::AnyNonBackground,
            bounds: NormalizationBounds::default(),
            cube_dimension: 64,
            blur_radius: 2.0,
            resize_filter: FilterType::Lanczos3,
            intra_threads: 4,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.model_input.is_empty() {
            return Err(PipelineError::InvalidConfig(format!(
                "model input must be non-empty, got {}",
                self.model_input
            )));
        }
        let NormalizationBounds { min, max } = self.bounds;
        if !(min.is_finite() && max.is_finite() && max > min) {
            return Err(PipelineError::InvalidConfig(format!(
                "normalization bounds must satisfy min < max, got [{min}, {max}]"
            )));
        }
        if self.cube_dimension < 2 {
            return Err(PipelineError::InvalidConfig(format!(
                "cube dimension must be at least 2, got {}",
                self.cube_dimension
            )));
        }
        if !(self.blur_radius.is_finite() && self.blur_radius >= 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "blur radius must be finite and non-negative, got {}",
                self.blur_radius
            )));
        }
        Ok(())
    }
}

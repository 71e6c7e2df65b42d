mod deeplab;
mod preprocess;
pub mod types;

pub use deeplab::DeepLabV3;
pub use preprocess::Preprocessor;
pub use types::{ClassMap, PixelBuffer};

use crate::config::PipelineConfig;
use crate::error::ModelError;
use crate::photo::Size;
use std::path::Path;

/// Trait for dense segmentation models
/// Allows swapping between different backends (ONNX DeepLabV3, test doubles, ...)
///
/// `predict` takes `&self` so a loaded model can serve concurrent callers;
/// implementations that wrap a non-reentrant runtime lock internally.
pub trait SegmentationModel: Send + Sync {
    /// Classify every pixel of `input`
    ///
    /// # Arguments
    /// * `input` - Pixel buffer at exactly `input_size()`
    ///
    /// # Returns
    /// * Class map at the same resolution; deterministic for a given input
    fn predict(&self, input: &PixelBuffer) -> Result<ClassMap, ModelError>;

    /// Get the model's fixed input dimensions
    fn input_size(&self) -> Size;
}

/// Stand-in for a model whose artifact failed to load.
///
/// Every prediction reports the original load failure, so a pipeline built
/// on it yields nothing instead of crashing.
pub struct UnavailableModel {
    reason: String,
    input_size: Size,
}

impl UnavailableModel {
    pub fn new(reason: impl Into<String>, input_size: Size) -> Self {
        Self {
            reason: reason.into(),
            input_size,
        }
    }
}

impl SegmentationModel for UnavailableModel {
    fn predict(&self, _input: &PixelBuffer) -> Result<ClassMap, ModelError> {
        Err(ModelError::Load(self.reason.clone()))
    }

    fn input_size(&self) -> Size {
        self.input_size
    }
}

/// Create the default segmentation model (DeepLabV3)
pub fn create_default_model<P: AsRef<Path>>(
    model_path: P,
    config: &PipelineConfig,
) -> Result<Box<dyn SegmentationModel>, ModelError> {
    let model = DeepLabV3::load(model_path, config)?;
    Ok(Box::new(model))
}

use crate::photo::Size;

/// Failures raised by a segmentation model adapter.
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("Model Load Error: {0}")]
    Load(String),

    #[error("Inference Error: {0}")]
    Inference(String),

    #[error("Input Size Error: model expects {expected}, got {actual}")]
    InputSize { expected: Size, actual: Size },
}

/// Failures raised while turning a photo into a cutout.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("Invalid Dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid Config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Post-process Error: {0}")]
    PostProcess(String),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

//! Foreground cutouts from a semantic-segmentation model.
//!
//! A photo is stretched to the model's input size, classified per pixel,
//! turned into a chroma-keyed transparency mask, feathered with a Gaussian
//! blur and composited back against the photo with source-out blending.
//! The finished image is resized to the photo's own dimensions.
//!
//! ```no_run
//! use cutout::{Photo, Pipeline, PipelineConfig, ResultKind};
//!
//! let pipeline = Pipeline::from_model_file("deeplabv3.onnx", PipelineConfig::default())?;
//! let photo = Photo::open("portrait.jpg")?;
//! if let Some(cutout) = pipeline.process(&photo, ResultKind::FinalImage) {
//!     cutout.to_upright().save("portrait-cutout.png")?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod composite;
pub mod config;
pub mod error;
pub mod mask;
pub mod photo;
pub mod pipeline;
pub mod resize;
pub mod segmentation;

pub use composite::ResultKind;
pub use config::{ForegroundClass, NormalizationBounds, PipelineConfig, PixelNormalization};
pub use error::{ModelError, PipelineError};
pub use photo::{Photo, Size};
pub use pipeline::{Pipeline, Stage};
pub use segmentation::{ClassMap, PixelBuffer, SegmentationModel};

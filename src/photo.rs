use crate::error::{PipelineError, Result};
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader, RgbaImage};
use std::fmt;
use std::path::Path;

/// Width and height in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Reject zero-area sizes
    pub fn ensure_non_empty(self) -> Result<Self> {
        if self.is_empty() {
            return Err(PipelineError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An RGBA photo plus the display metadata that travels with it.
///
/// Pixels are stored as decoded, so `orientation` describes how a viewer
/// should rotate them. The pipeline never rotates pixels itself; it only
/// carries the orientation and scale through to its result.
#[derive(Clone, Debug, PartialEq)]
pub struct Photo {
    pixels: RgbaImage,
    orientation: Orientation,
    scale: f32,
}

impl Photo {
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels,
            orientation: Orientation::NoTransforms,
            scale: 1.0,
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Decode an image file, keeping its EXIF orientation as metadata.
    pub fn open<P: AsRef<Path>>(path: P) -> image::ImageResult<Self> {
        let path = path.as_ref();
        let mut decoder = ImageReader::open(path)?
            .with_guessed_format()?
            .into_decoder()?;
        let orientation = decoder.orientation()?;
        let image = DynamicImage::from_decoder(decoder)?;

        tracing::debug!(
            "Opened {} ({}x{}, {:?})",
            path.display(),
            image.width(),
            image.height(),
            orientation
        );

        Ok(Self::new(image.into_rgba8()).with_orientation(orientation))
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn size(&self) -> Size {
        self.pixels.dimensions().into()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Build a new photo from `pixels` that inherits this photo's metadata.
    pub fn derive(&self, pixels: RgbaImage) -> Self {
        Self {
            pixels,
            orientation: self.orientation,
            scale: self.scale,
        }
    }

    /// Pixels rotated/flipped upright, for writing to formats without EXIF.
    pub fn to_upright(&self) -> DynamicImage {
        let mut image = DynamicImage::ImageRgba8(self.pixels.clone());
        image.apply_orientation(self.orientation);
        image
    }
}

use super::types::PixelBuffer;
use crate::config::PixelNormalization;
use crate::error::Result;
use crate::photo::Size;
use crate::resize::resize;
use image::imageops::FilterType;
use image::RgbaImage;
use ndarray::Array4;

/// Preprocessor for converting RGBA images to model input tensors
pub struct Preprocessor {
    target: Size,
    normalization: PixelNormalization,
    filter: FilterType,
}

impl Preprocessor {
    pub fn new(target: Size, normalization: PixelNormalization, filter: FilterType) -> Self {
        Self {
            target,
            normalization,
            filter,
        }
    }

    pub fn target(&self) -> Size {
        self.target
    }

    /// Preprocess an RGBA image into a normalized NCHW pixel buffer
    ///
    /// Steps:
    /// 1. Resize to target dimensions (no-op when already there)
    /// 2. Normalize each RGB channel, dropping alpha
    /// 3. Transpose from HWC to NCHW format
    ///
    /// Returns: buffer with shape [1, 3, height, width]
    pub fn preprocess(&self, image: &RgbaImage) -> Result<PixelBuffer> {
        let _span = tracing::debug_span!("preprocess").entered();

        let resized = resize(image, self.target, self.filter)?;

        let (width, height) = resized.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                tensor[[0, c, y as usize, x as usize]] = self.normalization.apply(c, pixel[c]);
            }
        }

        Ok(PixelBuffer::new(tensor))
    }
}

use super::Mask;
use crate::error::{PipelineError, Result};
use image::{imageops, Rgba32FImage};

/// Gaussian blur used to feather mask edges.
///
/// The mask is padded by replicating its border pixels before filtering and
/// cropped back afterwards, so edges never pick up transparent fringes and
/// the output keeps the input's extent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaussianBlur {
    radius: f32,
}

impl GaussianBlur {
    pub fn new(radius: f32) -> Result<Self> {
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(PipelineError::PostProcess(format!(
                "blur radius must be finite and non-negative, got {radius}"
            )));
        }
        Ok(Self { radius })
    }

    pub fn apply(&self, mask: &Mask) -> Result<Mask> {
        let _span = tracing::debug_span!("blur", radius = self.radius).entered();

        let (width, height) = mask.pixels().dimensions();
        if width == 0 || height == 0 {
            return Err(PipelineError::PostProcess(
                "cannot blur an empty mask".to_string(),
            ));
        }
        // imageops::blur treats a non-positive sigma as 1.0
        if self.radius == 0.0 {
            return Ok(mask.clone());
        }

        let pad = (3.0 * self.radius).ceil() as u32;
        let padded = clamp_pad(mask.pixels(), pad);
        let blurred = imageops::blur(&padded, self.radius);
        let cropped = imageops::crop_imm(&blurred, pad, pad, width, height).to_image();

        Ok(Mask::from_premultiplied(cropped))
    }
}

/// Grow `image` by `pad` on every side, repeating the nearest edge pixel.
fn clamp_pad(image: &Rgba32FImage, pad: u32) -> Rgba32FImage {
    let (width, height) = image.dimensions();
    Rgba32FImage::from_fn(width + 2 * pad, height + 2 * pad, |x, y| {
        let sx = x.saturating_sub(pad).min(width - 1);
        let sy = y.saturating_sub(pad).min(height - 1);
        *image.get_pixel(sx, sy)
    })
}

use crate::error::Result;
use crate::photo::Size;
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Pixel};

/// Stretch `image` to exactly `target` (no letterboxing).
///
/// Resizing to the current dimensions returns an identical copy.
pub fn resize<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    target: Size,
    filter: FilterType,
) -> Result<ImageBuffer<P, Vec<P::Subpixel>>>
where
    P: Pixel + 'static,
    P::Subpixel: 'static,
{
    let source = Size::from(image.dimensions()).ensure_non_empty()?;
    let target = target.ensure_non_empty()?;

    if source == target {
        return Ok(image.clone());
    }

    let _span = tracing::debug_span!("resize", from = %source, to = %target).entered();
    Ok(imageops::resize(image, target.width, target.height, filter))
}

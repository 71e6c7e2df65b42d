use crate::error::{PipelineError, Result};
use crate::mask::{unpremultiply, Mask};
use crate::photo::Size;
use crate::resize::resize;
use image::imageops::FilterType;
use image::{Rgba, Rgba32FImage, RgbaImage};

/// `imageops::resize` clamps float channels to `[0, 1]`. Scaling by this
/// first lets overshoot through, so colour and alpha stay proportional.
const HEADROOM: f32 = 0.5;

/// Stencil coverage at or above `1 - CLEARED` is treated as fully cleared.
const CLEARED: f32 = 0.5 / 255.0;

/// Which image the pipeline hands back
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResultKind {
    /// The feathered mask rendered as a standalone image
    Background,
    /// The source with the masked-off region cut away
    FinalImage,
}

/// Source-out compositing: the source survives only where the stencil is
/// transparent, `out = source * (1 - stencil.alpha)`.
///
/// With the keyed class transparent in the mask, this keeps that class and
/// clears everything else.
pub struct SourceOutComposite<'a> {
    source: &'a RgbaImage,
    stencil: &'a Mask,
}

impl<'a> SourceOutComposite<'a> {
    pub fn new(source: &'a RgbaImage, stencil: &'a Mask) -> Result<Self> {
        let source_size = Size::from(source.dimensions());
        if source_size != stencil.size() {
            return Err(PipelineError::PostProcess(format!(
                "source {} and mask {} differ in size",
                source_size,
                stencil.size()
            )));
        }
        Ok(Self { source, stencil })
    }

    /// Premultiplied result; fully cleared pixels are all zero.
    pub fn render(&self) -> Rgba32FImage {
        let (width, height) = self.source.dimensions();
        Rgba32FImage::from_fn(width, height, |x, y| {
            let Rgba([r, g, b, a]) = *self.source.get_pixel(x, y);
            let keep = 1.0 - self.stencil.alpha(x, y).clamp(0.0, 1.0);
            let alpha = a as f32 / 255.0 * keep;
            let channel = |v: u8| v as f32 / 255.0 * alpha;
            Rgba([channel(r), channel(g), channel(b), alpha])
        })
    }
}

/// Produce the requested result at `output` size.
///
/// `mask` may be at any resolution; it is resampled onto `foreground`
/// before compositing and onto `output` for the background result. The
/// cutout is resized while premultiplied, and wherever the stencil clears
/// the output completely the pixel is forced to transparent black, so
/// filter ringing cannot leak colour or alpha past the mask.
pub fn composite(
    foreground: &RgbaImage,
    mask: &Mask,
    kind: ResultKind,
    output: Size,
    filter: FilterType,
) -> Result<RgbaImage> {
    let _span = tracing::debug_span!("composite", ?kind, output = %output).entered();

    match kind {
        ResultKind::Background => Ok(mask.resized(output)?.to_rgba8()),
        ResultKind::FinalImage => {
            let stencil = mask.resized(foreground.dimensions().into())?;
            let rendered = SourceOutComposite::new(foreground, &stencil)?.render();
            let resized = resize_premultiplied(&rendered, output, filter)?;
            let coverage = stencil.resized(output)?;

            Ok(RgbaImage::from_fn(output.width, output.height, |x, y| {
                if coverage.alpha(x, y) >= 1.0 - CLEARED {
                    Rgba([0, 0, 0, 0])
                } else {
                    unpremultiply(*resized.get_pixel(x, y))
                }
            }))
        }
    }
}

fn resize_premultiplied(image: &Rgba32FImage, output: Size, filter: FilterType) -> Result<Rgba32FImage> {
    let mut scaled = image.clone();
    for pixel in scaled.pixels_mut() {
        pixel.0.iter_mut().for_each(|c| *c *= HEADROOM);
    }
    let mut resized = resize(&scaled, output, filter)?;
    for pixel in resized.pixels_mut() {
        pixel.0.iter_mut().for_each(|c| *c /= HEADROOM);
    }
    Ok(resized)
}

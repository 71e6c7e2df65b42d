mod blur;
mod color_cube;

pub use blur::GaussianBlur;
pub use color_cube::ColorCube;

use crate::config::{ForegroundClass, NormalizationBounds};
use crate::error::Result;
use crate::photo::Size;
use crate::resize::resize;
use crate::segmentation::ClassMap;
use image::imageops::{self, FilterType};
use image::metadata::Orientation;
use image::{Rgba, Rgba32FImage, RgbaImage};

/// Transparency mask at model resolution.
///
/// Stored as premultiplied RGBA so it can also be shown as an image; the
/// alpha channel is the mask proper. Before feathering alpha is exactly 0
/// over the keyed class and exactly 1 elsewhere.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    pixels: Rgba32FImage,
}

impl Mask {
    pub fn from_premultiplied(pixels: Rgba32FImage) -> Self {
        Self { pixels }
    }

    pub fn pixels(&self) -> &Rgba32FImage {
        &self.pixels
    }

    pub fn size(&self) -> Size {
        self.pixels.dimensions().into()
    }

    #[inline]
    pub fn alpha(&self, x: u32, y: u32) -> f32 {
        self.pixels.get_pixel(x, y)[3]
    }

    /// Resample to `size`. Triangle weights are never negative, so alpha
    /// stays inside `[0, 1]` and a hard edge never rings.
    pub fn resized(&self, size: Size) -> Result<Mask> {
        Ok(Self::from_premultiplied(resize(
            &self.pixels,
            size,
            FilterType::Triangle,
        )?))
    }

    /// Undo `orientation`, taking a mask computed on upright pixels back
    /// onto the stored pixel grid.
    pub fn unoriented(&self, orientation: Orientation) -> Mask {
        let inverse = match orientation {
            Orientation::Rotate90 => Orientation::Rotate270,
            Orientation::Rotate270 => Orientation::Rotate90,
            other => other,
        };
        let p = &self.pixels;
        let pixels = match inverse {
            Orientation::NoTransforms => p.clone(),
            Orientation::Rotate90 => imageops::rotate90(p),
            Orientation::Rotate180 => imageops::rotate180(p),
            Orientation::Rotate270 => imageops::rotate270(p),
            Orientation::FlipHorizontal => imageops::flip_horizontal(p),
            Orientation::FlipVertical => imageops::flip_vertical(p),
            Orientation::Rotate90FlipH => imageops::flip_horizontal(&imageops::rotate90(p)),
            Orientation::Rotate270FlipH => imageops::flip_horizontal(&imageops::rotate270(p)),
        };
        Self::from_premultiplied(pixels)
    }

    /// Un-premultiply into an 8-bit straight-alpha image.
    pub fn to_rgba8(&self) -> RgbaImage {
        let (width, height) = self.pixels.dimensions();
        RgbaImage::from_fn(width, height, |x, y| unpremultiply(*self.pixels.get_pixel(x, y)))
    }
}

/// Premultiplied float pixel to straight 8-bit RGBA. Anything that rounds
/// to zero alpha is transparent black.
///
/// Colour is divided by the unclamped alpha, so a filter overshoot that
/// scaled colour and alpha together does not brighten the colour.
pub(crate) fn unpremultiply(pixel: Rgba<f32>) -> Rgba<u8> {
    let Rgba([r, g, b, a]) = pixel;
    let alpha = (a.clamp(0.0, 1.0) * 255.0).round() as u8;
    if alpha == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let to_u8 = |v: f32| ((v / a).clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([to_u8(r), to_u8(g), to_u8(b), alpha])
}

/// Turn the layer selected by `foreground` into a mask.
///
/// The layer is mapped onto `[0, 1]` through `bounds`, rendered as a
/// grayscale image and keyed through `cube`: pixels at full brightness
/// (the class) become transparent, everything else stays opaque. A uniform
/// layer yields a uniformly transparent or uniformly opaque mask.
pub fn build_mask(
    class_map: &ClassMap,
    foreground: ForegroundClass,
    bounds: NormalizationBounds,
    cube: &ColorCube,
) -> Result<Mask> {
    let _span = tracing::debug_span!("build_mask", ?foreground).entered();

    let layer = class_map.layer(foreground)?;
    let (height, width) = layer.dim();

    let gray = Rgba32FImage::from_fn(width as u32, height as u32, |x, y| {
        let v = bounds.normalize(layer[[y as usize, x as usize]]);
        Rgba([v, v, v, 1.0])
    });

    Ok(Mask::from_premultiplied(cube.apply(&gray)))
}

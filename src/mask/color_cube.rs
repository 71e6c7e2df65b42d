use crate::error::{PipelineError, Result};
use image::{Rgba, Rgba32FImage};

/// 3D colour lookup table over quantised RGB.
///
/// Entries are premultiplied RGBA, laid out with red varying fastest, then
/// green, then blue: `index = (b * dim + g) * dim + r`.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorCube {
    dimension: usize,
    data: Vec<[f32; 4]>,
}

impl ColorCube {
    pub fn new(dimension: usize, data: Vec<[f32; 4]>) -> Result<Self> {
        if dimension < 2 {
            return Err(PipelineError::InvalidConfig(format!(
                "cube dimension must be at least 2, got {dimension}"
            )));
        }
        let expected = dimension * dimension * dimension;
        if data.len() != expected {
            return Err(PipelineError::InvalidConfig(format!(
                "cube of dimension {dimension} needs {expected} entries, got {}",
                data.len()
            )));
        }
        Ok(Self { dimension, data })
    }

    /// Cube that keys out pure white.
    ///
    /// A lattice point whose HSB brightness is exactly 1 becomes fully
    /// transparent; every other point stays opaque with its own colour.
    pub fn chroma_key(dimension: usize) -> Result<Self> {
        let step = (dimension.max(2) - 1) as f32;
        let mut data = Vec::with_capacity(dimension * dimension * dimension);

        for z in 0..dimension {
            let blue = z as f32 / step;
            for y in 0..dimension {
                let green = y as f32 / step;
                for x in 0..dimension {
                    let red = x as f32 / step;
                    let alpha = if brightness(red, green, blue) == 1.0 { 0.0 } else { 1.0 };
                    data.push([red * alpha, green * alpha, blue * alpha, alpha]);
                }
            }
        }

        Self::new(dimension, data)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Lattice cell holding a unit-range channel value.
    ///
    /// Cells are selected by truncation so that only an input of exactly
    /// 1.0 lands on the top lattice point.
    #[inline]
    fn cell(&self, value: f32) -> usize {
        let top = self.dimension - 1;
        ((value.clamp(0.0, 1.0) * top as f32) as usize).min(top)
    }

    #[inline]
    pub fn lookup(&self, red: f32, green: f32, blue: f32) -> [f32; 4] {
        let d = self.dimension;
        let index = (self.cell(blue) * d + self.cell(green)) * d + self.cell(red);
        self.data[index]
    }

    /// Map every straight-alpha pixel through the cube, scaling the result
    /// by the pixel's own alpha.
    pub fn apply(&self, image: &Rgba32FImage) -> Rgba32FImage {
        let _span = tracing::debug_span!("color_cube", dimension = self.dimension).entered();

        let (width, height) = image.dimensions();
        Rgba32FImage::from_fn(width, height, |x, y| {
            let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
            let entry = self.lookup(r, g, b);
            Rgba(entry.map(|channel| channel * a))
        })
    }
}

/// HSB brightness (the "value" of HSV): the largest channel.
#[inline]
fn brightness(red: f32, green: f32, blue: f32) -> f32 {
    red.max(green).max(blue)
}

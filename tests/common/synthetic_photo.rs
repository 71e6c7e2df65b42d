use cutout::segmentation::{ClassMap, PixelBuffer, SegmentationModel};
use cutout::{ModelError, Size};
use image::{Rgba, RgbaImage};
use ndarray::Array2;

pub const PERSON: [u8; 3] = [220, 40, 40];
pub const PERSON_CLASS: u32 = 15;

/// A red disc ("person") on a green/blue checkerboard ("textured background").
pub fn portrait(width: u32, height: u32, radius: f32) -> RgbaImage {
    assert!(width > 0 && height > 0, "image dimensions must be positive");

    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    RgbaImage::from_fn(width, height, |x, y| {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        if dx * dx + dy * dy <= radius * radius {
            Rgba([PERSON[0], PERSON[1], PERSON[2], 255])
        } else if ((x / 16) + (y / 16)) % 2 == 0 {
            Rgba([30, 160, 60, 255])
        } else {
            Rgba([40, 60, 200, 255])
        }
    })
}

/// Reference labels: `true` where the synthetic person is.
pub fn is_person(width: u32, height: u32, radius: f32, x: u32, y: u32) -> bool {
    let dx = x as f32 + 0.5 - width as f32 / 2.0;
    let dy = y as f32 + 0.5 - height as f32 / 2.0;
    dx * dx + dy * dy <= radius * radius
}

/// Deterministic stand-in for a segmentation network: strongly red pixels
/// are labelled as the person class, everything else as background (0).
///
/// Expects unit-normalised input.
pub struct RedIsPerson {
    pub size: Size,
}

impl SegmentationModel for RedIsPerson {
    fn predict(&self, input: &PixelBuffer) -> Result<ClassMap, ModelError> {
        if input.size() != self.size {
            return Err(ModelError::InputSize {
                expected: self.size,
                actual: input.size(),
            });
        }
        let tensor = input.tensor();
        let Size { width, height } = input.size();
        let labels = Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
            let r = tensor[[0, 0, y, x]];
            let g = tensor[[0, 1, y, x]];
            let b = tensor[[0, 2, y, x]];
            if r > 0.5 && g < 0.4 && b < 0.4 {
                PERSON_CLASS
            } else {
                0
            }
        });
        Ok(ClassMap::Labels(labels))
    }

    fn input_size(&self) -> Size {
        self.size
    }
}

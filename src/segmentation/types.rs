use crate::config::ForegroundClass;
use crate::error::{ModelError, PipelineError, Result};
use crate::photo::Size;
use ndarray::{Array2, Array3, Array4, ArrayView3, Axis};

/// Model-ready input: a `[1, 3, H, W]` float tensor in RGB plane order.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    tensor: Array4<f32>,
}

impl PixelBuffer {
    pub fn new(tensor: Array4<f32>) -> Self {
        Self { tensor }
    }

    pub fn size(&self) -> Size {
        let shape = self.tensor.shape();
        Size::new(shape[3] as u32, shape[2] as u32)
    }

    pub fn tensor(&self) -> &Array4<f32> {
        &self.tensor
    }
}

/// Per-pixel classification at model resolution
#[derive(Clone, Debug, PartialEq)]
pub enum ClassMap {
    /// Winning class id per pixel, shape `[H, W]`
    Labels(Array2<u32>),
    /// Confidence per class per pixel, shape `[C, H, W]`
    Scores(Array3<f32>),
}

impl ClassMap {
    pub fn size(&self) -> Size {
        let (height, width) = match self {
            Self::Labels(labels) => labels.dim(),
            Self::Scores(scores) => {
                let (_, h, w) = scores.dim();
                (h, w)
            }
        };
        Size::new(width as u32, height as u32)
    }

    /// Reduce per-class scores to labels by taking the arg-max class.
    pub fn from_scores_argmax(scores: ArrayView3<'_, f32>) -> Result<Self, ModelError> {
        let (classes, height, width) = scores.dim();
        if classes == 0 {
            return Err(ModelError::Inference(
                "model produced zero class channels".to_string(),
            ));
        }

        let labels = Array2::from_shape_fn((height, width), |(y, x)| {
            let mut best = 0usize;
            let mut best_score = f32::NEG_INFINITY;
            for c in 0..classes {
                let score = scores[[c, y, x]];
                if score > best_score {
                    best = c;
                    best_score = score;
                }
            }
            best as u32
        });

        Ok(Self::Labels(labels))
    }

    /// Scalar layer selected by `foreground`, ready for normalisation.
    ///
    /// For label maps, `AnyNonBackground` yields the raw class ids and
    /// `Index` an indicator layer (1.0 on the class, 0.0 elsewhere). For
    /// score maps, `Index` slices that class and `AnyNonBackground` takes
    /// the strongest non-background score per pixel (a single-layer map is
    /// already a foreground layer).
    pub fn layer(&self, foreground: ForegroundClass) -> Result<Array2<f32>> {
        match (self, foreground) {
            (Self::Labels(labels), ForegroundClass::AnyNonBackground) => {
                Ok(labels.mapv(|label| label as f32))
            }
            (Self::Labels(labels), ForegroundClass::Index(class_index)) => {
                Ok(labels.mapv(|label| if label as usize == class_index { 1.0 } else { 0.0 }))
            }
            (Self::Scores(scores), ForegroundClass::Index(class_index)) => {
                let classes = scores.len_of(Axis(0));
                if class_index >= classes {
                    return Err(PipelineError::PostProcess(format!(
                        "class {class_index} out of range for {classes} score layers"
                    )));
                }
                Ok(scores.index_axis(Axis(0), class_index).to_owned())
            }
            (Self::Scores(scores), ForegroundClass::AnyNonBackground) => {
                let (classes, height, width) = scores.dim();
                match classes {
                    0 => Err(PipelineError::PostProcess(
                        "score map has no layers".to_string(),
                    )),
                    1 => Ok(scores.index_axis(Axis(0), 0).to_owned()),
                    _ => Ok(Array2::from_shape_fn((height, width), |(y, x)| {
                        (1..classes)
                            .map(|c| scores[[c, y, x]])
                            .fold(f32::NEG_INFINITY, f32::max)
                    })),
                }
            }
        }
    }
}

use super::types::{ClassMap, PixelBuffer};
use super::SegmentationModel;
use crate::config::PipelineConfig;
use crate::error::ModelError;
use crate::photo::Size;
use ndarray::{Array2, ArrayViewD, Axis, Ix2, Ix3};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

/// DeepLabV3 semantic segmentation exported to ONNX
///
/// Accepts either export flavour: float logits shaped `[1, C, H, W]`, which
/// are reduced to per-pixel arg-max labels, or integer labels shaped
/// `[1, H, W]` / `[1, 1, H, W]`.
pub struct DeepLabV3 {
    // ONNX Runtime needs exclusive access to run a session
    session: Mutex<Session>,
    width: u32,
    height: u32,
}

impl DeepLabV3 {
    /// Load the model once. A missing, empty or unparsable artifact is a
    /// `ModelError::Load`.
    pub fn load<P: AsRef<Path>>(model_path: P, config: &PipelineConfig) -> Result<Self, ModelError> {
        let path = model_path.as_ref();

        tracing::info!("Loading DeepLabV3 model from {}", path.display());

        let metadata = fs::metadata(path)
            .map_err(|e| ModelError::Load(format!("{}: {e}", path.display())))?;
        if metadata.len() == 0 {
            return Err(ModelError::Load(format!(
                "{}: model artifact is empty",
                path.display()
            )));
        }

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(config.intra_threads))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| ModelError::Load(format!("{}: {e}", path.display())))?;

        tracing::info!(
            "DeepLabV3 model loaded successfully, input {}",
            config.model_input
        );

        Ok(Self {
            session: Mutex::new(session),
            width: config.model_input.width,
            height: config.model_input.height,
        })
    }
}

impl SegmentationModel for DeepLabV3 {
    fn predict(&self, input: &PixelBuffer) -> Result<ClassMap, ModelError> {
        let _span = tracing::debug_span!("deeplab_predict").entered();

        let expected = self.input_size();
        if input.size() != expected {
            return Err(ModelError::InputSize {
                expected,
                actual: input.size(),
            });
        }

        let tensor = Tensor::from_array(input.tensor().clone())
            .map_err(|e| ModelError::Inference(format!("input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ModelError::Inference("session lock poisoned".to_string()))?;

        let _infer_span = tracing::debug_span!("inference").entered();
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| ModelError::Inference(format!("run: {e}")))?;
        drop(_infer_span);

        // The segmentation map is the first output ("out" for torchvision exports)
        let output = &outputs[0];
        if let Ok(scores) = output.try_extract_array::<f32>() {
            return scores_to_class_map(scores);
        }
        if let Ok(labels) = output.try_extract_array::<i64>() {
            return labels_to_class_map(labels);
        }

        Err(ModelError::Inference(
            "segmentation output is neither f32 scores nor i64 labels".to_string(),
        ))
    }

    fn input_size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// `[1, C, H, W]` logits to arg-max labels
fn scores_to_class_map(scores: ArrayViewD<'_, f32>) -> Result<ClassMap, ModelError> {
    if scores.ndim() != 4 || scores.shape()[0] != 1 {
        return Err(ModelError::Inference(format!(
            "expected scores shaped [1, C, H, W], got {:?}",
            scores.shape()
        )));
    }

    let per_class = scores
        .index_axis(Axis(0), 0)
        .into_dimensionality::<Ix3>()
        .map_err(|e| ModelError::Inference(format!("scores: {e}")))?;

    ClassMap::from_scores_argmax(per_class)
}

/// `[1, H, W]` or `[1, 1, H, W]` integer labels
fn labels_to_class_map(labels: ArrayViewD<'_, i64>) -> Result<ClassMap, ModelError> {
    let shape = labels.shape().to_vec();
    let plane = match shape.as_slice() {
        [1, _, _] => labels.index_axis(Axis(0), 0),
        [1, 1, _, _] => labels.index_axis(Axis(0), 0).index_axis_move(Axis(0), 0),
        _ => {
            return Err(ModelError::Inference(format!(
                "expected labels shaped [1, H, W] or [1, 1, H, W], got {shape:?}"
            )))
        }
    };

    let plane = plane
        .into_dimensionality::<Ix2>()
        .map_err(|e| ModelError::Inference(format!("labels: {e}")))?;

    let labels: Array2<u32> = plane.mapv(|label| label.max(0) as u32);
    Ok(ClassMap::Labels(labels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array4, IxDyn};
    use std::path::PathBuf;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("cutout-{}-{name}", std::process::id()))
    }

    #[test]
    fn missing_artifact_is_load_error() {
        let path = scratch_path("missing.onnx");
        let err = DeepLabV3::load(&path, &PipelineConfig::default())
            .err()
            .expect("load should fail");
        assert!(matches!(err, ModelError::Load(_)));
    }

    #[test]
    fn zero_byte_artifact_is_load_error() {
        let path = scratch_path("empty.onnx");
        fs::write(&path, b"").unwrap();

        let result = DeepLabV3::load(&path, &PipelineConfig::default());
        fs::remove_file(&path).ok();

        assert!(matches!(result, Err(ModelError::Load(_))));
    }

    #[test]
    fn logits_reduce_to_labels() {
        let mut scores = Array4::<f32>::zeros((1, 21, 2, 2));
        scores[[0, 15, 0, 0]] = 9.0;
        scores[[0, 3, 1, 1]] = 2.0;
        let map = scores_to_class_map(scores.into_dyn().view()).unwrap();
        assert_eq!(map, ClassMap::Labels(array![[15, 0], [0, 3]]));
    }

    #[test]
    fn integer_labels_accept_both_layouts() {
        let flat = ndarray::Array::from_shape_vec(IxDyn(&[1, 2, 2]), vec![0i64, 15, 15, 0]).unwrap();
        let nested =
            ndarray::Array::from_shape_vec(IxDyn(&[1, 1, 2, 2]), vec![0i64, 15, 15, 0]).unwrap();

        let expected = ClassMap::Labels(array![[0, 15], [15, 0]]);
        assert_eq!(labels_to_class_map(flat.view()).unwrap(), expected);
        assert_eq!(labels_to_class_map(nested.view()).unwrap(), expected);
    }

    #[test]
    fn unexpected_score_rank_is_inference_error() {
        let scores = ndarray::Array::<f32, _>::zeros(IxDyn(&[21, 4, 4]));
        assert!(matches!(
            scores_to_class_map(scores.view()),
            Err(ModelError::Inference(_))
        ));
    }
}

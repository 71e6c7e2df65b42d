use crate::composite::{composite, ResultKind};
use crate::config::PipelineConfig;
use crate::error::{ModelError, Result};
use crate::mask::{build_mask, ColorCube, GaussianBlur};
use crate::photo::Photo;
use crate::resize::resize;
use crate::segmentation::{self, Preprocessor, SegmentationModel, UnavailableModel};
use std::fmt;
use std::path::Path;

/// Progress of one invocation. Stages only ever advance; any failure ends
/// the run with no output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Start,
    Resized,
    Inferred,
    MaskBuilt,
    MaskBlurred,
    Composited,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Segmentation-to-composite pipeline over an owned model.
///
/// Holds no per-call state, so one instance may serve concurrent callers.
pub struct Pipeline {
    model: Box<dyn SegmentationModel>,
    config: PipelineConfig,
    preprocessor: Preprocessor,
    cube: ColorCube,
    blur: GaussianBlur,
}

impl Pipeline {
    pub fn new(model: Box<dyn SegmentationModel>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        let preprocessor = Preprocessor::new(
            model.input_size(),
            config.normalization,
            config.resize_filter,
        );
        let cube = ColorCube::chroma_key(config.cube_dimension)?;
        let blur = GaussianBlur::new(config.blur_radius)?;

        Ok(Self {
            model,
            config,
            preprocessor,
            cube,
            blur,
        })
    }

    /// Build a pipeline around the ONNX model at `model_path`.
    ///
    /// A model that fails to load is logged and replaced by an
    /// [`UnavailableModel`], so every later `process` call yields `None`.
    /// Only an invalid `config` is reported as an error.
    pub fn from_model_file<P: AsRef<Path>>(model_path: P, config: PipelineConfig) -> Result<Self> {
        let model = match segmentation::create_default_model(&model_path, &config) {
            Ok(model) => model,
            Err(e) => {
                tracing::error!(
                    "Segmentation model at {} is unusable: {e}",
                    model_path.as_ref().display()
                );
                Box::new(UnavailableModel::new(e.to_string(), config.model_input))
            }
        };
        Self::new(model, config)
    }

    /// Run the pipeline, collapsing every failure into `None`.
    pub fn process(&self, photo: &Photo, kind: ResultKind) -> Option<Photo> {
        let mut stage = Stage::Start;
        match self.run(photo, kind, &mut stage) {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::error!("Background removal failed after stage {stage}: {e}");
                None
            }
        }
    }

    /// Run the pipeline, reporting why it produced nothing.
    pub fn try_process(&self, photo: &Photo, kind: ResultKind) -> Result<Photo> {
        let mut stage = Stage::Start;
        self.run(photo, kind, &mut stage)
    }

    fn run(&self, photo: &Photo, kind: ResultKind, stage: &mut Stage) -> Result<Photo> {
        let _span = tracing::debug_span!("remove_background", ?kind, size = %photo.size()).entered();
        let output_size = photo.size().ensure_non_empty()?;

        // The model sees the photo the way it is displayed
        let upright = photo.to_upright().into_rgba8();
        let resized = resize(&upright, self.preprocessor.target(), self.config.resize_filter)?;
        advance(stage, Stage::Resized);

        let input = self.preprocessor.preprocess(&resized)?;
        let class_map = self.model.predict(&input)?;
        if class_map.size() != input.size() {
            return Err(ModelError::Inference(format!(
                "class map is {}, expected {}",
                class_map.size(),
                input.size()
            ))
            .into());
        }
        advance(stage, Stage::Inferred);

        let mask = build_mask(
            &class_map,
            self.config.foreground,
            self.config.bounds,
            &self.cube,
        )?;
        advance(stage, Stage::MaskBuilt);

        let feathered = self.blur.apply(&mask)?.unoriented(photo.orientation());
        advance(stage, Stage::MaskBlurred);

        let pixels = composite(
            photo.pixels(),
            &feathered,
            kind,
            output_size,
            self.config.resize_filter,
        )?;
        advance(stage, Stage::Composited);

        advance(stage, Stage::Done);
        Ok(photo.derive(pixels))
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    tracing::debug!("{stage} -> {next}");
    *stage = next;
}

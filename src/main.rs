use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use cutout::{ForegroundClass, Photo, Pipeline, PipelineConfig, PixelNormalization, ResultKind};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ResultArg {
    /// Photo with the background cut away
    Final,
    /// Feathered mask only
    Background,
}

impl From<ResultArg> for ResultKind {
    fn from(arg: ResultArg) -> Self {
        match arg {
            ResultArg::Final => ResultKind::FinalImage,
            ResultArg::Background => ResultKind::Background,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum NormalizationArg {
    Unit,
    Imagenet,
}

impl From<NormalizationArg> for PixelNormalization {
    fn from(arg: NormalizationArg) -> Self {
        match arg {
            NormalizationArg::Unit => PixelNormalization::Unit,
            NormalizationArg::Imagenet => PixelNormalization::ImageNet,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Photo to cut out
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the PNG result
    #[arg(short, long)]
    output: PathBuf,

    /// Path to segmentation model (ONNX file)
    #[arg(short, long)]
    model: PathBuf,

    /// Which image to produce
    #[arg(long, value_enum, default_value_t = ResultArg::Final)]
    result: ResultArg,

    /// Mask feathering radius in model pixels
    #[arg(long, default_value_t = 2.0)]
    blur_radius: f32,

    /// Single segmentation class to keep (15 = person for VOC-trained
    /// models); every non-background class is kept when omitted
    #[arg(long)]
    class_index: Option<usize>,

    /// Pixel normalization the model was trained with
    #[arg(long, value_enum, default_value_t = NormalizationArg::Imagenet)]
    normalization: NormalizationArg,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("Cutout starting");

    let config = PipelineConfig {
        blur_radius: args.blur_radius,
        foreground: args
            .class_index
            .map_or(ForegroundClass::AnyNonBackground, ForegroundClass::Index),
        normalization: args.normalization.into(),
        ..Default::default()
    };
    tracing::info!(
        "Model input: {}, blur radius: {}, foreground: {:?}",
        config.model_input,
        config.blur_radius,
        config.foreground
    );

    let pipeline =
        Pipeline::from_model_file(&args.model, config).context("Invalid pipeline configuration")?;

    let photo = Photo::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    tracing::info!("Input: {} ({})", args.input.display(), photo.size());

    let start = Instant::now();
    let result = pipeline
        .process(&photo, args.result.into())
        .context("Background removal produced no image")?;
    tracing::info!(
        "Processed in {:.1}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );

    result
        .to_upright()
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    tracing::info!("Wrote {}", args.output.display());

    Ok(())
}

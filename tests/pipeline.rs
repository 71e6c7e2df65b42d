mod common;

use common::synthetic_photo::{is_person, portrait, RedIsPerson, PERSON};
use cutout::{Photo, Pipeline, PipelineConfig, PixelNormalization, ResultKind, Size};
use image::metadata::Orientation;
use image::{Rgba, RgbaImage};
use std::fs;

const SIDE: u32 = 400;
const RADIUS: f32 = 120.0;
/// Distance from the disc edge beyond which feathering and resampling no
/// longer reach
const MARGIN: f32 = 12.0;

fn test_config() -> PipelineConfig {
    PipelineConfig {
        normalization: PixelNormalization::Unit,
        ..Default::default()
    }
}

fn pipeline() -> Pipeline {
    let model = RedIsPerson {
        size: Size::square(513),
    };
    Pipeline::new(Box::new(model), test_config()).unwrap()
}

fn distance_from_centre(x: u32, y: u32) -> f32 {
    let dx = x as f32 + 0.5 - SIDE as f32 / 2.0;
    let dy = y as f32 + 0.5 - SIDE as f32 / 2.0;
    (dx * dx + dy * dy).sqrt()
}

#[test]
fn final_image_keeps_person_and_clears_background() {
    let photo = Photo::new(portrait(SIDE, SIDE, RADIUS));
    let result = pipeline()
        .process(&photo, ResultKind::FinalImage)
        .expect("pipeline should produce an image");

    assert_eq!(result.size(), Size::square(SIDE));

    let pixels = result.pixels();
    let mut checked_person = 0;
    let mut checked_background = 0;
    for (x, y, pixel) in pixels.enumerate_pixels() {
        let d = distance_from_centre(x, y);
        if d < RADIUS - MARGIN {
            assert!(is_person(SIDE, SIDE, RADIUS, x, y));
            assert!(pixel[3] >= 250, "person pixel ({x},{y}) alpha {}", pixel[3]);
            for c in 0..3 {
                let diff = (pixel[c] as i32 - PERSON[c] as i32).abs();
                assert!(diff <= 3, "person pixel ({x},{y}) channel {c} = {}", pixel[c]);
            }
            checked_person += 1;
        } else if d > RADIUS + MARGIN {
            assert!(!is_person(SIDE, SIDE, RADIUS, x, y));
            assert_eq!(pixel[3], 0, "background pixel ({x},{y}) not transparent");
            checked_background += 1;
        }
    }
    assert!(checked_person > 30_000);
    assert!(checked_background > 100_000);
}

#[test]
fn background_result_is_the_feathered_mask() {
    let photo = Photo::new(portrait(SIDE, SIDE, RADIUS));
    let result = pipeline()
        .process(&photo, ResultKind::Background)
        .expect("pipeline should produce an image");

    assert_eq!(result.size(), Size::square(SIDE));
    let pixels = result.pixels();

    // Black stencil over the background, clear over the person
    for (x, y) in [(5, 5), (394, 5), (5, 394), (394, 394), (200, 30)] {
        assert_eq!(pixels.get_pixel(x, y).0, [0, 0, 0, 255], "at ({x},{y})");
    }
    assert_eq!(pixels.get_pixel(200, 200)[3], 0);

    // None of the photo's colours survive
    assert!(pixels.pixels().all(|p| p[0] == 0 && p[1] == 0 && p[2] == 0));

    // Feathering leaves a soft band along the former edge
    let soft = pixels.pixels().filter(|p| p[3] > 0 && p[3] < 255).count();
    assert!(soft > 0, "expected partially transparent edge pixels");
}

#[test]
fn results_keep_orientation_and_scale() {
    let photo = Photo::new(portrait(120, 80, 30.0))
        .with_orientation(Orientation::Rotate90)
        .with_scale(2.0);
    let p = pipeline();

    for kind in [ResultKind::Background, ResultKind::FinalImage] {
        let result = p.process(&photo, kind).unwrap();
        assert_eq!(result.size(), Size::new(120, 80));
        assert_eq!(result.orientation(), Orientation::Rotate90);
        assert_eq!(result.scale(), 2.0);
    }
}

#[test]
fn output_matches_non_square_inputs() {
    let p = pipeline();
    for (w, h) in [(640, 360), (1, 1), (37, 513)] {
        let photo = Photo::new(portrait(w, h, (w.min(h) / 3) as f32));
        let result = p.process(&photo, ResultKind::FinalImage).unwrap();
        assert_eq!(result.size(), Size::new(w, h));
    }
}

#[test]
fn zero_byte_model_never_produces_output() {
    let path = std::env::temp_dir().join(format!("cutout-it-{}-empty.onnx", std::process::id()));
    fs::write(&path, b"").unwrap();

    let p = Pipeline::from_model_file(&path, test_config()).unwrap();
    fs::remove_file(&path).ok();

    let photo = Photo::new(portrait(64, 64, 20.0));
    for _ in 0..3 {
        assert!(p.process(&photo, ResultKind::FinalImage).is_none());
        assert!(p.process(&photo, ResultKind::Background).is_none());
    }
}

#[test]
fn missing_model_never_produces_output() {
    let path = std::env::temp_dir().join("cutout-it-does-not-exist.onnx");
    let p = Pipeline::from_model_file(&path, test_config()).unwrap();
    let photo = Photo::new(portrait(64, 64, 20.0));
    assert!(p.process(&photo, ResultKind::FinalImage).is_none());
}

#[test]
fn all_black_input_gives_uniform_result() {
    let photo = Photo::new(RgbaImage::from_pixel(SIDE, SIDE, Rgba([0, 0, 0, 255])));
    let p = pipeline();

    let cut = p.process(&photo, ResultKind::FinalImage).unwrap();
    assert!(cut.pixels().pixels().all(|px| px[3] == 0));

    let stencil = p.process(&photo, ResultKind::Background).unwrap();
    assert!(stencil.pixels().pixels().all(|px| px.0 == [0, 0, 0, 255]));
}

#[test]
fn repeated_runs_are_identical() {
    let photo = Photo::new(portrait(200, 150, 50.0));
    let p = pipeline();
    let first = p.process(&photo, ResultKind::FinalImage).unwrap();
    let second = p.process(&photo, ResultKind::FinalImage).unwrap();
    assert_eq!(first, second);
}

#[test]
fn concurrent_callers_share_one_pipeline() {
    let photo = Photo::new(portrait(160, 160, 50.0));
    let p = pipeline();
    let expected = p.process(&photo, ResultKind::FinalImage).unwrap();

    let results: Vec<Photo> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| p.process(&photo, ResultKind::FinalImage)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect()
    });

    assert!(results.iter().all(|r| *r == expected));
}

//! End-to-end checks of the granulometry pipeline.

use approx::assert_abs_diff_eq;
use gran_analysis::progress::StepProgress;
use gran_analysis::{
    aggregate, compute_volume_curve, derivate, measure_volume, summarize_table, BatchOptions,
    CancelToken, Curve, FileSource, GranulometryParams, MemorySource, NoProgress,
};
use gran_core::Image;
use gran_ops::{FlatMorphology, Morphology, OpsResult, Operation, Shape, SizeKind};
use std::io::BufWriter;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Backend that scales intensities by a factor depending on the element
/// size, counting how often it is called.
struct ScalingBackend {
    calls: AtomicUsize,
}

impl ScalingBackend {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl Morphology for ScalingBackend {
    type Element = u32;

    fn structuring_element(&self, _shape: Shape, size: u32, _kind: SizeKind) -> OpsResult<u32> {
        Ok(size)
    }

    fn apply(&self, image: &Image, op: Operation, size: &u32) -> OpsResult<Image> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let factor = if op.is_anti_extensive() {
            1.0 / (1.0 + *size as f32)
        } else {
            1.0 + *size as f32
        };
        Ok(image.map(|v| v * factor))
    }
}

/// Backend scaling the image by a fixed factor per size, so the volume
/// curve can move against the operator's direction.
struct StepBackend {
    factors: Vec<(u32, f32)>,
}

impl Morphology for StepBackend {
    type Element = f32;

    fn structuring_element(&self, _shape: Shape, size: u32, _kind: SizeKind) -> OpsResult<f32> {
        Ok(self
            .factors
            .iter()
            .find(|(s, _)| *s == size)
            .map_or(1.0, |(_, f)| *f))
    }

    fn apply(&self, image: &Image, _op: Operation, factor: &f32) -> OpsResult<Image> {
        Ok(image.map(|v| v * factor))
    }
}

fn write_png(path: &Path, width: u32, height: u32, color: png::ColorType, bytes: &[u8]) {
    let file = std::fs::File::create(path).unwrap();
    let mut enc = png::Encoder::new(BufWriter::new(file), width, height);
    enc.set_color(color);
    enc.set_depth(png::BitDepth::Eight);
    let mut w = enc.write_header().unwrap();
    w.write_image_data(bytes).unwrap();
}

fn params(op: Operation, shape: Shape, max_size: u32, step: u32) -> GranulometryParams {
    GranulometryParams {
        operation: op,
        shape,
        max_size,
        step,
        ..Default::default()
    }
}

fn textured(seed: u32) -> Image {
    let data = (0..32 * 32u32)
        .map(|i: u32| ((i.wrapping_mul(2654435761) ^ seed) >> 24) as f32)
        .collect();
    Image::from_data(32, 32, data).unwrap()
}

#[test]
fn curve_length_matches_series() {
    let img = textured(1);
    for (max, step) in [(9, 3), (10, 4), (7, 1), (12, 5)] {
        let p = params(Operation::Closing, Shape::Disk, max, step);
        let backend = ScalingBackend::new();
        let vc = compute_volume_curve(&img, &backend, &p, "t", &NoProgress).unwrap();
        assert_eq!(vc.len(), (max / step) as usize + 1);
        assert_eq!(backend.calls.load(Ordering::Relaxed), (max / step) as usize);
        let dist = derivate(&vc).unwrap();
        assert_eq!(dist.len(), vc.len() - 2);
    }
}

#[test]
fn every_step_uses_the_original_image() {
    let img = Image::filled(4, 4, 10.0);
    let p = params(Operation::Erosion, Shape::Square, 3, 1);
    let vc = compute_volume_curve(&img, &ScalingBackend::new(), &p, "t", &NoProgress).unwrap();
    // sizes 2, 3, 4 each scale the original 160 once
    let expected = [160.0, 160.0 / 3.0, 160.0 / 4.0, 160.0 / 5.0];
    for (v, e) in vc.volumes().iter().zip(expected) {
        assert_abs_diff_eq!(*v, e, epsilon = 1e-4);
    }
}

#[test]
fn distribution_sum_for_monotonic_curve() {
    let img = textured(7);
    let p = params(Operation::Opening, Shape::Square, 12, 1);
    let vc = compute_volume_curve(&img, &FlatMorphology, &p, "t", &NoProgress).unwrap();
    let v = vc.volumes();
    let dist = derivate(&vc).unwrap();
    let n = v.len();
    let expected = 100.0 * (v[n - 2] - v[0]) / (v[n - 1] - v[0]);
    assert_abs_diff_eq!(dist.total(), expected, epsilon = 1e-6);
    assert!(dist.total() <= 100.0 + 1e-6);
}

#[test]
fn volume_measure_basics() {
    assert_eq!(measure_volume(&Image::new(9, 4)), 0.0);
    assert_eq!(measure_volume(&Image::filled(6, 5, 3.0)), 90.0);
}

#[test]
fn operators_move_volume_in_one_direction() {
    let img = textured(3);
    let v0 = measure_volume(&img);
    for op in Operation::ALL {
        for shape in [Shape::Square, Shape::Disk, Shape::Diamond, Shape::LineVert] {
            let p = params(op, shape, 5, 2);
            let vc = compute_volume_curve(&img, &FlatMorphology, &p, "t", &NoProgress).unwrap();
            for v in vc.volumes() {
                if op.is_anti_extensive() {
                    assert!(v <= v0 + 1e-9, "{op} {shape}");
                } else {
                    assert!(v >= v0 - 1e-9, "{op} {shape}");
                }
            }
        }
    }
}

#[test]
fn flat_dilation_is_degenerate() {
    let img = Image::filled(4, 4, 100.0);
    let p = params(Operation::Dilation, Shape::Square, 3, 1);
    let vc = compute_volume_curve(&img, &FlatMorphology, &p, "flat", &NoProgress).unwrap();
    assert_eq!(vc.values()[0], 1600.0);
    assert_eq!(vc.values()[1], 1600.0);
    let err = derivate(&vc).unwrap_err();
    assert!(err.is_degenerate_curve());
}

#[test]
fn batch_of_three() {
    let source: MemorySource = (0..3)
        .map(|i| (format!("img{}", i), textured(i * 11 + 5)))
        .collect();
    let p = params(Operation::Closing, Shape::Square, 9, 3);
    let res = aggregate(&source, &FlatMorphology, &p, BatchOptions { parallel: true }, &NoProgress)
        .unwrap();

    let vt = res.volume_table().unwrap();
    let dt = res.distribution_table().unwrap();
    let st = res.summary_table().unwrap();
    for t in [&vt, &dt, &st] {
        assert_eq!(t.len(), 3);
        let labels: Vec<_> = t.rows().iter().map(|r| r.label.clone()).collect();
        assert_eq!(labels, vec!["img0", "img1", "img2"]);
    }
    assert_eq!(vt.headers().len(), 4);
    assert_eq!(dt.headers().len(), 2);

    // stats recomputed from the exported table agree
    let reread = gran_io::Table::parse_tsv(&dt.to_tsv()).unwrap();
    let rows = summarize_table(&reread).unwrap();
    for (a, b) in rows.iter().zip(res.rows()) {
        assert_abs_diff_eq!(a.mean, b.summary.mean, epsilon = 1e-3);
    }
}

#[test]
fn diamond_validation() {
    let img = textured(2);
    let run = |max, step| {
        let p = params(Operation::Opening, Shape::Diamond, max, step);
        compute_volume_curve(&img, &FlatMorphology, &p, "d", &NoProgress)
    };
    assert!(run(10, 2).unwrap_err().is_invalid_parameter());
    assert!(run(9, 3).unwrap_err().is_invalid_parameter());
    assert_eq!(run(9, 2).unwrap().len(), 5);
}

#[test]
fn cancel_between_images() {
    let source: MemorySource = (0..4)
        .map(|i| (format!("img{}", i), textured(i)))
        .collect();
    let token = CancelToken::new();
    let trigger = token.clone();
    let sink = token.wrap(move |s: &StepProgress<'_>| {
        if s.label == "img1" {
            trigger.cancel();
        }
    });
    let p = params(Operation::Opening, Shape::Square, 4, 1);
    let err = aggregate(&source, &FlatMorphology, &p, BatchOptions::default(), &sink).unwrap_err();
    assert!(err.is_cancelled());
}

#[test]
fn file_batch_rescales_16_bit() {
    let dir = tempfile::tempdir().unwrap();
    for (name, scale) in [("a.png", 1u16), ("b.png", 2u16)] {
        let file = std::fs::File::create(dir.path().join(name)).unwrap();
        let mut enc = png::Encoder::new(BufWriter::new(file), 16, 16);
        enc.set_color(png::ColorType::Grayscale);
        enc.set_depth(png::BitDepth::Sixteen);
        let mut w = enc.write_header().unwrap();
        let bytes: Vec<u8> = (0..256u16)
            .flat_map(|i| ((i % 7) * 300 * scale).to_be_bytes())
            .collect();
        w.write_image_data(&bytes).unwrap();
    }

    let source = FileSource::from_dir(dir.path()).unwrap();
    let p = params(Operation::Opening, Shape::Square, 3, 1);
    let res = aggregate(&source, &FlatMorphology, &p, BatchOptions::default(), &NoProgress)
        .unwrap();
    assert_eq!(res.labels(), vec!["a.png", "b.png"]);
    // both decode to the same 8-bit image after rescaling
    assert_eq!(res.rows()[0].volume, res.rows()[1].volume);
}

#[test]
fn file_batch_keeps_8_bit_color_levels() {
    let dir = tempfile::tempdir().unwrap();
    let bytes: Vec<u8> = (0..16 * 16)
        .flat_map(|i| if i % 5 == 0 { [111, 110, 110] } else { [101, 100, 100] })
        .collect();
    write_png(&dir.path().join("rgb.png"), 16, 16, png::ColorType::Rgb, &bytes);

    let source = FileSource::from_dir(dir.path()).unwrap();
    let p = params(Operation::Opening, Shape::Square, 3, 1);
    let res = aggregate(&source, &FlatMorphology, &p, BatchOptions::default(), &NoProgress)
        .unwrap();
    // luma rounds to 100 and 110 instead of being stretched to 0-255
    let bright = (0..256).filter(|i| i % 5 == 0).count() as f64;
    let expected = 100.0 * 256.0 + 10.0 * bright;
    assert_abs_diff_eq!(res.rows()[0].volume.values()[0], expected, epsilon = 1e-6);
}

#[test]
fn corrupt_file_stops_batch() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.png"), b"\x89PNG\r\n\x1a\n truncated").unwrap();
    write_png(&dir.path().join("b.png"), 8, 8, png::ColorType::Grayscale, &[40; 64]);

    let source = FileSource::from_dir(dir.path()).unwrap();
    assert_eq!(source.paths().len(), 2);
    let p = params(Operation::Opening, Shape::Square, 3, 1);
    let err = aggregate(&source, &FlatMorphology, &p, BatchOptions::default(), &NoProgress)
        .unwrap_err();
    assert!(err.is_io_error());
    match &err {
        gran_analysis::GranError::InImage { label, .. } => assert_eq!(label, "a.png"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn non_monotonic_curve_keeps_negative_percentages() {
    let img = Image::filled(4, 4, 10.0);
    let backend = StepBackend {
        factors: vec![(3, 0.5), (5, 0.75), (7, 0.25), (9, 0.0)],
    };
    let p = params(Operation::Opening, Shape::Square, 9, 2);
    let vc = compute_volume_curve(&img, &backend, &p, "bumpy", &NoProgress).unwrap();
    assert_eq!(vc.values(), vec![160.0, 80.0, 120.0, 40.0, 0.0]);

    let dist = derivate(&vc).unwrap();
    assert_eq!(dist.len(), vc.len() - 2);
    assert_eq!(dist.sizes(), vec![3.0, 5.0, 7.0]);
    assert_eq!(dist.values(), vec![50.0, -25.0, 50.0]);
    assert_abs_diff_eq!(dist.total(), 75.0);

    // positive variance despite the negative entry
    let source: MemorySource = [("bumpy".to_string(), img.clone())].into_iter().collect();
    let res = aggregate(&source, &backend, &p, BatchOptions::default(), &NoProgress).unwrap();
    assert_abs_diff_eq!(res.rows()[0].summary.mean, 3.75, epsilon = 1e-12);

    // a dominant negative entry leaves the variance undefined
    let backend = StepBackend {
        factors: vec![(3, 0.0), (5, 0.5), (7, 0.5), (9, -1.0)],
    };
    let err = aggregate(&source, &backend, &p, BatchOptions::default(), &NoProgress).unwrap_err();
    assert!(err.is_undefined_statistic());
    assert!(err.to_string().contains("'bumpy'"));
}

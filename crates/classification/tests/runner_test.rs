use classification::{Args, run};
use image::{ImageFormat, Rgb, RgbImage};
use inference::{InferenceBackend, SessionConfig, TensorAttr, TensorType};
use preprocess::RgbFrame;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::{TempDir, tempdir};

/// Emits logits favouring the class encoded in the red channel (`25 * k + 12`).
struct LogitBackend {
    inputs: Vec<TensorAttr>,
    outputs: Vec<TensorAttr>,
    logits: Vec<f32>,
}

impl InferenceBackend for LogitBackend {
    fn load_model(_model: &[u8]) -> anyhow::Result<Self> {
        Ok(Self {
            inputs: vec![TensorAttr::unquantized(
                0,
                "data",
                vec![1, 3, 16, 16],
                TensorType::U8,
            )],
            outputs: vec![TensorAttr::unquantized(0, "fc", vec![1, 10], TensorType::F32)],
            logits: Vec::new(),
        })
    }

    fn input_attrs(&self) -> &[TensorAttr] {
        &self.inputs
    }

    fn output_attrs(&self) -> &[TensorAttr] {
        &self.outputs
    }

    fn set_input(&mut self, frame: &RgbFrame) -> anyhow::Result<()> {
        let class = (frame.pixels[0] as usize / 25).min(9);
        // Negative logits so only softmax makes them rankable
        self.logits = (0..10).map(|i| -10.0 + i as f32 * 0.1).collect();
        self.logits[class] = -1.0;
        Ok(())
    }

    fn run(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn outputs(&mut self) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(vec![self.logits.clone()])
    }
}

/// Raised by [`InterruptingBackend`] during its first run.
static INTERRUPT: AtomicBool = AtomicBool::new(false);

/// `LogitBackend` that requests shutdown while the first image is running.
struct InterruptingBackend(LogitBackend);

impl InferenceBackend for InterruptingBackend {
    fn load_model(model: &[u8]) -> anyhow::Result<Self> {
        LogitBackend::load_model(model).map(Self)
    }

    fn input_attrs(&self) -> &[TensorAttr] {
        self.0.input_attrs()
    }

    fn output_attrs(&self) -> &[TensorAttr] {
        self.0.output_attrs()
    }

    fn set_input(&mut self, frame: &RgbFrame) -> anyhow::Result<()> {
        self.0.set_input(frame)
    }

    fn run(&mut self) -> anyhow::Result<()> {
        INTERRUPT.store(true, Ordering::Relaxed);
        self.0.run()
    }

    fn outputs(&mut self) -> anyhow::Result<Vec<Vec<f32>>> {
        self.0.outputs()
    }
}

/// Two heads: the first ranks the encoded class last, the second ranks it
/// second, so only the second head's top-5 holds the label.
struct TwoHeadBackend {
    inputs: Vec<TensorAttr>,
    outputs: Vec<TensorAttr>,
    heads: Vec<Vec<f32>>,
}

impl InferenceBackend for TwoHeadBackend {
    fn load_model(_model: &[u8]) -> anyhow::Result<Self> {
        Ok(Self {
            inputs: vec![TensorAttr::unquantized(
                0,
                "data",
                vec![1, 3, 16, 16],
                TensorType::U8,
            )],
            outputs: vec![
                TensorAttr::unquantized(0, "head0", vec![1, 10], TensorType::F32),
                TensorAttr::unquantized(1, "head1", vec![1, 10], TensorType::F32),
            ],
            heads: Vec::new(),
        })
    }

    fn input_attrs(&self) -> &[TensorAttr] {
        &self.inputs
    }

    fn output_attrs(&self) -> &[TensorAttr] {
        &self.outputs
    }

    fn set_input(&mut self, frame: &RgbFrame) -> anyhow::Result<()> {
        let class = (frame.pixels[0] as usize / 25).min(9);
        let mut first: Vec<f32> = (0..10).map(|i| i as f32).collect();
        first[class] = -5.0;
        let mut second: Vec<f32> = (0..10).map(|i| i as f32).collect();
        second[class] = 8.5;
        self.heads = vec![first, second];
        Ok(())
    }

    fn run(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn outputs(&mut self) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(self.heads.clone())
    }
}

struct Fixture {
    _dir: TempDir,
    args: Args,
}

fn fixture(classes: &[u8], labels: &str) -> Fixture {
    let dir = tempdir().unwrap();
    let images = dir.path().join("val");
    fs::create_dir(&images).unwrap();
    for (i, &class) in classes.iter().enumerate() {
        let name = format!("ILSVRC2012_val_{:08}.JPEG", i + 1);
        RgbImage::from_pixel(24, 20, Rgb([25 * class + 12, 60, 60]))
            .save_with_format(images.join(name), ImageFormat::Jpeg)
            .unwrap();
    }

    let model = dir.path().join("model.rknn");
    fs::write(&model, b"blob").unwrap();
    let val_file = dir.path().join("val.txt");
    fs::write(&val_file, labels).unwrap();

    Fixture {
        args: Args {
            model,
            image_dir: images,
            val_file,
            repeat_count: 50000,
            softmax: true,
        },
        _dir: dir,
    }
}

fn run_to_string(args: &Args) -> anyhow::Result<(inference::AccuracyTracker, String)> {
    let mut out = Vec::new();
    let config = SessionConfig::with_defaults((224, 224));
    let tracker = run::<LogitBackend>(args, &config, &AtomicBool::new(false), &mut out)?;
    Ok((tracker, String::from_utf8(out).unwrap()))
}

/// Test the report of a small validation run
///
/// Tests:
/// - Tensor description precedes the per-image blocks
/// - Per-image top-5 listing and pass lines
/// - Cumulative accuracy after every image
#[test]
fn test_report() {
    let fixture = fixture(&[3, 6], "a 3\nb 1\n");
    let (tracker, report) = run_to_string(&fixture.args).unwrap();

    assert_eq!(tracker.images, 2);
    assert_eq!(tracker.top1, 1);
    assert_eq!(tracker.top5, 1);

    assert!(report.starts_with("model input num: 1, output num: 1\n"));
    assert!(report.contains("test image count: 1\n"));
    assert!(report.contains("test image count: 2\n"));
    assert!(report.contains("ILSVRC2012_val_00000001.JPEG\n"));
    assert!(report.contains("Repeat 1 times, avg time per run is"));
    assert!(report.contains(" --- Top5 ---\n  3: "));
    assert!(report.contains("file_id:1 Top1 is pass 3\n"));
    assert!(report.contains("file_id:1 Top5 is pass 3\n"));
    assert!(!report.contains("file_id:2"), "Second image misses");
    assert_eq!(report.matches("===========acc test result==============").count(), 2);
    assert!(report.trim_end().ends_with(
        "Test Image count: 2\nTop1 count: 1\nTop5 count: 1\nTop1 acc: 50.000000%\nTop5 acc: 50.000000%\n========================================="
    ));
}

/// Test `-r` caps the number of images
#[test]
fn test_repeat_count_limits_images() {
    let mut fixture = fixture(&[1, 2, 3], "a 1\nb 2\nc 3\n");
    fixture.args.repeat_count = 2;
    let (tracker, _) = run_to_string(&fixture.args).unwrap();
    assert_eq!(tracker.images, 2);
    assert_eq!(tracker.top1, 2);
}

/// Test images without a label line count as misses
#[test]
fn test_missing_label_is_a_miss() {
    let fixture = fixture(&[4, 4], "a 4\n");
    let (tracker, _) = run_to_string(&fixture.args).unwrap();
    assert_eq!(tracker.images, 2);
    assert_eq!(tracker.top1, 1);
}

/// Test a raised shutdown flag stops before the first image
#[test]
fn test_shutdown_stops_loop() {
    let fixture = fixture(&[1, 2], "a 1\nb 2\n");
    let mut out = Vec::new();
    let config = SessionConfig::with_defaults((224, 224));
    let tracker =
        run::<LogitBackend>(&fixture.args, &config, &AtomicBool::new(true), &mut out).unwrap();
    assert_eq!(tracker.images, 0);
}

/// Test missing inputs abort the run
#[test]
fn test_missing_inputs_fail() {
    let fixture = fixture(&[1], "a 1\n");

    let mut args = fixture.args.clone();
    args.val_file = PathBuf::from("/nonexistent/val.txt");
    assert!(run_to_string(&args).is_err());

    let mut args = fixture.args.clone();
    args.image_dir = fixture.args.image_dir.join("missing");
    assert!(run_to_string(&args).is_err());

    let mut args = fixture.args.clone();
    args.model = Path::new("/nonexistent/model.rknn").to_path_buf();
    assert!(run_to_string(&args).is_err());
}

/// Test a shutdown raised while an image runs finishes that image only
///
/// Tests:
/// - The running image gets its full report and accuracy block
/// - No further image is started
#[test]
fn test_shutdown_after_current_image() {
    let fixture = fixture(&[1, 2, 3], "a 1\nb 2\nc 3\n");
    let mut out = Vec::new();
    let config = SessionConfig::with_defaults((224, 224));
    let tracker = run::<InterruptingBackend>(&fixture.args, &config, &INTERRUPT, &mut out).unwrap();
    let report = String::from_utf8(out).unwrap();

    assert_eq!(tracker.images, 1);
    assert_eq!(tracker.top1, 1);
    assert!(report.contains("file_id:1 Top1 is pass 1\n"));
    assert!(!report.contains("test image count: 2"));
    assert_eq!(report.matches("===========acc test result==============").count(), 1);
    assert!(report.trim_end().ends_with("Top5 acc: 100.000000%\n========================================="));
}

/// Test every output of a multi-output model is ranked and the verdicts combined
///
/// Tests:
/// - One listing per output
/// - A label only in the second output's top-5 counts as a top-5 hit
/// - Neither output's top-1 matches, so no top-1 pass
#[test]
fn test_verdicts_across_outputs() {
    let fixture = fixture(&[3], "a 3\n");
    let mut out = Vec::new();
    let config = SessionConfig::with_defaults((224, 224));
    let tracker =
        run::<TwoHeadBackend>(&fixture.args, &config, &AtomicBool::new(false), &mut out).unwrap();
    let report = String::from_utf8(out).unwrap();

    assert_eq!(tracker.images, 1);
    assert_eq!(tracker.top1, 0);
    assert_eq!(tracker.top5, 1);
    assert!(report.starts_with("model input num: 1, output num: 2\n"));
    assert_eq!(report.matches(" --- Top5 ---").count(), 2);
    assert!(report.contains("file_id:1 Top5 is pass 3\n"));
    assert!(!report.contains("Top1 is pass"));
}

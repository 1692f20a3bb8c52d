use crate::{
    backend::InferenceBackend,
    config::SessionConfig,
    timing::RunStats,
};
use anyhow::Context;
use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
};
use preprocess::{CpuPreProcessor, load_input};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Result of pushing one image through the model.
#[derive(Debug, Clone)]
pub struct ImageOutcome {
    /// Every model output of the last run, dequantized
    pub outputs: Vec<Vec<f32>>,
    pub stats: RunStats,
    /// Dimensions of the decoded image before resizing
    pub source_size: (u32, u32),
}

fn init_metrics(meter_name: &'static str) -> (Histogram<f64>, Counter<u64>) {
    let meter = global::meter(meter_name);
    let latency_buckets = [
        0.001, 0.002, 0.005, 0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0,
    ];
    let run_histogram: Histogram<f64> = meter
        .f64_histogram("npu_run_duration_seconds")
        .with_description("Time for a single model run")
        .with_unit("s")
        .with_boundaries(latency_buckets.to_vec())
        .build();
    let images_counter: Counter<u64> = meter
        .u64_counter("images_processed_total")
        .with_description("Total images pushed through the model")
        .build();
    (run_histogram, images_counter)
}

/// A loaded model plus the preprocessing sized for it.
pub struct InferenceSession<B: InferenceBackend> {
    backend: B,
    preprocessor: CpuPreProcessor,
    repeat_count: u32,
    run_histogram: Histogram<f64>,
    images_counter: Counter<u64>,
}

impl<B: InferenceBackend> InferenceSession<B> {
    /// Read the model blob at `model_path` and initialise the backend from it.
    pub fn load(model_path: &Path, config: &SessionConfig) -> anyhow::Result<Self> {
        tracing::info!(model = %model_path.display(), "Loading model");
        let model = fs::read(model_path)
            .with_context(|| format!("Failed to read model file {}", model_path.display()))?;
        let backend = B::load_model(&model)
            .with_context(|| format!("Failed to initialise model {}", model_path.display()))?;
        Ok(Self::new(backend, config))
    }

    pub fn new(backend: B, config: &SessionConfig) -> Self {
        let input_size = resolve_input_size(&backend, config);
        tracing::info!(
            width = input_size.0,
            height = input_size.1,
            repeat = config.one_pic_repeat_count,
            "Session ready"
        );
        if let Some(version) = backend.sdk_version() {
            tracing::info!(%version, "Runtime version");
        }

        let (run_histogram, images_counter) = init_metrics("inference");
        Self {
            backend,
            preprocessor: CpuPreProcessor::new(input_size),
            repeat_count: config.one_pic_repeat_count.max(1),
            run_histogram,
            images_counter,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn input_size(&self) -> (u32, u32) {
        self.preprocessor.input_size
    }

    /// Tensor counts and attributes, one line per tensor.
    pub fn describe(&self) -> String {
        let io = self.backend.io_num();
        let mut text = format!(
            "model input num: {}, output num: {}\n",
            io.n_input, io.n_output
        );

        text.push_str("input tensors:\n");
        for attr in self.backend.input_attrs() {
            let _ = writeln!(text, "{attr}");
        }
        text.push_str("output tensors:\n");
        for attr in self.backend.output_attrs() {
            let _ = writeln!(text, "{attr}");
        }
        text
    }

    /// Decode, resize and run one image, returning every output.
    pub fn process(&mut self, path: &Path) -> anyhow::Result<ImageOutcome> {
        let span = tracing::info_span!("process_image", path = %path.display());
        let _enter = span.enter();

        let frame = load_input(path, self.preprocessor.input_size)?;
        let prepared = self
            .preprocessor
            .fit(frame)
            .with_context(|| format!("Failed to resize {}", path.display()))?;

        self.backend
            .set_input(&prepared.frame)
            .context("Failed to set model input")?;

        let mut stats = RunStats::default();
        for _ in 0..self.repeat_count {
            let _run_span = tracing::trace_span!("rknn_run").entered();
            let (result, elapsed) = stats.time(|| self.backend.run());
            result.context("Model run failed")?;
            self.run_histogram.record(elapsed.as_secs_f64(), &[]);
        }

        let outputs = self.backend.outputs().context("Failed to get model outputs")?;
        self.images_counter.add(1, &[]);

        tracing::debug!(
            outputs = outputs.len(),
            avg_ms = stats.avg_ms(),
            resized = prepared.resized,
            "Processed image"
        );

        Ok(ImageOutcome {
            outputs,
            stats,
            source_size: prepared.source_size,
        })
    }
}

/// Environment override, then the model's input shape, then the default.
fn resolve_input_size<B: InferenceBackend>(backend: &B, config: &SessionConfig) -> (u32, u32) {
    if let Some(size) = config.input_size_override {
        return size;
    }
    backend
        .input_attrs()
        .first()
        .and_then(|attr| attr.spatial_size())
        .unwrap_or(config.default_input_size)
}

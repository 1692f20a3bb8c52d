use super::InferenceBackend;
use crate::tensor::{TensorAttr, TensorFormat, TensorType};
use anyhow::Context;
use ndarray::{Array, IxDyn};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    tensor::TensorElementType,
    value::{TensorRef, ValueType},
};
use preprocess::{Layout, RgbFrame, to_f32_tensor, to_u8_tensor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionProvider {
    Cpu,
    Cuda,
}

impl ExecutionProvider {
    /// `EXECUTION_PROVIDER=cuda` selects CUDA; anything else is CPU
    pub fn from_env() -> Self {
        match std::env::var("EXECUTION_PROVIDER")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "cuda" => ExecutionProvider::Cuda,
            _ => ExecutionProvider::Cpu,
        }
    }
}

enum PendingInput {
    F32(Array<f32, IxDyn>),
    U8(Array<u8, IxDyn>),
}

/// ONNX Runtime session standing in for the NPU runtime.
pub struct OrtBackend {
    session: Session,
    input_attrs: Vec<TensorAttr>,
    output_attrs: Vec<TensorAttr>,
    pending: Option<PendingInput>,
    last_outputs: Vec<Vec<f32>>,
}

impl OrtBackend {
    /// Load model with specified execution provider
    pub fn load_model_with_provider(
        model: &[u8],
        provider: ExecutionProvider,
    ) -> anyhow::Result<Self> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        #[allow(unused_mut)]
        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?;

        match provider {
            #[cfg(feature = "cuda")]
            ExecutionProvider::Cuda => {
                tracing::info!("Initializing ONNX Runtime with CUDA execution provider");
                builder = builder.with_execution_providers([
                    ort::execution_providers::CUDAExecutionProvider::default()
                        .with_device_id(0)
                        .build()
                        .error_on_failure(),
                ])?;
            }
            #[cfg(not(feature = "cuda"))]
            ExecutionProvider::Cuda => {
                tracing::warn!("Built without the `cuda` feature, falling back to CPU");
            }
            ExecutionProvider::Cpu => {
                tracing::info!("Initializing ONNX Runtime with CPU execution provider");
            }
        }

        let session = builder
            .commit_from_memory(model)
            .context("Failed to build ONNX Runtime session from model bytes")?;

        let input_attrs = session
            .inputs()
            .iter()
            .enumerate()
            .map(|(i, outlet)| attr_from_value_type(i as u32, outlet.name(), outlet.dtype()))
            .collect();
        let output_attrs = session
            .outputs()
            .iter()
            .enumerate()
            .map(|(i, outlet)| attr_from_value_type(i as u32, outlet.name(), outlet.dtype()))
            .collect();

        Ok(Self {
            session,
            input_attrs,
            output_attrs,
            pending: None,
            last_outputs: Vec::new(),
        })
    }
}

fn attr_from_value_type(index: u32, name: &str, value_type: &ValueType) -> TensorAttr {
    match value_type {
        ValueType::Tensor { ty, shape, .. } => {
            let dtype = match ty {
                TensorElementType::Float32 => TensorType::F32,
                TensorElementType::Float16 => TensorType::F16,
                TensorElementType::Int8 => TensorType::I8,
                TensorElementType::Uint8 => TensorType::U8,
                TensorElementType::Int16 => TensorType::I16,
                _ => TensorType::Other,
            };
            TensorAttr::unquantized(index, name, shape.iter().copied().collect(), dtype)
        }
        _ => TensorAttr::unquantized(index, name, Vec::new(), TensorType::Other),
    }
}

impl InferenceBackend for OrtBackend {
    fn load_model(model: &[u8]) -> anyhow::Result<Self> {
        Self::load_model_with_provider(model, ExecutionProvider::from_env())
    }

    fn input_attrs(&self) -> &[TensorAttr] {
        &self.input_attrs
    }

    fn output_attrs(&self) -> &[TensorAttr] {
        &self.output_attrs
    }

    fn set_input(&mut self, frame: &RgbFrame) -> anyhow::Result<()> {
        let attr = self
            .input_attrs
            .first()
            .ok_or_else(|| anyhow::anyhow!("Model has no inputs"))?;

        let layout = match attr.fmt {
            TensorFormat::Nhwc => Layout::Nhwc,
            _ => Layout::Nchw,
        };

        let pending = match attr.dtype {
            TensorType::U8 => PendingInput::U8(to_u8_tensor(frame, layout)?),
            TensorType::F32 => PendingInput::F32(to_f32_tensor(frame, layout)?),
            other => anyhow::bail!("Unsupported input element type {}", other),
        };

        self.pending = Some(pending);
        Ok(())
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let pending = self
            .pending
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("run() called before set_input()"))?;

        let outputs = match pending {
            PendingInput::F32(images) => self
                .session
                .run(ort::inputs![TensorRef::from_array_view(images.view())?])?,
            PendingInput::U8(images) => self
                .session
                .run(ort::inputs![TensorRef::from_array_view(images.view())?])?,
        };

        let mut values = Vec::new();
        for (name, value) in outputs.iter() {
            let array = value
                .try_extract_array::<f32>()
                .with_context(|| format!("Output {name} is not an f32 tensor"))?;
            values.push(array.iter().copied().collect());
        }
        drop(outputs);

        self.last_outputs = values;
        Ok(())
    }

    fn outputs(&mut self) -> anyhow::Result<Vec<Vec<f32>>> {
        if self.last_outputs.is_empty() {
            anyhow::bail!("No outputs available; run() has not completed");
        }
        Ok(std::mem::take(&mut self.last_outputs))
    }
}

use crate::tensor::TensorAttr;
use preprocess::RgbFrame;

#[cfg(feature = "ort-backend")]
pub mod ort;

#[cfg(feature = "rknn-backend")]
pub mod rknn;

/// Input and output tensor counts of a loaded model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoNum {
    pub n_input: usize,
    pub n_output: usize,
}

/// A loaded model ready to execute.
///
/// Mirrors the runtime's call sequence: init (`load_model`), query
/// (`io_num`, `input_attrs`, `output_attrs`), `set_input`, `run`, `outputs`.
/// Dropping the backend destroys the context.
pub trait InferenceBackend {
    fn load_model(model: &[u8]) -> anyhow::Result<Self>
    where
        Self: Sized;

    fn io_num(&self) -> IoNum {
        IoNum {
            n_input: self.input_attrs().len(),
            n_output: self.output_attrs().len(),
        }
    }

    fn input_attrs(&self) -> &[TensorAttr];

    fn output_attrs(&self) -> &[TensorAttr];

    /// Runtime and driver version, when the runtime reports one
    fn sdk_version(&self) -> Option<String> {
        None
    }

    /// Submit a packed RGB image (NHWC, u8) to input 0
    fn set_input(&mut self, frame: &RgbFrame) -> anyhow::Result<()>;

    /// Execute the model once on the last submitted input
    fn run(&mut self) -> anyhow::Result<()>;

    /// Every output of the last run, dequantized to f32
    fn outputs(&mut self) -> anyhow::Result<Vec<Vec<f32>>>;
}

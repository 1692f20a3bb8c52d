use clap::Parser;
use std::path::PathBuf;

/// Input size used when the model does not report one.
pub const DEFAULT_INPUT_SIZE: (u32, u32) = (224, 224);

/// Top-1/top-5 accuracy of a classification model over a validation set
#[derive(Debug, Clone, Parser)]
#[command(name = "classification")]
pub struct Args {
    /// Model file
    #[arg(short = 'm', value_name = "model_file", default_value = "./models/AT/SqueezeNet1.0-0000.params")]
    pub model: PathBuf,

    /// Directory holding the validation images
    #[arg(short = 'i', value_name = "image_dir", default_value = "./images/val/")]
    pub image_dir: PathBuf,

    /// Label file, one `<name> <class>` line per image id
    #[arg(short = 'v', value_name = "val_file", default_value = "val.txt")]
    pub val_file: PathBuf,

    /// Maximum number of images to evaluate
    #[arg(short = 'r', value_name = "repeat_count", default_value_t = 50000)]
    pub repeat_count: usize,

    /// Apply softmax to the outputs before ranking (for models emitting logits)
    #[arg(long)]
    pub softmax: bool,
}

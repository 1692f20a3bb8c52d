pub mod accuracy;
pub mod backend;
pub mod config;
pub mod dataset;
pub mod features;
pub mod session;
pub mod tensor;
pub mod timing;
pub mod topn;

// Re-export commonly used types for convenience
pub use accuracy::{AccuracyTracker, TopListing, Verdict, evaluate};
pub use backend::{InferenceBackend, IoNum};
pub use config::SessionConfig;
pub use dataset::{LabelTable, file_id, read_directory, read_manifest};
pub use features::{DEFAULT_EMBEDDING_DIM, FeatureWriter};
pub use session::{ImageOutcome, InferenceSession};
pub use tensor::{QuantType, TensorAttr, TensorFormat, TensorType};
pub use timing::RunStats;
pub use topn::{ClassScore, MAX_TOP_NUM, TopNError, select_top_n, select_top_n_into, softmax};

#[cfg(feature = "ort-backend")]
pub use backend::ort::OrtBackend;

#[cfg(feature = "rknn-backend")]
pub use backend::rknn::RknnBackend;

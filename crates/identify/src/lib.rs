pub mod config;
pub mod runner;

pub use config::{Args, DEFAULT_INPUT_SIZE, embedding_dim_from_env};
pub use runner::run;

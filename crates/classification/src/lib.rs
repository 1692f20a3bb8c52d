pub mod config;
pub mod runner;

pub use config::{Args, DEFAULT_INPUT_SIZE};
pub use runner::run;

pub mod cli;
pub mod config;
pub mod logging;
pub mod telemetry;

pub use cli::{Cli, EXIT_FAILURE, parse_cli};
pub use config::{Environment, env_parse};
pub use logging::setup_logging;
pub use telemetry::{TelemetryGuard, TelemetrySettings, init_observability};

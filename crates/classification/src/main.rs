use classification::{Args, DEFAULT_INPUT_SIZE};
use common::{Cli, EXIT_FAILURE, Environment, init_observability, parse_cli};
use inference::SessionConfig;
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    flag,
};
use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

#[cfg(all(feature = "ort-backend", not(feature = "rknn-backend")))]
use inference::OrtBackend as Backend;

#[cfg(feature = "rknn-backend")]
use inference::RknnBackend as Backend;

#[cfg(not(any(feature = "ort-backend", feature = "rknn-backend")))]
compile_error!("At least one backend feature must be enabled: 'ort-backend' or 'rknn-backend'");

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_cli::<Args>(std::env::args_os()) {
        Cli::Run(args) => args,
        Cli::Exit(code) => return ExitCode::from(code),
    };

    let _telemetry = match init_observability("classification", Environment::from_env()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialise telemetry: {e:#}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    match evaluate(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn evaluate(args: &Args) -> anyhow::Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    flag::register(SIGTERM, Arc::clone(&shutdown))?;
    flag::register(SIGINT, Arc::clone(&shutdown))?;

    tracing::info!(args = ?args, "Loaded configuration");

    let session_config = SessionConfig::from_env(DEFAULT_INPUT_SIZE);
    let mut stdout = io::stdout().lock();
    classification::run::<Backend>(args, &session_config, &shutdown, &mut stdout)?;
    Ok(())
}

use crate::config::Args;
use anyhow::Context;
use inference::{FeatureWriter, InferenceBackend, InferenceSession, SessionConfig, read_manifest};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

const RULE: &str = "--------------------------------------";

/// Embed every listed image into `args.save_file`, echoing progress to `out`.
///
/// Returns the number of lines written. A raised `shutdown` stops after the
/// current image; lines written so far are flushed either way.
pub fn run<B: InferenceBackend>(
    args: &Args,
    session_config: &SessionConfig,
    dims: usize,
    shutdown: &AtomicBool,
    out: &mut impl Write,
) -> anyhow::Result<usize> {
    let mut session = InferenceSession::<B>::load(&args.model, session_config)?;
    write!(out, "{}", session.describe())?;

    let names = read_manifest(&args.list_name)?;
    let mut writer = FeatureWriter::create(&args.save_file, dims)?;
    tracing::info!(
        images = names.len(),
        limit = args.repeat_count,
        "Starting embedding"
    );

    for (count, name) in names.iter().take(args.repeat_count).enumerate() {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("Shutdown requested, stopping embedding");
            break;
        }

        let path = args.image_dir.join(name);
        writeln!(out, "test image count: {}", count + 1)?;
        writeln!(out, "{}", path.display())?;

        let outcome = session.process(&path)?;
        writeln!(out, "\n{}", outcome.stats)?;
        writeln!(out, "{RULE}")?;
        writeln!(out, "n_output : {}", outcome.outputs.len())?;

        let embedding = outcome
            .outputs
            .first()
            .context("Model produced no outputs")?;
        writer
            .write_embedding(embedding)
            .with_context(|| format!("Failed to write embedding of {}", path.display()))?;
    }

    let rows = writer.rows();
    writer.finish()?;
    tracing::info!(rows, save_file = %args.save_file.display(), "Embedding finished");
    Ok(rows)
}

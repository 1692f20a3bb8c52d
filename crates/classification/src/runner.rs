use crate::config::Args;
use inference::{
    AccuracyTracker, InferenceBackend, InferenceSession, LabelTable, SessionConfig, TopListing,
    Verdict, accuracy::TOP5, evaluate, file_id, read_directory, select_top_n, softmax,
};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

const RULE: &str = "--------------------------------------";

/// Evaluate the model over the image directory, writing the report to `out`.
///
/// Stops early when `shutdown` is raised, after finishing the current image.
pub fn run<B: InferenceBackend>(
    args: &Args,
    session_config: &SessionConfig,
    shutdown: &AtomicBool,
    out: &mut impl Write,
) -> anyhow::Result<AccuracyTracker> {
    let mut session = InferenceSession::<B>::load(&args.model, session_config)?;
    write!(out, "{}", session.describe())?;

    let labels = LabelTable::load(&args.val_file)?;
    let names = read_directory(&args.image_dir)?;
    tracing::info!(
        images = names.len(),
        labels = labels.len(),
        limit = args.repeat_count,
        "Starting evaluation"
    );

    let mut tracker = AccuracyTracker::default();
    for name in names.iter().take(args.repeat_count) {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("Shutdown requested, stopping evaluation");
            break;
        }

        let path = args.image_dir.join(name);
        writeln!(out, "test image count: {}", tracker.images + 1)?;
        writeln!(out, "{}", path.display())?;

        let mut outcome = session.process(&path)?;
        writeln!(out, "\n{}", outcome.stats)?;
        writeln!(out, "{RULE}")?;

        let id = file_id(name);
        let label = id.and_then(|id| labels.label_for(id));
        if label.is_none() {
            tracing::warn!(image = %name, ?id, "No ground-truth label, counting as a miss");
        }

        let mut verdict = Verdict::default();
        for output in outcome.outputs.iter_mut() {
            if args.softmax {
                softmax(output);
            }
            let top = select_top_n(output, TOP5)?;
            writeln!(out, "{}", TopListing(&top))?;
            verdict = verdict.merge(evaluate(&top, label));
        }

        if let (Some(id), Some(label)) = (id, label) {
            if verdict.top1 {
                writeln!(out, "file_id:{id} Top1 is pass {label}")?;
            }
            if verdict.top5 {
                writeln!(out, "file_id:{id} Top5 is pass {label}")?;
            }
        }

        tracker.record(verdict);
        writeln!(out, "{tracker}")?;
    }

    tracing::info!(
        images = tracker.images,
        top1 = tracker.top1,
        top5 = tracker.top5,
        "Evaluation finished"
    );
    Ok(tracker)
}

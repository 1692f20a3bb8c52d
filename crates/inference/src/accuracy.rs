use crate::topn::ClassScore;
use std::fmt;

/// Number of candidates a top-5 hit may come from.
pub const TOP5: usize = 5;

/// Whether an image's ground truth was found among its best candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verdict {
    pub top1: bool,
    pub top5: bool,
}

impl Verdict {
    /// Hit if either verdict hits, for models with several outputs
    pub fn merge(self, other: Verdict) -> Verdict {
        Verdict {
            top1: self.top1 || other.top1,
            top5: self.top5 || other.top5,
        }
    }
}

/// Compare ranked candidates against the ground-truth class.
///
/// An unknown label never matches.
pub fn evaluate(top: &[ClassScore], label: Option<u32>) -> Verdict {
    let Some(label) = label else {
        return Verdict::default();
    };
    let hit = |c: &ClassScore| !c.is_unset() && c.class == label;
    Verdict {
        top1: top.first().is_some_and(hit),
        top5: top.iter().take(TOP5).any(hit),
    }
}

/// Running hit counts over a validation set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccuracyTracker {
    pub images: u32,
    pub top1: u32,
    pub top5: u32,
}

impl AccuracyTracker {
    pub fn record(&mut self, verdict: Verdict) {
        self.images += 1;
        if verdict.top1 {
            self.top1 += 1;
        }
        if verdict.top5 {
            self.top5 += 1;
        }
    }

    /// Percentage of images whose best candidate was correct
    pub fn top1_accuracy(&self) -> f64 {
        percent(self.top1, self.images)
    }

    pub fn top5_accuracy(&self) -> f64 {
        percent(self.top5, self.images)
    }
}

fn percent(hits: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(hits) / f64::from(total) * 100.0
    }
}

impl fmt::Display for AccuracyTracker {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "===========acc test result==============")?;
        writeln!(f, "Test Image count: {}", self.images)?;
        writeln!(f, "Top1 count: {}", self.top1)?;
        writeln!(f, "Top5 count: {}", self.top5)?;
        writeln!(f, "Top1 acc: {:.6}%", self.top1_accuracy())?;
        writeln!(f, "Top5 acc: {:.6}%", self.top5_accuracy())?;
        write!(f, "=========================================")
    }
}

/// Ranked candidates rendered as ` --- Top5 ---` followed by one
/// `class: probability` line each.
pub struct TopListing<'a>(pub &'a [ClassScore]);

impl fmt::Display for TopListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, " --- Top{} ---", self.0.len())?;
        for score in self.0 {
            // Unset slots print as -1, the sentinel read as a signed index
            let class = if score.is_unset() {
                -1
            } else {
                i64::from(score.class)
            };
            write!(f, "\n{:>3}: {:>8.6}", class, score.prob)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(classes: &[u32]) -> Vec<ClassScore> {
        classes
            .iter()
            .enumerate()
            .map(|(i, &class)| ClassScore {
                class,
                prob: 0.5 / (i + 1) as f32,
            })
            .collect()
    }

    #[test]
    fn test_evaluate() {
        let top = scores(&[65, 12, 970, 3, 8]);

        assert_eq!(evaluate(&top, Some(65)), Verdict { top1: true, top5: true });
        assert_eq!(evaluate(&top, Some(8)), Verdict { top1: false, top5: true });
        assert_eq!(evaluate(&top, Some(1)), Verdict::default());
        assert_eq!(evaluate(&top, None), Verdict::default());
        assert_eq!(evaluate(&[], Some(1)), Verdict::default());
    }

    #[test]
    fn test_evaluate_only_first_five() {
        let top = scores(&[1, 2, 3, 4, 5, 6]);
        assert!(!evaluate(&top, Some(6)).top5);
    }

    #[test]
    fn test_evaluate_ignores_unset_slots() {
        let top = vec![ClassScore { class: 4, prob: 0.9 }, ClassScore::UNSET];
        assert_eq!(evaluate(&top, Some(u32::MAX)), Verdict::default());
    }

    #[test]
    fn test_merge() {
        let a = Verdict { top1: false, top5: true };
        let b = Verdict { top1: true, top5: false };
        assert_eq!(a.merge(b), Verdict { top1: true, top5: true });
        assert_eq!(Verdict::default().merge(Verdict::default()), Verdict::default());
    }

    #[test]
    fn test_tracker_report() {
        let mut tracker = AccuracyTracker::default();
        assert_eq!(tracker.top1_accuracy(), 0.0);

        tracker.record(Verdict { top1: true, top5: true });
        tracker.record(Verdict { top1: false, top5: true });
        tracker.record(Verdict::default());
        tracker.record(Verdict { top1: false, top5: true });

        assert_eq!(tracker.images, 4);
        assert_eq!(tracker.top1, 1);
        assert_eq!(tracker.top5, 3);
        assert_eq!(
            tracker.to_string(),
            "===========acc test result==============\n\
             Test Image count: 4\n\
             Top1 count: 1\n\
             Top5 count: 3\n\
             Top1 acc: 25.000000%\n\
             Top5 acc: 75.000000%\n\
             ========================================="
        );
    }

    #[test]
    fn test_top_listing() {
        let top = vec![
            ClassScore { class: 65, prob: 0.75 },
            ClassScore { class: 970, prob: 0.125 },
            ClassScore::UNSET,
        ];
        assert_eq!(
            TopListing(&top).to_string(),
            " --- Top3 ---\n 65: 0.750000\n970: 0.125000\n -1: 0.000000"
        );
    }
}

//! Top-N class selection over a dense probability vector.
//!
//! Selection is a repeated linear scan: slot `j` takes the first strictly
//! largest value whose index is not already held by slots `0..j`. That is
//! O(N × classes), which is fine for the small N this is used with, and makes
//! ties resolve to the lower class index.
//!
//! Slots start out as [`ClassScore::UNSET`] (class `0xFFFFFFFF`, probability
//! `0.0`), so only strictly positive values are ever selected and slots beyond
//! the number of positive entries stay unset.

use thiserror::Error;

/// Largest N the selector accepts.
pub const MAX_TOP_NUM: usize = 20;

/// Class index of a slot that was never filled.
pub const UNSET_CLASS: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassScore {
    pub class: u32,
    pub prob: f32,
}

impl ClassScore {
    pub const UNSET: ClassScore = ClassScore {
        class: UNSET_CLASS,
        prob: 0.0,
    };

    pub fn is_unset(&self) -> bool {
        self.class == UNSET_CLASS
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopNError {
    #[error("Requested top {requested} exceeds the limit of {max}")]
    TooMany { requested: usize, max: usize },
}

/// Fill `out` with the `out.len()` highest scores of `probs`, best first.
///
/// When `out` is longer than [`MAX_TOP_NUM`] nothing is written.
pub fn select_top_n_into(probs: &[f32], out: &mut [ClassScore]) -> Result<(), TopNError> {
    if out.len() > MAX_TOP_NUM {
        return Err(TopNError::TooMany {
            requested: out.len(),
            max: MAX_TOP_NUM,
        });
    }

    out.fill(ClassScore::UNSET);

    for j in 0..out.len() {
        for (i, &p) in probs.iter().enumerate() {
            let class = i as u32;
            if out[..j].iter().any(|chosen| chosen.class == class) {
                continue;
            }
            if p > out[j].prob {
                out[j] = ClassScore { class, prob: p };
            }
        }
    }

    Ok(())
}

/// Allocating form of [`select_top_n_into`].
pub fn select_top_n(probs: &[f32], n: usize) -> Result<Vec<ClassScore>, TopNError> {
    if n > MAX_TOP_NUM {
        return Err(TopNError::TooMany {
            requested: n,
            max: MAX_TOP_NUM,
        });
    }
    let mut out = vec![ClassScore::UNSET; n];
    select_top_n_into(probs, &mut out)?;
    Ok(out)
}

/// In-place softmax, for models that emit logits rather than probabilities.
pub fn softmax(values: &mut [f32]) {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return;
    }
    let mut sum = 0.0f32;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    if sum > 0.0 {
        for v in values.iter_mut() {
            *v /= sum;
        }
    }
}

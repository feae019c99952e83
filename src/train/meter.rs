//! Streaming epoch metrics with threshold search
//!
//! A [`Meter`] is constructed fresh for every (phase, epoch) pair. Each
//! processed batch feeds it raw masks and logits; it keeps exact per-pixel
//! confusion counts at every candidate threshold, so the epoch summary is
//! independent of how pixels were split across batches.

use crate::backend::{Confusion, NumericBackend};
use crate::error::{Error, Result};
use crate::train::loss::SMOOTH;
use crate::train::Phase;
use ndarray::ArrayD;
use std::time::Instant;

/// Epoch-level scores at the selected threshold
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpochScores {
    pub dice: f32,
    pub iou: f32,
    pub accuracy: f32,
    /// Candidate threshold that maximized IoU
    pub threshold: f32,
}

/// Accumulates confusion counts for one phase of one epoch
pub struct Meter {
    phase: Phase,
    epoch: usize,
    thresholds: Vec<f32>,
    counts: Vec<Confusion>,
}

impl Meter {
    /// Create a meter over the given candidate thresholds
    pub fn new(phase: Phase, epoch: usize, thresholds: &[f32]) -> Self {
        Self {
            phase,
            epoch,
            thresholds: thresholds.to_vec(),
            counts: vec![Confusion::default(); thresholds.len()],
        }
    }

    /// Accumulate one batch of (masks, logits)
    pub fn update(
        &mut self,
        backend: &dyn NumericBackend,
        masks: &ArrayD<f32>,
        logits: &ArrayD<f32>,
    ) -> Result<()> {
        if masks.shape() != logits.shape() {
            return Err(Error::ShapeMismatch {
                expected: logits.shape().to_vec(),
                got: masks.shape().to_vec(),
            });
        }

        let probs = backend.unary_map(logits, &|x| 1.0 / (1.0 + (-x).exp()));
        for (threshold, counts) in self.thresholds.iter().zip(self.counts.iter_mut()) {
            *counts += backend.confusion(&probs, masks, *threshold);
        }
        Ok(())
    }

    /// Confusion counts per candidate threshold, in threshold order
    pub fn counts(&self) -> &[Confusion] {
        &self.counts
    }

    /// Reduce the accumulated counts to epoch scores and print the summary
    ///
    /// Picks the threshold with the highest IoU; ties go to the smaller
    /// threshold value so the choice is deterministic even when the grid is
    /// not sorted.
    pub fn summarize(&self, epoch_loss: f32, started: Instant) -> EpochScores {
        let mut best: Option<EpochScores> = None;
        for (threshold, counts) in self.thresholds.iter().zip(self.counts.iter()) {
            let scores = scores_at(counts, *threshold);
            let better = match best {
                Some(b) => {
                    scores.iou > b.iou || (scores.iou == b.iou && scores.threshold < b.threshold)
                }
                None => true,
            };
            if better {
                best = Some(scores);
            }
        }
        let scores = best.unwrap_or(EpochScores {
            dice: 1.0,
            iou: 1.0,
            accuracy: 1.0,
            threshold: 0.5,
        });

        println!(
            "{} epoch {}: loss {:.4} | dice {:.4} | iou {:.4} | acc {:.4} | thr {:.2} | {:.1}s",
            self.phase,
            self.epoch,
            epoch_loss,
            scores.dice,
            scores.iou,
            scores.accuracy,
            scores.threshold,
            started.elapsed().as_secs_f64(),
        );
        scores
    }
}

/// Scores from one confusion record, ε-guarded against empty phases
fn scores_at(counts: &Confusion, threshold: f32) -> EpochScores {
    let tp = counts.true_pos as f64;
    let fp = counts.false_pos as f64;
    let tn = counts.true_neg as f64;
    let fn_ = counts.false_neg as f64;
    let smooth = SMOOTH as f64;

    // With no positives anywhere, numerator and denominator both collapse
    // to the smoothing constant and the scores resolve to 1.0, not NaN.
    let dice = (2.0 * tp + smooth) / (2.0 * tp + fp + fn_ + smooth);
    let iou = (tp + smooth) / (tp + fp + fn_ + smooth);
    let accuracy = (tp + tn + smooth) / (tp + fp + tn + fn_ + smooth);

    EpochScores {
        dice: dice as f32,
        iou: iou as f32,
        accuracy: accuracy as f32,
        threshold,
    }
}

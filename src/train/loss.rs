//! Composite segmentation loss: focal + soft-Dice
//!
//! The focal term uses the max-clamp log-sum-exp form of binary
//! cross-entropy so extreme logits never produce NaN or Inf, and weights
//! each pixel by the probability of the incorrect class raised to γ. The
//! Dice term is a global soft overlap over the whole batch, converted to a
//! loss via `-ln(dice)`.
//!
//! Because the model behind the [`SegmentationModel`](crate::train::SegmentationModel)
//! seam is opaque, each loss also supplies its analytic gradient with
//! respect to the logits, the same way the optimizer receives gradients
//! from the model's own backward pass.

use crate::backend::NumericBackend;
use crate::error::{Error, Result};
use ndarray::ArrayD;

/// Additive smoothing constant guarding Dice/IoU denominators
pub const SMOOTH: f32 = 1e-7;

#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Numerically stable log(sigmoid(z))
#[inline]
fn log_sigmoid(z: f32) -> f32 {
    -((-z).max(0.0) + (-z.abs()).exp().ln_1p())
}

/// Stable binary cross-entropy of one logit against one target
///
/// Equals `-[t·ln σ(x) + (1-t)·ln(1-σ(x))]`, computed as
/// `x - x·t + max(-x, 0) + ln(e^{-max} + e^{-x-max})`.
#[inline]
fn stable_bce(x: f32, t: f32) -> f32 {
    let max_val = (-x).max(0.0);
    x - x * t + max_val + ((-max_val).exp() + (-x - max_val).exp()).ln()
}

/// Per-pixel focal term: `exp(γ·ln σ(-x·(2t-1))) · bce(x, t)`
#[inline]
fn focal_term(x: f32, t: f32, gamma: f32) -> f32 {
    let invprob = log_sigmoid(-x * (2.0 * t - 1.0));
    (gamma * invprob).exp() * stable_bce(x, t)
}

fn check_shapes(logits: &ArrayD<f32>, mask: &ArrayD<f32>) -> Result<()> {
    if logits.shape() != mask.shape() {
        return Err(Error::ShapeMismatch {
            expected: logits.shape().to_vec(),
            got: mask.shape().to_vec(),
        });
    }
    Ok(())
}

/// Soft-Dice similarity of `sigmoid(logits)` against `mask`, in (0, 1]
///
/// Pooled globally over every element of the batch rather than
/// per-sample-then-averaged. This matches common segmentation training but
/// couples the value to batch size; large batches dilute the contribution
/// of any single image.
pub fn dice_coefficient(
    backend: &dyn NumericBackend,
    logits: &ArrayD<f32>,
    mask: &ArrayD<f32>,
    smooth: f32,
) -> Result<f32> {
    check_shapes(logits, mask)?;

    let probs = backend.unary_map(logits, &sigmoid);
    let intersection = backend.zip_sum(&probs, mask, &|p, m| p as f64 * m as f64);
    let denom = backend.sum(&probs) + backend.sum(mask);

    Ok(((2.0 * intersection + smooth as f64) / (denom + smooth as f64)) as f32)
}

/// Focal loss over per-pixel logits
///
/// γ controls how strongly well-classified pixels are down-weighted; larger
/// γ focuses the loss on hard pixels.
pub struct FocalLoss {
    gamma: f32,
}

impl FocalLoss {
    pub fn new(gamma: f32) -> Self {
        Self { gamma }
    }

    /// Mean focal term over all elements
    pub fn forward(
        &self,
        backend: &dyn NumericBackend,
        logits: &ArrayD<f32>,
        mask: &ArrayD<f32>,
    ) -> Result<f32> {
        check_shapes(logits, mask)?;
        if logits.is_empty() {
            return Ok(0.0);
        }

        let gamma = self.gamma;
        let total = backend.zip_sum(logits, mask, &|x, t| focal_term(x, t, gamma) as f64);
        Ok((total / logits.len() as f64) as f32)
    }
}

/// Composite loss: `α · focal(logits, mask) − ln(dice(logits, mask))`
pub struct MixedLoss {
    alpha: f32,
    focal: FocalLoss,
}

impl MixedLoss {
    pub fn new(alpha: f32, gamma: f32) -> Self {
        Self {
            alpha,
            focal: FocalLoss::new(gamma),
        }
    }

    /// Scalar loss for one batch
    pub fn forward(
        &self,
        backend: &dyn NumericBackend,
        logits: &ArrayD<f32>,
        mask: &ArrayD<f32>,
    ) -> Result<f32> {
        let focal = self.focal.forward(backend, logits, mask)?;
        let dice = dice_coefficient(backend, logits, mask, SMOOTH)?;
        Ok(self.alpha * focal - dice.ln())
    }

    /// Analytic gradient of the loss with respect to the logits
    ///
    /// Verified against central finite differences in the tests; this is
    /// what the trainer hands to the model's backward pass.
    pub fn grad_logits(
        &self,
        backend: &dyn NumericBackend,
        logits: &ArrayD<f32>,
        mask: &ArrayD<f32>,
    ) -> Result<ArrayD<f32>> {
        check_shapes(logits, mask)?;

        let probs = backend.unary_map(logits, &sigmoid);
        let intersection = backend.zip_sum(&probs, mask, &|p, m| p as f64 * m as f64);
        // Numerator and denominator of the global dice quotient
        let num = (2.0 * intersection + SMOOTH as f64) as f32;
        let den = (backend.sum(&probs) + backend.sum(mask) + SMOOTH as f64) as f32;

        let n = logits.len().max(1) as f32;
        let alpha = self.alpha;
        let gamma = self.focal.gamma;

        Ok(backend.zip_map(logits, mask, &move |x, t| {
            let p = sigmoid(x);
            let dsig = p * (1.0 - p);

            // d(-ln(num/den))/dx through the sigmoid
            let g_dice = dsig * (1.0 / den - 2.0 * t / num);

            // Product rule on weight(x) · bce(x)
            let sign = 2.0 * t - 1.0;
            let z = -x * sign;
            let pw = sigmoid(z);
            let w = (gamma * log_sigmoid(z)).exp();
            let d_weight = w * gamma * (1.0 - pw) * (-sign);
            let g_focal = d_weight * stable_bce(x, t) + w * (p - t);

            alpha * g_focal / n + g_dice
        }))
    }
}

//! Numeric backend abstraction
//!
//! The loss and confusion-count kernels are written against the
//! [`NumericBackend`] capability trait rather than a concrete array type.
//! A backend is selected once when the training session is constructed and
//! is fixed for the run.
//!
//! Two backends are provided:
//! - [`CpuBackend`] — straightforward serial ndarray implementation
//! - [`ParallelBackend`] — rayon-parallel maps and reductions, useful for
//!   large batches

mod cpu;
mod parallel;

pub use cpu::CpuBackend;
pub use parallel::ParallelBackend;

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

/// Pixel-level confusion counts at a single binarization threshold
///
/// Counts accumulate additively and exactly: each pixel of each batch
/// contributes to exactly one counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confusion {
    pub true_pos: u64,
    pub false_pos: u64,
    pub true_neg: u64,
    pub false_neg: u64,
}

impl Confusion {
    /// Total number of pixels counted
    pub fn total(&self) -> u64 {
        self.true_pos + self.false_pos + self.true_neg + self.false_neg
    }
}

impl std::ops::Add for Confusion {
    type Output = Confusion;

    fn add(self, rhs: Confusion) -> Confusion {
        Confusion {
            true_pos: self.true_pos + rhs.true_pos,
            false_pos: self.false_pos + rhs.false_pos,
            true_neg: self.true_neg + rhs.true_neg,
            false_neg: self.false_neg + rhs.false_neg,
        }
    }
}

impl std::ops::AddAssign for Confusion {
    fn add_assign(&mut self, rhs: Confusion) {
        *self = *self + rhs;
    }
}

/// Capability interface over the numeric primitives the engine needs
///
/// Implementations must be pure: the same inputs produce the same outputs
/// regardless of backend, so swapping backends never changes training
/// results, only how the work is scheduled.
pub trait NumericBackend {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Elementwise map over one array
    fn unary_map(&self, a: &ArrayD<f32>, f: &(dyn Fn(f32) -> f32 + Sync)) -> ArrayD<f32>;

    /// Elementwise map over two same-shape arrays
    fn zip_map(
        &self,
        a: &ArrayD<f32>,
        b: &ArrayD<f32>,
        f: &(dyn Fn(f32, f32) -> f32 + Sync),
    ) -> ArrayD<f32>;

    /// Σ f(a_i, b_i) with an f64 accumulator
    fn zip_sum(
        &self,
        a: &ArrayD<f32>,
        b: &ArrayD<f32>,
        f: &(dyn Fn(f32, f32) -> f64 + Sync),
    ) -> f64;

    /// Σ a_i with an f64 accumulator
    fn sum(&self, a: &ArrayD<f32>) -> f64;

    /// Confusion counts of `probs` binarized at `threshold` against `mask`
    ///
    /// A pixel is predicted positive when `prob >= threshold` and is ground
    /// truth positive when `mask >= 0.5`.
    fn confusion(&self, probs: &ArrayD<f32>, mask: &ArrayD<f32>, threshold: f32) -> Confusion;

    /// Release any memory cached for the current phase
    ///
    /// Called at the end of every phase to bound peak usage. No-op for the
    /// CPU backends.
    fn release_cache(&self) {}
}

/// Compute device for a training session, fixed at construction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Device {
    /// Single-threaded CPU execution
    #[default]
    Cpu,
    /// Rayon-parallel CPU execution
    Parallel,
}

impl Device {
    /// Construct the backend for this device
    pub fn backend(self) -> Box<dyn NumericBackend> {
        match self {
            Device::Cpu => Box::new(CpuBackend),
            Device::Parallel => Box::new(ParallelBackend),
        }
    }
}

/// Count one pixel into a confusion record
#[inline]
pub(crate) fn count_pixel(counts: &mut Confusion, prob: f32, mask: f32, threshold: f32) {
    let predicted = prob >= threshold;
    let actual = mask >= 0.5;
    match (predicted, actual) {
        (true, true) => counts.true_pos += 1,
        (true, false) => counts.false_pos += 1,
        (false, true) => counts.false_neg += 1,
        (false, false) => counts.true_neg += 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;

    fn arr(values: &[f32]) -> ArrayD<f32> {
        ArrayD::from_shape_vec(vec![values.len()], values.to_vec()).unwrap()
    }

    #[test]
    fn test_confusion_addition() {
        let a = Confusion {
            true_pos: 1,
            false_pos: 2,
            true_neg: 3,
            false_neg: 4,
        };
        let b = Confusion {
            true_pos: 10,
            false_pos: 20,
            true_neg: 30,
            false_neg: 40,
        };
        let c = a + b;
        assert_eq!(c.true_pos, 11);
        assert_eq!(c.false_neg, 44);
        assert_eq!(c.total(), 110);
    }

    #[test]
    fn test_backends_agree_on_maps() {
        let cpu = CpuBackend;
        let par = ParallelBackend;
        let a = arr(&[-2.0, -1.0, 0.0, 1.0, 2.0]);
        let b = arr(&[1.0, 0.0, 1.0, 0.0, 1.0]);

        let f = |x: f32, y: f32| x * 0.5 + y;
        assert_eq!(cpu.zip_map(&a, &b, &f), par.zip_map(&a, &b, &f));

        let g = |x: f32| 1.0 / (1.0 + (-x).exp());
        assert_eq!(cpu.unary_map(&a, &g), par.unary_map(&a, &g));
    }

    #[test]
    fn test_backends_agree_on_sums() {
        let cpu = CpuBackend;
        let par = ParallelBackend;
        let a = arr(&[0.1, 0.2, 0.3, 0.4]);
        let b = arr(&[1.0, 1.0, 0.0, 0.0]);

        let f = |x: f32, y: f32| (x * y) as f64;
        assert_eq!(cpu.zip_sum(&a, &b, &f), par.zip_sum(&a, &b, &f));
        assert_eq!(cpu.sum(&a), par.sum(&a));
    }

    #[test]
    fn test_backends_agree_on_confusion() {
        let cpu = CpuBackend;
        let par = ParallelBackend;
        let probs = arr(&[0.1, 0.4, 0.5, 0.6, 0.9, 0.2]);
        let mask = arr(&[0.0, 1.0, 1.0, 0.0, 1.0, 0.0]);

        for threshold in [0.3, 0.5, 0.7] {
            assert_eq!(
                cpu.confusion(&probs, &mask, threshold),
                par.confusion(&probs, &mask, threshold)
            );
        }
    }

    #[test]
    fn test_confusion_counts_exact() {
        let cpu = CpuBackend;
        let probs = arr(&[0.9, 0.9, 0.1, 0.1]);
        let mask = arr(&[1.0, 0.0, 1.0, 0.0]);
        let counts = cpu.confusion(&probs, &mask, 0.5);

        assert_eq!(counts.true_pos, 1);
        assert_eq!(counts.false_pos, 1);
        assert_eq!(counts.false_neg, 1);
        assert_eq!(counts.true_neg, 1);
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let cpu = CpuBackend;
        let probs = arr(&[0.5]);
        let mask = arr(&[1.0]);
        let counts = cpu.confusion(&probs, &mask, 0.5);
        assert_eq!(counts.true_pos, 1);
    }

    #[test]
    fn test_device_backend_selection() {
        assert_eq!(Device::Cpu.backend().name(), "cpu");
        assert_eq!(Device::Parallel.backend().name(), "parallel");
    }
}

//! Optimizer trait

use crate::error::Result;
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// Serializable optimizer state for checkpointing
///
/// Moment buffers are stored per parameter, in parameter order. An empty
/// inner vector means the buffer has not been initialized yet.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OptimizerState {
    /// Number of update steps taken
    pub step: u64,
    /// First-moment (momentum) buffers
    pub first_moment: Vec<Vec<f32>>,
    /// Second-moment (variance) buffers
    pub second_moment: Vec<Vec<f32>>,
}

/// Trait for optimization algorithms
///
/// The per-batch update protocol is three-phase and atomic:
/// `zero_grad` clears accumulated gradients, the model's backward pass
/// accumulates fresh ones, and `step` applies the update. Gradients are
/// never carried across batches.
pub trait Optimizer {
    /// Apply one update using the gradients accumulated in `params`
    fn step(&mut self, params: &[Tensor]);

    /// Zero out all gradients
    fn zero_grad(&mut self, params: &[Tensor]) {
        for param in params {
            param.zero_grad();
        }
    }

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);

    /// Capture internal state for checkpointing
    fn state_dict(&self) -> OptimizerState;

    /// Restore internal state from a checkpoint
    fn load_state_dict(&mut self, state: OptimizerState) -> Result<()>;
}

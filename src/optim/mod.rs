//! Optimizers and learning-rate scheduling

mod adam;
mod optimizer;
mod scheduler;

pub use adam::Adam;
pub use optimizer::{Optimizer, OptimizerState};
pub use scheduler::ReduceOnPlateau;

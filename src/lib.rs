//! # Segmentar: Binary Segmentation Training Engine
//!
//! Segmentar turns paired (image, mask) batches into a scalar loss,
//! accumulates exact accuracy statistics across an epoch, and decides when
//! to persist model state. The model, the dataset pipeline, and the
//! optimizer update rule are external collaborators behind trait seams.
//!
//! ## Architecture
//!
//! - **backend**: numeric capability interface with serial and
//!   rayon-parallel CPU implementations
//! - **tensor**: parameter arrays with shared gradient storage
//! - **optim**: Adam and reduce-on-plateau learning-rate scheduling
//! - **train**: composite focal + soft-Dice loss, threshold-searched epoch
//!   metrics, and the epoch/phase orchestrator
//! - **checkpoint**: atomic best-model snapshots

pub mod backend;
pub mod checkpoint;
pub mod optim;
pub mod tensor;
pub mod train;

pub mod error;

// Re-export commonly used types
pub use error::{Error, Result};
pub use tensor::Tensor;

//! Training and evaluation engine
//!
//! This module contains the orchestration core: the composite loss, the
//! streaming metric meter, the session value object, and the trainer that
//! drives the epoch/phase loop.
//!
//! # Example
//!
//! ```no_run
//! use segmentar::train::{Batch, BatchProvider, Phase, TrainConfig, Trainer};
//! # use segmentar::train::SegmentationModel;
//! # fn demo(model: impl SegmentationModel, provider: impl BatchProvider) -> segmentar::Result<()> {
//! let config = TrainConfig::new()
//!     .with_epochs(20)
//!     .with_checkpoint_path("best.json");
//!
//! let mut trainer = Trainer::new(model, provider, config)?;
//! let result = trainer.run()?;
//! println!("best validation loss: {:.4}", result.best_loss);
//! # Ok(())
//! # }
//! ```

mod batch;
mod config;
pub mod loss;
mod meter;
mod model;
mod session;
mod trainer;

pub use batch::{ensure_channel_axis, Batch, BatchProvider};
pub use config::TrainConfig;
pub use loss::{dice_coefficient, FocalLoss, MixedLoss};
pub use meter::{EpochScores, Meter};
pub use model::SegmentationModel;
pub use session::{EpochRecord, Phase, TrainingSession};
pub use trainer::{TrainResult, Trainer};

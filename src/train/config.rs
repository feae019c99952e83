//! Training configuration

use crate::backend::Device;
use crate::error::{Error, Result};
use std::path::PathBuf;

/// Training configuration
///
/// Every knob the orchestrator consumes lives here explicitly; nothing is
/// read from ambient state.
#[derive(Clone, Debug)]
pub struct TrainConfig {
    /// Batch-provider parallelism hint, passed through opaquely
    pub num_workers: usize,

    /// Batch size used by the provider for both phases
    pub batch_size: usize,

    /// Initial learning rate
    pub learning_rate: f32,

    /// Number of epochs to run
    pub num_epochs: usize,

    /// Destination for the best-model checkpoint
    pub checkpoint_path: PathBuf,

    /// Run the validation phase every N epochs
    pub validation_interval: usize,

    /// Weight of the focal term in the composite loss
    pub loss_alpha: f32,

    /// Focal down-weighting exponent
    pub loss_gamma: f32,

    /// Candidate binarization thresholds searched by the meter
    pub threshold_grid: Vec<f32>,

    /// Compute device, fixed for the whole session
    pub device: Device,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            num_workers: 4,
            batch_size: 32,
            learning_rate: 1e-3,
            num_epochs: 20,
            checkpoint_path: PathBuf::from("checkpoint.json"),
            validation_interval: 5,
            loss_alpha: 9.0,
            loss_gamma: 4.0,
            threshold_grid: vec![0.3, 0.4, 0.5, 0.6, 0.7],
            device: Device::Cpu,
        }
    }
}

impl TrainConfig {
    /// Create a new training configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set learning rate
    pub fn with_learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set epoch count
    pub fn with_epochs(mut self, num_epochs: usize) -> Self {
        self.num_epochs = num_epochs;
        self
    }

    /// Set batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the provider worker hint
    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    /// Set checkpoint destination
    pub fn with_checkpoint_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint_path = path.into();
        self
    }

    /// Set validation cadence
    pub fn with_validation_interval(mut self, interval: usize) -> Self {
        self.validation_interval = interval;
        self
    }

    /// Set composite loss weights
    pub fn with_loss_weights(mut self, alpha: f32, gamma: f32) -> Self {
        self.loss_alpha = alpha;
        self.loss_gamma = gamma;
        self
    }

    /// Set the candidate threshold grid
    pub fn with_threshold_grid(mut self, grid: Vec<f32>) -> Self {
        self.threshold_grid = grid;
        self
    }

    /// Set the compute device
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.num_epochs == 0 {
            return Err(Error::InvalidParameter("num_epochs must be >= 1".into()));
        }
        if self.validation_interval == 0 {
            return Err(Error::InvalidParameter(
                "validation_interval must be >= 1".into(),
            ));
        }
        if self.threshold_grid.is_empty() {
            return Err(Error::InvalidParameter(
                "threshold_grid must not be empty".into(),
            ));
        }
        if self.threshold_grid.iter().any(|t| !(0.0..=1.0).contains(t)) {
            return Err(Error::InvalidParameter(
                "thresholds must lie in [0, 1]".into(),
            ));
        }
        if !(self.learning_rate > 0.0) {
            return Err(Error::InvalidParameter(
                "learning_rate must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = TrainConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.validation_interval, 5);
        assert_eq!(config.loss_alpha, 9.0);
        assert_eq!(config.loss_gamma, 4.0);
        assert_eq!(config.threshold_grid.len(), 5);
    }

    #[test]
    fn test_builder_chain() {
        let config = TrainConfig::new()
            .with_learning_rate(5e-4)
            .with_epochs(10)
            .with_batch_size(8)
            .with_num_workers(2)
            .with_validation_interval(2)
            .with_loss_weights(4.0, 2.0)
            .with_checkpoint_path("/tmp/best.json");

        assert_eq!(config.learning_rate, 5e-4);
        assert_eq!(config.num_epochs, 10);
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.num_workers, 2);
        assert_eq!(config.validation_interval, 2);
        assert_eq!(config.loss_alpha, 4.0);
        assert_eq!(config.checkpoint_path, PathBuf::from("/tmp/best.json"));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let config = TrainConfig::new().with_validation_interval(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let config = TrainConfig::new().with_threshold_grid(vec![0.5, 1.5]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_grid() {
        let config = TrainConfig::new().with_threshold_grid(vec![]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_learning_rate() {
        let config = TrainConfig::new().with_learning_rate(0.0);
        assert!(config.validate().is_err());
    }
}

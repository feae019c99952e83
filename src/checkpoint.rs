//! Best-model checkpointing
//!
//! A checkpoint is one JSON record at a fixed path, overwritten each time
//! validation loss improves. Writes go through a sibling temp file and a
//! rename, so a reader always sees either the old or the new complete
//! snapshot, never a partial one.

use crate::error::{Error, Result};
use crate::optim::OptimizerState;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted snapshot of the best model seen so far
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Epoch whose validation produced this snapshot
    pub epoch: usize,
    /// Validation loss at that epoch
    pub best_loss: f32,
    /// Named model parameter data
    pub model_state: Vec<(String, Vec<f32>)>,
    /// Optimizer moment buffers and step count
    pub optimizer_state: OptimizerState,
}

impl Checkpoint {
    /// Atomically write this snapshot to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string(self)
            .map_err(|e| Error::Serialization(format!("checkpoint serialization failed: {e}")))?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, data)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Load a snapshot from `path`
    pub fn load(path: &Path) -> Result<Checkpoint> {
        let data = fs::read_to_string(path)?;
        serde_json::from_str(&data)
            .map_err(|e| Error::Serialization(format!("checkpoint parse failed: {e}")))
    }
}

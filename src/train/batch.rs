//! Batches and the batch-provider seam

use crate::train::Phase;
use ndarray::{ArrayD, Axis};

/// One ready-to-consume batch of images and ground-truth masks
///
/// Images are `[batch, channels, H, W]`; masks arrive either as
/// `[batch, 1, H, W]` or as `[batch, H, W]`, in which case the trainer
/// inserts the channel axis before the loss and meter see them.
#[derive(Clone, Debug)]
pub struct Batch {
    pub images: ArrayD<f32>,
    pub masks: ArrayD<f32>,
}

impl Batch {
    pub fn new(images: ArrayD<f32>, masks: ArrayD<f32>) -> Self {
        Self { images, masks }
    }
}

/// Source of batches for each phase
///
/// Implementations may load and augment in parallel internally; the trainer
/// treats batch order as opaque and consumes them on a single thread.
pub trait BatchProvider {
    /// Receive the loading hints from the training configuration
    ///
    /// Called once before the first epoch. Both values are opaque to the
    /// trainer; providers that ignore them keep the default no-op.
    fn configure(&mut self, num_workers: usize, batch_size: usize) {
        let _ = (num_workers, batch_size);
    }

    /// Produce the batches for one pass over the given phase's data
    fn batches(&mut self, phase: Phase) -> Vec<Batch>;
}

/// Give a `[batch, H, W]` mask its explicit single-channel dimension
///
/// Binary segmentation keeps one channel; masks that already carry a
/// channel axis pass through unchanged.
pub fn ensure_channel_axis(masks: ArrayD<f32>) -> ArrayD<f32> {
    if masks.ndim() == 3 {
        masks.insert_axis(Axis(1))
    } else {
        masks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_axis_inserted() {
        let masks = ArrayD::from_shape_vec(vec![2, 4, 4], vec![0.0; 32]).unwrap();
        let reshaped = ensure_channel_axis(masks);
        assert_eq!(reshaped.shape(), &[2, 1, 4, 4]);
    }

    #[test]
    fn test_channel_axis_preserved() {
        let masks = ArrayD::from_shape_vec(vec![2, 1, 4, 4], vec![0.0; 32]).unwrap();
        let reshaped = ensure_channel_axis(masks);
        assert_eq!(reshaped.shape(), &[2, 1, 4, 4]);
    }
}

//! Segmentation model seam
//!
//! The engine treats the model as an opaque function from image batches to
//! per-pixel logits with learnable internal state. Gradient flow crosses
//! the seam explicitly: the loss computes `dL/dlogits` and the model's
//! backward pass accumulates parameter gradients from it.

use crate::error::{Error, Result};
use crate::tensor::Tensor;
use ndarray::ArrayD;

/// Opaque segmentation model with learnable parameters
pub trait SegmentationModel {
    /// Switch between training mode (gradient bookkeeping on) and eval mode
    fn set_training(&mut self, training: bool);

    /// Map an image batch `[batch, C, H, W]` to logits `[batch, 1, H, W]`
    fn forward(&mut self, images: &ArrayD<f32>) -> Result<ArrayD<f32>>;

    /// Accumulate parameter gradients from the loss gradient w.r.t. logits
    ///
    /// `images` is the same batch the preceding `forward` saw.
    fn backward(&mut self, images: &ArrayD<f32>, grad_logits: &ArrayD<f32>) -> Result<()>;

    /// Learnable parameters as cheap handles sharing gradient storage
    fn parameters(&self) -> Vec<Tensor>;

    /// Named parameter data for checkpointing
    ///
    /// The default implementation names parameters by position.
    fn state_dict(&self) -> Vec<(String, Vec<f32>)> {
        self.parameters()
            .iter()
            .enumerate()
            .map(|(i, p)| (format!("param.{i}"), p.data().to_vec()))
            .collect()
    }

    /// Restore parameter data from a checkpoint, matching by position
    fn load_state_dict(&mut self, state: &[(String, Vec<f32>)]) -> Result<()> {
        let params = self.parameters();
        if state.len() != params.len() {
            return Err(Error::InvalidParameter(format!(
                "state has {} parameters, model has {}",
                state.len(),
                params.len()
            )));
        }
        for ((name, values), param) in state.iter().zip(params.iter()) {
            if values.len() != param.len() {
                return Err(Error::InvalidParameter(format!(
                    "parameter {name}: expected {} values, got {}",
                    param.len(),
                    values.len()
                )));
            }
            param.update(|data| {
                data.as_slice_mut()
                    .expect("parameter storage is contiguous")
                    .copy_from_slice(values)
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    /// Minimal model: logits are a learned per-pixel field, images ignored
    struct FieldModel {
        field: Tensor,
        training: bool,
    }

    impl FieldModel {
        fn new(pixels: usize) -> Self {
            Self {
                field: Tensor::zeros(pixels, true),
                training: true,
            }
        }
    }

    impl SegmentationModel for FieldModel {
        fn set_training(&mut self, training: bool) {
            self.training = training;
        }

        fn forward(&mut self, images: &ArrayD<f32>) -> Result<ArrayD<f32>> {
            let batch = images.shape()[0];
            let data = self.field.data();
            let mut out = Vec::with_capacity(batch * data.len());
            for _ in 0..batch {
                out.extend_from_slice(data.as_slice().unwrap());
            }
            Ok(ArrayD::from_shape_vec(vec![batch, 1, 1, data.len()], out).unwrap())
        }

        fn backward(&mut self, _images: &ArrayD<f32>, grad_logits: &ArrayD<f32>) -> Result<()> {
            let pixels = self.field.len();
            let mut grad = Array1::zeros(pixels);
            for (i, &g) in grad_logits.iter().enumerate() {
                grad[i % pixels] += g;
            }
            self.field.accumulate_grad(grad);
            Ok(())
        }

        fn parameters(&self) -> Vec<Tensor> {
            vec![self.field.clone()]
        }
    }

    #[test]
    fn test_default_state_dict_names_by_position() {
        let model = FieldModel::new(4);
        let state = model.state_dict();
        assert_eq!(state.len(), 1);
        assert_eq!(state[0].0, "param.0");
        assert_eq!(state[0].1.len(), 4);
    }

    #[test]
    fn test_load_state_dict_round_trip() {
        let mut model = FieldModel::new(3);
        let state = vec![("param.0".to_string(), vec![1.0, 2.0, 3.0])];
        model.load_state_dict(&state).unwrap();
        assert_eq!(model.state_dict()[0].1, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_load_state_dict_rejects_wrong_count() {
        let mut model = FieldModel::new(3);
        assert!(model.load_state_dict(&[]).is_err());
    }

    #[test]
    fn test_load_state_dict_rejects_wrong_len() {
        let mut model = FieldModel::new(3);
        let state = vec![("param.0".to_string(), vec![1.0])];
        assert!(model.load_state_dict(&state).is_err());
    }
}

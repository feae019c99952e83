//! Parameter tensor with shared gradient storage
//!
//! A `Tensor` is a flat parameter array whose gradient lives in a shared
//! cell. Cloning a `Tensor` is cheap and yields a handle to the same
//! gradient storage, so a model can hand its parameters to the optimizer
//! while continuing to accumulate gradients into them during backward.

use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Learnable parameter with gradient accumulation support
#[derive(Clone)]
pub struct Tensor {
    data: Rc<RefCell<Array1<f32>>>,
    grad: Rc<RefCell<Option<Array1<f32>>>>,
    requires_grad: bool,
}

impl Tensor {
    /// Create a new tensor with data
    pub fn new(data: Array1<f32>, requires_grad: bool) -> Self {
        Self {
            data: Rc::new(RefCell::new(data)),
            grad: Rc::new(RefCell::new(None)),
            requires_grad,
        }
    }

    /// Create a tensor from a vector
    pub fn from_vec(data: Vec<f32>, requires_grad: bool) -> Self {
        Self::new(Array1::from(data), requires_grad)
    }

    /// Create a tensor filled with zeros
    pub fn zeros(size: usize, requires_grad: bool) -> Self {
        Self::new(Array1::zeros(size), requires_grad)
    }

    /// Get a copy of the data
    pub fn data(&self) -> Array1<f32> {
        self.data.borrow().clone()
    }

    /// Apply an in-place update to the data
    pub fn update<F: FnOnce(&mut Array1<f32>)>(&self, f: F) {
        f(&mut self.data.borrow_mut());
    }

    /// Get gradient (if accumulated)
    pub fn grad(&self) -> Option<Array1<f32>> {
        self.grad.borrow().clone()
    }

    /// Accumulate gradient (adds to any existing gradient)
    pub fn accumulate_grad(&self, grad: Array1<f32>) {
        let mut grad_ref = self.grad.borrow_mut();
        if let Some(existing) = grad_ref.as_mut() {
            *existing = &*existing + &grad;
        } else {
            *grad_ref = Some(grad);
        }
    }

    /// Zero out gradient
    pub fn zero_grad(&self) {
        *self.grad.borrow_mut() = None;
    }

    /// Check if requires gradient
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Get size
    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_empty()
    }
}

impl std::fmt::Debug for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("data", &self.data.borrow())
            .field("grad", &self.grad.borrow())
            .field("requires_grad", &self.requires_grad)
            .finish()
    }
}

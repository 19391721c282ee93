//! Backend selection - CPU NdArray backend
//!
//! The sample targets plain CPU execution so it runs anywhere; the trainer
//! wraps the base backend in Autodiff for gradient computation.

use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};

/// Backend used for inference and validation passes
pub type DefaultBackend = NdArray;

/// Autodiff backend used for training
pub type TrainingBackend = Autodiff<DefaultBackend>;

/// Get the default device
pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::Cpu
}

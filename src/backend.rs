//! Backend abstraction - inference-only backends
//!
//! CUDA (GPU) when the `cuda` feature is enabled, NdArray (CPU) otherwise.
//! Neither backend is wrapped in `Autodiff`, so no gradient graph is ever recorded.

use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};

#[cfg(feature = "cuda")]
pub type InferenceBackend = burn_cuda::Cuda;

#[cfg(all(not(feature = "cuda"), feature = "ndarray"))]
pub type InferenceBackend = burn_ndarray::NdArray;

#[cfg(all(not(feature = "cuda"), not(feature = "ndarray")))]
compile_error!("At least one backend (cuda or ndarray) must be enabled!");

/// Device handle of the compiled backend
pub type InferenceDevice = <InferenceBackend as Backend>::Device;

/// Compute device the classifier is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputeDevice {
    Cpu,
    Cuda,
}

impl ComputeDevice {
    /// Resolve the device once from the compiled backend features
    pub fn detect() -> Self {
        if cfg!(feature = "cuda") {
            ComputeDevice::Cuda
        } else {
            ComputeDevice::Cpu
        }
    }

    /// Burn device handle for this choice
    pub fn device(&self) -> InferenceDevice {
        InferenceDevice::default()
    }

    pub fn is_accelerator(&self) -> bool {
        matches!(self, ComputeDevice::Cuda)
    }
}

impl std::fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComputeDevice::Cpu => write!(f, "cpu"),
            ComputeDevice::Cuda => write!(f, "cuda"),
        }
    }
}

/// Get a human-readable name for the current backend
pub fn backend_name() -> &'static str {
    #[cfg(feature = "cuda")]
    {
        "CUDA (GPU)"
    }

    #[cfg(all(not(feature = "cuda"), feature = "ndarray"))]
    {
        "NdArray (CPU)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_matches_features() {
        let device = ComputeDevice::detect();
        assert_eq!(device.is_accelerator(), cfg!(feature = "cuda"));
        assert!(!backend_name().is_empty());
    }
}

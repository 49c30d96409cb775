//! Inference module: preprocessing, the forward pass, and the runner that
//! composes them with provisioning and result assembly.

pub mod predictor;
pub mod preprocess;
pub mod runner;

// Re-export main types for convenience
pub use predictor::{predict, Prediction};
pub use preprocess::{Preprocessor, IMAGENET_MEAN, IMAGENET_STD};
pub use runner::InferenceRunner;

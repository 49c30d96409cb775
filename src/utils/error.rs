//! Error Handling Module
//!
//! Defines the error taxonomy for the inference pipeline.
//! Every stage returns one of these; the runner turns them into a fallback report.

use std::path::PathBuf;

use thiserror::Error;

/// Error raised by one stage of the inference pipeline
#[derive(Error, Debug)]
pub enum InferenceError {
    /// The model artifact could not be made available locally
    #[error("Model not available: {0}")]
    Provisioning(String),

    /// The artifact exists but could not be turned into a classifier
    #[error("Model not available: failed to load '{0}': {1}")]
    ModelLoad(PathBuf, String),

    /// The input payload could not be decoded into a tensor
    #[error("Failed to preprocess image: {0}")]
    Preprocessing(String),

    /// The forward pass or its post-processing failed
    #[error("Prediction failed: {0}")]
    Inference(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error, displayed as the underlying error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl InferenceError {
    /// Name of the pipeline stage this error belongs to
    pub fn stage(&self) -> &'static str {
        match self {
            InferenceError::Provisioning(_) => "provisioning",
            InferenceError::ModelLoad(..) => "load",
            InferenceError::Preprocessing(_) => "preprocessing",
            InferenceError::Inference(_) => "inference",
            InferenceError::Config(_) => "config",
            InferenceError::Io(_) => "io",
        }
    }
}

/// Convenience Result type for the inference pipeline
pub type Result<T> = std::result::Result<T, InferenceError>;

/// Extension trait for tagging foreign errors with a pipeline stage
pub trait ResultExt<T> {
    /// Map the error into a preprocessing failure with context
    fn preprocessing(self, msg: &str) -> Result<T>;

    /// Map the error into an inference failure with context
    fn inference(self, msg: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn preprocessing(self, msg: &str) -> Result<T> {
        self.map_err(|e| InferenceError::Preprocessing(format!("{}: {}", msg, e)))
    }

    fn inference(self, msg: &str) -> Result<T> {
        self.map_err(|e| InferenceError::Inference(format!("{}: {}", msg, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = InferenceError::Provisioning("download failed".to_string());
        assert_eq!(format!("{}", err), "Model not available: download failed");
    }

    #[test]
    fn test_model_load_error() {
        let err = InferenceError::ModelLoad(PathBuf::from("models/x.pth"), "bad record".into());
        let msg = format!("{}", err);
        assert!(msg.starts_with("Model not available"));
        assert!(msg.contains("x.pth"));
        assert_eq!(err.stage(), "load");
    }

    #[test]
    fn test_io_error_is_reported_once() {
        use std::error::Error as _;

        let err = InferenceError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such config",
        ));

        assert_eq!(err.to_string(), "no such config");
        assert!(err.source().is_none());

        let chained = format!("{:#}", anyhow::Error::new(err).context("Failed to read config"));
        assert_eq!(chained, "Failed to read config: no such config");
    }

    #[test]
    fn test_result_ext_tags_stage() {
        let result: std::result::Result<i32, std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "garbage"));

        let err = result.preprocessing("Invalid base64").unwrap_err();
        assert_eq!(err.stage(), "preprocessing");
        assert!(err.to_string().contains("Invalid base64: garbage"));
    }
}

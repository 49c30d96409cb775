//! Model Configuration Module
//!
//! Where the artifact lives, where to fetch it from, and the architecture it encodes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::cnn::LeafClassifierConfig;
use crate::utils::error::{InferenceError, Result};

/// Local artifact location used when nothing else is configured
pub const DEFAULT_MODEL_PATH: &str = "models/cassava_pytorch_model_optimized.pth";

/// Remote artifact location (unauthenticated, unverified)
pub const DEFAULT_MODEL_URL: &str =
    "https://huggingface.co/Gunn01/cassava-disease-model/resolve/main/cassava_pytorch_model_optimized.pth";

/// Overall timeout for the artifact download
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;

/// Configuration for provisioning and loading the classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path of the artifact on local storage
    pub model_path: PathBuf,

    /// URL fetched when the artifact is missing
    pub model_url: String,

    /// Download timeout in seconds (0 disables the timeout)
    pub download_timeout_secs: u64,

    /// Side length the input image is resized to
    pub image_size: u32,

    /// Architecture encoded by the artifact
    pub classifier: LeafClassifierConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            model_url: DEFAULT_MODEL_URL.to_string(),
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            image_size: crate::IMAGE_SIZE as u32,
            classifier: LeafClassifierConfig::new(),
        }
    }
}

impl ModelConfig {
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_model_url(mut self, url: impl Into<String>) -> Self {
        self.model_url = url.into();
        self
    }

    pub fn with_classifier(mut self, classifier: LeafClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }

    /// Download timeout, `None` when disabled
    pub fn download_timeout(&self) -> Option<std::time::Duration> {
        (self.download_timeout_secs > 0)
            .then(|| std::time::Duration::from_secs(self.download_timeout_secs))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model_path.as_os_str().is_empty() {
            return Err(InferenceError::Config("model_path must not be empty".into()));
        }

        if !(self.model_url.starts_with("http://") || self.model_url.starts_with("https://")) {
            return Err(InferenceError::Config(format!(
                "model_url must be an http(s) URL, got '{}'",
                self.model_url
            )));
        }

        if self.image_size == 0 {
            return Err(InferenceError::Config("image_size must be positive".into()));
        }

        if self.classifier.num_classes == 0 {
            return Err(InferenceError::Config("num_classes must be greater than 0".into()));
        }

        if self.classifier.in_channels != 3 {
            return Err(InferenceError::Config("in_channels must be 3 (RGB)".into()));
        }

        let classifier = &self.classifier;
        if classifier.channels.is_empty() || classifier.channels.contains(&0) {
            return Err(InferenceError::Config(format!(
                "channels must be a non-empty list of positive widths, got {:?}",
                classifier.channels
            )));
        }

        if classifier.hidden_size == 0 || classifier.kernel_size == 0 {
            return Err(InferenceError::Config(
                "hidden_size and kernel_size must be positive".into(),
            ));
        }

        if !(0.0..=1.0).contains(&classifier.dropout_rate) {
            return Err(InferenceError::Config(format!(
                "dropout_rate must be within [0, 1], got {}",
                classifier.dropout_rate
            )));
        }

        if classifier.feature_side(self.image_size as usize) == 0 {
            return Err(InferenceError::Config(format!(
                "image_size {} is too small for {} downsampling stages",
                self.image_size,
                classifier.channels.len()
            )));
        }

        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| InferenceError::Config(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from a JSON file; missing keys take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| InferenceError::Config(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ModelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.image_size, 224);
        assert_eq!(config.classifier.num_classes, crate::catalog::NUM_CLASSES);
        assert!(config.model_path.starts_with("models"));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = ModelConfig::default().with_model_url("ftp://example.org/model.pth");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("model_url"));
    }

    #[test]
    fn test_rejects_unusable_architecture() {
        let empty = ModelConfig::default()
            .with_classifier(LeafClassifierConfig::new().with_channels(vec![]));
        assert!(matches!(empty.validate(), Err(InferenceError::Config(_))));

        let bad_dropout = ModelConfig::default()
            .with_classifier(LeafClassifierConfig::new().with_dropout_rate(1.5));
        assert!(bad_dropout.validate().is_err());

        let zero_width = ModelConfig::default()
            .with_classifier(LeafClassifierConfig::new().with_channels(vec![8, 0]));
        assert!(zero_width.validate().is_err());

        let mut too_deep = ModelConfig::default()
            .with_classifier(LeafClassifierConfig::new().with_channels(vec![4; 5]));
        too_deep.image_size = 16;
        let err = too_deep.validate().unwrap_err();
        assert!(err.to_string().contains("too small"));

        too_deep.image_size = 32;
        assert!(too_deep.validate().is_ok());
    }

    #[test]
    fn test_architecture_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "classifier": { "channels": [8, 16], "num_classes": 5, "hidden_size": 32, "kernel_size": 3, "dropout_rate": 0.0, "in_channels": 3 } }"#).unwrap();

        let loaded = ModelConfig::load(&path).unwrap();
        assert_eq!(loaded.classifier.channels, vec![8, 16]);
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_disables() {
        let mut config = ModelConfig::default();
        assert!(config.download_timeout().is_some());
        config.download_timeout_secs = 0;
        assert!(config.download_timeout().is_none());
    }

    #[test]
    fn test_save_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        std::fs::write(&path, r#"{ "model_path": "elsewhere/model.mpk" }"#).unwrap();
        let loaded = ModelConfig::load(&path).unwrap();
        assert_eq!(loaded.model_path, PathBuf::from("elsewhere/model.mpk"));
        assert_eq!(loaded.model_url, DEFAULT_MODEL_URL);

        loaded.save(&path).unwrap();
        let reloaded = ModelConfig::load(&path).unwrap();
        assert_eq!(reloaded.model_path, loaded.model_path);
    }
}

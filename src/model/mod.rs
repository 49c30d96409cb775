//! Model module: architecture, configuration, provisioning and loading
//!
//! - `cnn`: the Burn CNN whose weights the artifact stores
//! - `config`: artifact location, download URL and architecture settings
//! - `provision`: download-if-missing for the artifact
//! - `loader`: turning the artifact into a classifier on a device

pub mod cnn;
pub mod config;
pub mod loader;
pub mod provision;

// Re-export main types for convenience
pub use cnn::{LeafClassifier, LeafClassifierConfig};
pub use config::ModelConfig;
pub use loader::{load_classifier, ArtifactFormat, LoadedClassifier};
pub use provision::{ensure_artifact, ArtifactSource, HttpArtifactSource};

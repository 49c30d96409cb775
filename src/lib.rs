//! # Cassava Inference
//!
//! Single-shot cassava leaf disease classification using the Burn framework.
//!
//! Given a base64-encoded leaf photo, the crate makes sure the trained
//! classifier is on disk (downloading it once if needed), loads it, runs one
//! forward pass and maps the winning class to a static disease record with a
//! confidence-derived severity.
//!
//! ## Modules
//!
//! - `catalog`: the five-class label set, symptom/treatment records, severity tiers
//! - `model`: CNN architecture, configuration, provisioning and loading
//! - `inference`: preprocessing, prediction and the `InferenceRunner`
//! - `report`: the JSON result (success and fallback shapes)
//! - `utils`: error types and logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cassava_inference::backend::{ComputeDevice, InferenceBackend};
//! use cassava_inference::{DiseaseCatalog, InferenceRunner, ModelConfig};
//!
//! let mut runner = InferenceRunner::<InferenceBackend>::new(
//!     ModelConfig::default(),
//!     DiseaseCatalog::cassava(),
//!     ComputeDevice::detect().device(),
//! )?;
//! let report = runner.predict(&image_base64);
//! println!("{}", report.to_json()?);
//! ```

pub mod backend;
pub mod catalog;
pub mod inference;
pub mod model;
pub mod report;
pub mod utils;

// Re-export commonly used items for convenience
pub use catalog::{DiseaseCatalog, DiseaseRecord, Severity, CLASS_NAMES, NUM_CLASSES};
pub use inference::{InferenceRunner, Prediction, Preprocessor};
pub use model::{LeafClassifier, LeafClassifierConfig, ModelConfig};
pub use report::DiagnosisReport;
pub use utils::error::{InferenceError, Result};

/// Side length of the square model input
pub const IMAGE_SIZE: usize = 224;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

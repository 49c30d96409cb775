//! Loading a classifier artifact onto a device
//!
//! `.pth`/`.pt` files are read as PyTorch state dicts through burn-import;
//! everything else is treated as a Burn `CompactRecorder` record.

use std::panic::AssertUnwindSafe;
use std::path::Path;

use burn::module::Module;
use burn::record::{CompactRecorder, FullPrecisionSettings, Recorder};
use burn::tensor::backend::Backend;
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};
use tracing::{debug, info};

use super::cnn::{LeafClassifier, LeafClassifierConfig, LeafClassifierRecord};
use crate::utils::error::{InferenceError, Result};
use crate::utils::logging::panic_message;

/// On-disk encoding of a classifier artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    /// PyTorch state dict (`.pth` / `.pt`)
    PyTorch,
    /// Burn named MessagePack record (`.mpk`)
    Compact,
}

impl ArtifactFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("pth") | Some("pt") => ArtifactFormat::PyTorch,
            _ => ArtifactFormat::Compact,
        }
    }
}

/// A trained classifier bound to the device it was loaded on
#[derive(Debug)]
pub struct LoadedClassifier<B: Backend> {
    pub model: LeafClassifier<B>,
    pub device: B::Device,
}

impl<B: Backend> LoadedClassifier<B> {
    pub fn num_classes(&self) -> usize {
        self.model.num_classes()
    }
}

/// Load the classifier stored at `path` into a freshly built module tree
pub fn load_classifier<B: Backend>(
    path: &Path,
    config: &LeafClassifierConfig,
    device: &B::Device,
) -> Result<LoadedClassifier<B>> {
    if !path.is_file() {
        return Err(InferenceError::ModelLoad(
            path.to_path_buf(),
            "model file not found".to_string(),
        ));
    }

    let format = ArtifactFormat::from_path(path);
    debug!("Loading {:?} artifact from {}", format, path.display());

    let load_error = |msg: String| InferenceError::ModelLoad(path.to_path_buf(), msg);

    // Device allocation and record readers may both panic
    let (loaded, expected) = std::panic::catch_unwind(AssertUnwindSafe(|| {
        let fresh: LeafClassifier<B> = LeafClassifier::new(config, device);
        let expected = fresh.weight_shapes();

        let loaded = match format {
            ArtifactFormat::PyTorch => PyTorchFileRecorder::<FullPrecisionSettings>::default()
                .load::<LeafClassifierRecord<B>>(LoadArgs::new(path.to_path_buf()), device)
                .map(|record| fresh.load_record(record))
                .map_err(|e| format!("{:?}", e)),
            ArtifactFormat::Compact => fresh
                .load_file(path, &CompactRecorder::new(), device)
                .map_err(|e| format!("{:?}", e)),
        };

        loaded.map(|model| (model, expected))
    }))
    .map_err(|payload| load_error(panic_message(payload.as_ref())))?
    .map_err(load_error)?;

    let actual = loaded.weight_shapes();
    if actual != expected {
        return Err(load_error(format!(
            "record does not match the classifier architecture (expected weight shapes {:?}, found {:?})",
            expected, actual
        )));
    }

    info!("Model loaded successfully from {}", path.display());

    Ok(LoadedClassifier {
        model: loaded,
        device: device.clone(),
    })
}

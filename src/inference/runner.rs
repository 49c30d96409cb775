//! InferenceRunner: provision -> load -> preprocess -> predict -> assemble
//!
//! Each stage returns `Result<_, InferenceError>`. `try_*` methods expose the
//! error; `predict` / `analyze_image_bytes` fold any error into a fallback report.

use std::path::PathBuf;

use burn::tensor::backend::Backend;
use tracing::{debug, info, warn};

use super::predictor::{predict, Prediction};
use super::preprocess::Preprocessor;
use crate::catalog::DiseaseCatalog;
use crate::model::{
    ensure_artifact, load_classifier, ArtifactSource, HttpArtifactSource, LoadedClassifier,
    ModelConfig,
};
use crate::report::DiagnosisReport;
use crate::utils::error::{InferenceError, Result};

/// Single-shot inference over one classifier, loaded on first use
pub struct InferenceRunner<B: Backend> {
    config: ModelConfig,
    catalog: DiseaseCatalog,
    device: B::Device,
    preprocessor: Preprocessor,
    source: Option<Box<dyn ArtifactSource>>,
    classifier: Option<LoadedClassifier<B>>,
}

impl<B: Backend> InferenceRunner<B> {
    /// Create a runner; nothing is downloaded or loaded yet
    pub fn new(config: ModelConfig, catalog: DiseaseCatalog, device: B::Device) -> Result<Self> {
        config.validate()?;
        let preprocessor = Preprocessor::new(config.image_size);

        Ok(Self {
            config,
            catalog,
            device,
            preprocessor,
            source: None,
            classifier: None,
        })
    }

    /// Replace the HTTP fetcher used when the artifact is missing
    pub fn with_source(mut self, source: Box<dyn ArtifactSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn catalog(&self) -> &DiseaseCatalog {
        &self.catalog
    }

    pub fn is_loaded(&self) -> bool {
        self.classifier.is_some()
    }

    /// Make sure the artifact exists locally, downloading it if needed
    pub fn provision(&mut self) -> Result<PathBuf> {
        if self.config.model_path.is_file() {
            debug!("Model artifact already present at {}", self.config.model_path.display());
            return Ok(self.config.model_path.clone());
        }

        if self.source.is_none() {
            self.source = Some(Box::new(HttpArtifactSource::new(
                self.config.download_timeout(),
            )?));
        }

        match self.source.as_deref() {
            Some(source) => ensure_artifact(&self.config.model_path, &self.config.model_url, source),
            None => Err(InferenceError::Provisioning("no artifact source".into())),
        }
    }

    /// Provision and load the classifier on first call; later calls reuse it
    pub fn ensure_loaded(&mut self) -> Result<&LoadedClassifier<B>> {
        let classifier = match self.classifier.take() {
            Some(classifier) => classifier,
            None => {
                let path = self.provision()?;
                load_classifier::<B>(&path, &self.config.classifier, &self.device)?
            }
        };

        let classifier: &LoadedClassifier<B> = self.classifier.insert(classifier);
        Ok(classifier)
    }

    /// Load, then preprocess and run a base64 payload
    pub fn try_predict(&mut self, payload: &str) -> Result<DiagnosisReport> {
        let preprocessor = self.preprocessor;
        let classifier = self.ensure_loaded()?;

        debug!("Preprocessing {} byte payload", payload.len());
        let chw = preprocessor.preprocess(payload)?;
        let input = preprocessor.to_tensor::<B>(chw, &classifier.device)?;
        let prediction = predict(classifier, input)?;

        Ok(self.assemble(&prediction))
    }

    /// Load, then preprocess and run raw image bytes
    pub fn try_analyze_image_bytes(&mut self, bytes: &[u8]) -> Result<DiagnosisReport> {
        let preprocessor = self.preprocessor;
        let classifier = self.ensure_loaded()?;

        debug!("Preprocessing {} image bytes", bytes.len());
        let chw = preprocessor.preprocess_bytes(bytes)?;
        let input = preprocessor.to_tensor::<B>(chw, &classifier.device)?;
        let prediction = predict(classifier, input)?;

        Ok(self.assemble(&prediction))
    }

    /// Never fails: any stage error becomes a fallback report
    pub fn predict(&mut self, payload: &str) -> DiagnosisReport {
        let result = self.try_predict(payload);
        self.finish(result)
    }

    /// Never fails: any stage error becomes a fallback report
    pub fn analyze_image_bytes(&mut self, bytes: &[u8]) -> DiagnosisReport {
        let result = self.try_analyze_image_bytes(bytes);
        self.finish(result)
    }

    fn assemble(&self, prediction: &Prediction) -> DiagnosisReport {
        let report = DiagnosisReport::from_prediction(
            &self.catalog,
            prediction.class_index,
            prediction.confidence(),
        );
        info!(
            disease = %report.disease_name,
            severity = %report.severity,
            confidence = report.confidence,
            time_ms = prediction.inference_time_ms(),
            "Prediction complete"
        );
        report
    }

    fn finish(&self, result: Result<DiagnosisReport>) -> DiagnosisReport {
        match result {
            Ok(report) => report,
            Err(err) => {
                warn!(stage = err.stage(), "{}", err);
                DiagnosisReport::from(&err)
            }
        }
    }
}

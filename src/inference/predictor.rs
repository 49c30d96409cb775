//! Forward pass and probability post-processing

use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use burn::tensor::{backend::Backend, Tensor};
use tracing::debug;

use crate::model::LoadedClassifier;
use crate::utils::error::{InferenceError, Result, ResultExt};
use crate::utils::logging::panic_message;

/// Outcome of one forward pass
#[derive(Debug, Clone)]
pub struct Prediction {
    /// Index of the most probable class
    pub class_index: usize,

    /// Probability of that class (0-1)
    pub probability: f32,

    /// Full probability distribution over the model outputs
    pub probabilities: Vec<f32>,

    /// Wall time of the forward pass
    pub inference_time: Duration,
}

impl Prediction {
    /// Pick the argmax of a probability distribution
    pub fn from_probabilities(probabilities: Vec<f32>, inference_time: Duration) -> Result<Self> {
        if probabilities.is_empty() {
            return Err(InferenceError::Inference("model produced no scores".into()));
        }

        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(InferenceError::Inference("model produced non-finite scores".into()));
        }

        let (class_index, &probability) = probabilities
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .ok_or_else(|| InferenceError::Inference("model produced no scores".into()))?;

        Ok(Self {
            class_index,
            probability,
            probabilities,
            inference_time,
        })
    }

    /// Confidence in percent (0-100)
    pub fn confidence(&self) -> f64 {
        self.probability as f64 * 100.0
    }

    pub fn inference_time_ms(&self) -> f64 {
        self.inference_time.as_secs_f64() * 1000.0
    }
}

/// Run one forward pass on a `[1, 3, H, W]` tensor and softmax the logits
pub fn predict<B: Backend>(classifier: &LoadedClassifier<B>, input: Tensor<B, 4>) -> Result<Prediction> {
    let [batch, channels, _, _] = input.dims();
    if batch != 1 || channels != 3 {
        return Err(InferenceError::Inference(format!(
            "expected input of shape [1, 3, H, W], got {:?}",
            input.dims()
        )));
    }

    let start = Instant::now();

    // Tensor backends report shape errors by panicking
    let probs = std::panic::catch_unwind(AssertUnwindSafe(|| classifier.model.forward_softmax(input)))
    .map_err(|payload| InferenceError::Inference(panic_message(payload.as_ref())))?;

    let probabilities: Vec<f32> = probs
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| format!("{:?}", e))
        .inference("failed to read probabilities")?;

    let inference_time = start.elapsed();
    debug!("Forward pass took {:.2} ms", inference_time.as_secs_f64() * 1000.0);

    Prediction::from_probabilities(probabilities, inference_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InferenceBackend as TestBackend;
    use crate::model::LeafClassifierConfig;

    fn random_classifier(num_classes: usize) -> LoadedClassifier<TestBackend> {
        let device = Default::default();
        let config = LeafClassifierConfig::new()
            .with_channels(vec![4, 8, 16, 32])
            .with_num_classes(num_classes);
        LoadedClassifier {
            model: config.init(&device),
            device,
        }
    }

    #[test]
    fn test_argmax_picks_highest_probability() {
        let prediction =
            Prediction::from_probabilities(vec![0.05, 0.1, 0.7, 0.1, 0.05], Duration::ZERO).unwrap();
        assert_eq!(prediction.class_index, 2);
        assert!((prediction.confidence() - 70.0).abs() < 1e-4);
    }

    #[test]
    fn test_empty_and_nan_scores_are_errors() {
        assert!(Prediction::from_probabilities(vec![], Duration::ZERO).is_err());
        assert!(Prediction::from_probabilities(vec![0.5, f32::NAN], Duration::ZERO).is_err());
    }

    #[test]
    fn test_predict_returns_distribution() {
        let classifier = random_classifier(5);
        let input = Tensor::<TestBackend, 4>::ones([1, 3, 32, 32], &classifier.device);

        let prediction = predict(&classifier, input).unwrap();

        assert_eq!(prediction.probabilities.len(), 5);
        let sum: f32 = prediction.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        assert!(prediction.class_index < 5);
        assert!(prediction.confidence() > 0.0 && prediction.confidence() <= 100.0);
    }

    #[test]
    fn test_output_may_be_wider_than_label_set() {
        let classifier = random_classifier(8);
        let input = Tensor::<TestBackend, 4>::zeros([1, 3, 32, 32], &classifier.device);

        let prediction = predict(&classifier, input).unwrap();
        assert_eq!(prediction.probabilities.len(), 8);
    }

    #[test]
    fn test_batch_input_is_rejected() {
        let classifier = random_classifier(5);
        let input = Tensor::<TestBackend, 4>::zeros([2, 3, 32, 32], &classifier.device);

        let err = predict(&classifier, input).unwrap_err();
        assert!(err.to_string().starts_with("Prediction failed"));
    }
}

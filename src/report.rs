//! Result assembly: the JSON object printed for every invocation

use serde::{Deserialize, Serialize};

use crate::catalog::{DiseaseCatalog, Severity};
use crate::utils::error::InferenceError;
use crate::utils::round2;

/// Disease name carried by stage-failure fallbacks
pub const FALLBACK_DISEASE: &str = "Analysis Pending";

/// Disease name carried by the outermost fatal fallback
pub const SYSTEM_ERROR_DISEASE: &str = "System Error";

const FALLBACK_TREATMENT: &str = "Ensure image quality is good and shows clear leaf details. Consider consulting local agricultural extension services.";
const FATAL_SYMPTOMS: &str = "System error occurred during analysis.";
const FATAL_TREATMENT: &str = "Please try again or contact technical support.";

/// Flat diagnosis object emitted on stdout
///
/// `is_pytorch_result` is false exactly when the report is a fallback; fallbacks
/// always carry `confidence == 0` and a non-empty `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisReport {
    pub disease_name: String,
    pub severity: Severity,
    pub confidence: f64,
    pub symptoms: String,
    pub treatment: String,
    pub is_pytorch_result: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DiagnosisReport {
    /// Map a predicted index and its confidence (0-100) to a full diagnosis
    pub fn from_prediction(catalog: &DiseaseCatalog, class_index: usize, confidence: f64) -> Self {
        let label = catalog.label_for(class_index);
        let record = catalog.record_for(label);

        Self {
            disease_name: label.to_string(),
            severity: Severity::determine(label, confidence),
            confidence: round2(confidence),
            symptoms: record.symptoms.to_string(),
            treatment: record.treatment.to_string(),
            is_pytorch_result: true,
            error: None,
        }
    }

    /// Degraded report for a failed pipeline stage
    pub fn fallback(error: impl Into<String>) -> Self {
        let error = non_empty(error.into());
        Self {
            disease_name: FALLBACK_DISEASE.to_string(),
            severity: Severity::Unknown,
            confidence: 0.0,
            symptoms: format!(
                "Model analysis failed: {}. Please try again or consult with agricultural experts.",
                error
            ),
            treatment: FALLBACK_TREATMENT.to_string(),
            is_pytorch_result: false,
            error: Some(error),
        }
    }

    /// Report for a failure caught at the outermost boundary
    pub fn fatal(message: impl std::fmt::Display) -> Self {
        Self {
            disease_name: SYSTEM_ERROR_DISEASE.to_string(),
            severity: Severity::Unknown,
            confidence: 0.0,
            symptoms: FATAL_SYMPTOMS.to_string(),
            treatment: FATAL_TREATMENT.to_string(),
            is_pytorch_result: false,
            error: Some(non_empty(format!("Fatal error: {}", message))),
        }
    }

    pub fn is_fallback(&self) -> bool {
        !self.is_pytorch_result
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<&InferenceError> for DiagnosisReport {
    fn from(err: &InferenceError) -> Self {
        DiagnosisReport::fallback(err.to_string())
    }
}

fn non_empty(message: String) -> String {
    if message.trim().is_empty() {
        "Unknown error".to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{GENERIC_RECORD, NUM_CLASSES, UNKNOWN_DISEASE};

    #[test]
    fn test_success_report_uses_table_entry() {
        let catalog = DiseaseCatalog::cassava();
        let report = DiagnosisReport::from_prediction(&catalog, 3, 87.654_3);

        assert_eq!(report.disease_name, "Cassava Mosaic Disease (CMD)");
        assert_eq!(report.severity, Severity::High);
        assert_eq!(report.confidence, 87.65);
        assert_eq!(report.symptoms, catalog.record_for("Cassava Mosaic Disease (CMD)").symptoms);
        assert!(report.is_pytorch_result);
        assert!(report.error.is_none());
    }

    #[test]
    fn test_healthy_report_has_no_severity() {
        let catalog = DiseaseCatalog::cassava();
        let report = DiagnosisReport::from_prediction(&catalog, 4, 99.0);
        assert_eq!(report.severity, Severity::None);
    }

    #[test]
    fn test_index_equal_to_label_count_is_unknown() {
        let catalog = DiseaseCatalog::cassava();
        let report = DiagnosisReport::from_prediction(&catalog, NUM_CLASSES, 72.5);

        assert_eq!(report.disease_name, UNKNOWN_DISEASE);
        assert_eq!(report.symptoms, GENERIC_RECORD.symptoms);
        assert_eq!(report.treatment, GENERIC_RECORD.treatment);
        assert_eq!(report.severity, Severity::Medium);
        assert!(report.is_pytorch_result);
    }

    #[test]
    fn test_fallback_invariants() {
        for report in [
            DiagnosisReport::fallback("Model not available: offline"),
            DiagnosisReport::fallback(""),
            DiagnosisReport::fatal("boom"),
        ] {
            assert!(report.is_fallback());
            assert_eq!(report.confidence, 0.0);
            assert!(!report.error.as_deref().unwrap_or_default().is_empty());
            assert_eq!(report.severity, Severity::Unknown);
        }
    }

    #[test]
    fn test_fallback_mentions_error_in_symptoms() {
        let report = DiagnosisReport::fallback("Failed to preprocess image: invalid base64");
        assert_eq!(report.disease_name, FALLBACK_DISEASE);
        assert!(report.symptoms.starts_with("Model analysis failed: Failed to preprocess image"));
    }

    #[test]
    fn test_json_field_names() {
        let catalog = DiseaseCatalog::cassava();
        let ok = DiagnosisReport::from_prediction(&catalog, 0, 55.0);
        let value: serde_json::Value = serde_json::from_str(&ok.to_json().unwrap()).unwrap();

        assert_eq!(value["diseaseName"], "Cassava Bacterial Blight (CBB)");
        assert_eq!(value["severity"], "Low");
        assert_eq!(value["confidence"], 55.0);
        assert_eq!(value["isPytorchResult"], true);
        assert!(value.get("error").is_none());

        let failed = DiagnosisReport::fallback("Model not available: offline");
        let value: serde_json::Value = serde_json::from_str(&failed.to_json().unwrap()).unwrap();
        assert_eq!(value["isPytorchResult"], false);
        assert_eq!(value["error"], "Model not available: offline");
        assert_eq!(value["confidence"], 0.0);
    }

    #[test]
    fn test_fatal_shape() {
        let report = DiagnosisReport::fatal("index out of bounds");
        assert_eq!(report.disease_name, SYSTEM_ERROR_DISEASE);
        assert_eq!(report.error.as_deref(), Some("Fatal error: index out of bounds"));
    }
}

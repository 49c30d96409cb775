//! Disease catalog: the fixed label set and its static knowledge table
//!
//! Index position in [`CLASS_NAMES`] is the contract linking a model output
//! index to a label. Any index past the end maps to [`UNKNOWN_DISEASE`].

pub mod records;
pub mod severity;

pub use records::{DiseaseRecord, GENERIC_RECORD};
pub use severity::Severity;

use std::collections::HashMap;

/// Number of classes in the cassava label set
pub const NUM_CLASSES: usize = 5;

/// Cassava disease classes, in model output order
pub const CLASS_NAMES: [&str; NUM_CLASSES] = [
    "Cassava Bacterial Blight (CBB)",
    "Cassava Brown Streak Disease (CBSD)",
    "Cassava Green Mottle (CGM)",
    "Cassava Mosaic Disease (CMD)",
    "Healthy",
];

/// Label used when the predicted index falls outside the label set
pub const UNKNOWN_DISEASE: &str = "Unknown Disease";

/// Get the class name for a given label index
pub fn class_name(label: usize) -> Option<&'static str> {
    CLASS_NAMES.get(label).copied()
}

/// Get the label index for a given class name
pub fn class_index(name: &str) -> Option<usize> {
    CLASS_NAMES.iter().position(|&n| n == name)
}

/// Check if a label name represents a healthy plant
pub fn is_healthy(name: &str) -> bool {
    name.contains("Healthy")
}

/// Immutable label list plus keyed knowledge table, built once per process
#[derive(Debug, Clone)]
pub struct DiseaseCatalog {
    labels: Vec<&'static str>,
    records: HashMap<&'static str, DiseaseRecord>,
}

impl DiseaseCatalog {
    /// The cassava catalog: five labels and their records
    pub fn cassava() -> Self {
        let records = records::CASSAVA_RECORDS
            .iter()
            .map(|(name, record)| (*name, *record))
            .collect();

        Self {
            labels: CLASS_NAMES.to_vec(),
            records,
        }
    }

    /// Number of known labels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[&'static str] {
        &self.labels
    }

    /// Map a model output index to a label, or the unknown sentinel
    pub fn label_for(&self, index: usize) -> &'static str {
        self.labels.get(index).copied().unwrap_or(UNKNOWN_DISEASE)
    }

    /// Look up a record by exact label, falling back to the generic record
    pub fn record_for(&self, label: &str) -> DiseaseRecord {
        self.records.get(label).copied().unwrap_or(GENERIC_RECORD)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|&l| l == label)
    }
}

impl Default for DiseaseCatalog {
    fn default() -> Self {
        Self::cassava()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_name() {
        assert_eq!(class_name(0), Some("Cassava Bacterial Blight (CBB)"));
        assert_eq!(class_name(4), Some("Healthy"));
        assert_eq!(class_name(5), None);
    }

    #[test]
    fn test_class_index() {
        assert_eq!(class_index("Cassava Mosaic Disease (CMD)"), Some(3));
        assert_eq!(class_index("Tomato___healthy"), None);
    }

    #[test]
    fn test_every_label_has_a_record() {
        let catalog = DiseaseCatalog::cassava();
        assert_eq!(catalog.len(), NUM_CLASSES);
        for label in catalog.labels() {
            assert_ne!(catalog.record_for(label), GENERIC_RECORD, "{label}");
        }
    }

    #[test]
    fn test_out_of_range_index_is_unknown() {
        let catalog = DiseaseCatalog::cassava();
        assert_eq!(catalog.label_for(NUM_CLASSES), UNKNOWN_DISEASE);
        assert_eq!(catalog.label_for(usize::MAX), UNKNOWN_DISEASE);
        assert_eq!(catalog.record_for(UNKNOWN_DISEASE), GENERIC_RECORD);
    }

    #[test]
    fn test_record_lookup_is_exact() {
        let catalog = DiseaseCatalog::cassava();
        assert_eq!(catalog.record_for("healthy"), GENERIC_RECORD);
        assert!(is_healthy("Healthy"));
        assert!(!is_healthy(UNKNOWN_DISEASE));
    }
}

//! Static symptom and treatment text for each cassava class

use serde::Serialize;

/// Symptoms and treatment advice for one label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiseaseRecord {
    pub symptoms: &'static str,
    pub treatment: &'static str,
}

/// Record returned for labels that have no entry of their own
pub const GENERIC_RECORD: DiseaseRecord = DiseaseRecord {
    symptoms: "Disease symptoms detected but specific identification may require further analysis.",
    treatment: "Consult with local agricultural extension services for specific treatment recommendations.",
};

pub(crate) const CASSAVA_RECORDS: [(&str, DiseaseRecord); 5] = [
    (
        "Cassava Bacterial Blight (CBB)",
        DiseaseRecord {
            symptoms: "Angular, water-soaked lesions on leaves that turn brown and may have a yellow halo. Wilting and blackening of stems.",
            treatment: "Remove and destroy infected plants. Use copper-based fungicides. Ensure proper spacing for air circulation. Plant resistant varieties.",
        },
    ),
    (
        "Cassava Brown Streak Disease (CBSD)",
        DiseaseRecord {
            symptoms: "Brown streaking on stems, yellowing and withering of leaves, brown necrotic streaks in storage roots.",
            treatment: "Use virus-free planting material. Control whitefly vectors with insecticides. Remove infected plants immediately. Plant resistant varieties.",
        },
    ),
    (
        "Cassava Green Mottle (CGM)",
        DiseaseRecord {
            symptoms: "Green and yellow mottling on leaves, mild chlorosis, reduced plant vigor.",
            treatment: "Use certified virus-free planting material. Control aphid vectors. Remove infected plants. Maintain good field hygiene.",
        },
    ),
    (
        "Cassava Mosaic Disease (CMD)",
        DiseaseRecord {
            symptoms: "Yellow and green mosaic patterns on leaves, leaf distortion, stunted growth, reduced yield.",
            treatment: "Plant resistant varieties. Use virus-free planting material. Control whitefly vectors. Remove infected plants promptly.",
        },
    ),
    (
        "Healthy",
        DiseaseRecord {
            symptoms: "No disease symptoms detected. Plant appears healthy with normal leaf color and growth.",
            treatment: "Maintain good agricultural practices. Continue regular monitoring for early disease detection. Ensure proper nutrition and watering.",
        },
    ),
];

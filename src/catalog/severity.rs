//! Confidence-bucketed severity tiers

use serde::{Deserialize, Serialize};

use super::is_healthy;

/// Lower bound (inclusive) of the `High` tier, in percent
pub const HIGH_THRESHOLD: f64 = 80.0;

/// Lower bound (inclusive) of the `Medium` tier, in percent
pub const MEDIUM_THRESHOLD: f64 = 60.0;

/// Qualitative severity attached to a diagnosis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
    /// Only used by fallback reports
    Unknown,
}

impl Severity {
    /// Derive the tier from a label and its confidence (0-100)
    ///
    /// Healthy labels are always `None`; otherwise tiers are closed on the lower end.
    pub fn determine(label: &str, confidence: f64) -> Self {
        if is_healthy(label) {
            Severity::None
        } else if confidence >= HIGH_THRESHOLD {
            Severity::High
        } else if confidence >= MEDIUM_THRESHOLD {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "None",
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

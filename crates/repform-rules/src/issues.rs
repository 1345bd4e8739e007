//! Form issue records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Issue severity, ordered from least to most serious
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad grouping used to pick recommendations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueCategory {
    Depth,
    Asymmetry,
    Posture,
    RangeOfMotion,
    Stability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueType {
    #[serde(rename = "Insufficient Squat Depth")]
    InsufficientSquatDepth,
    #[serde(rename = "Knee Asymmetry/Valgus")]
    KneeAsymmetryValgus,
    #[serde(rename = "Excessive Forward Lean")]
    ExcessiveForwardLean,
    #[serde(rename = "Asymmetric Movement Pattern")]
    AsymmetricMovementPattern,
    #[serde(rename = "Limited Range of Motion")]
    LimitedRangeOfMotion,
    #[serde(rename = "Core Stability Issue")]
    CoreStabilityIssue,
}

impl IssueType {
    pub fn label(&self) -> &'static str {
        match self {
            IssueType::InsufficientSquatDepth => "Insufficient Squat Depth",
            IssueType::KneeAsymmetryValgus => "Knee Asymmetry/Valgus",
            IssueType::ExcessiveForwardLean => "Excessive Forward Lean",
            IssueType::AsymmetricMovementPattern => "Asymmetric Movement Pattern",
            IssueType::LimitedRangeOfMotion => "Limited Range of Motion",
            IssueType::CoreStabilityIssue => "Core Stability Issue",
        }
    }

    pub fn category(&self) -> IssueCategory {
        match self {
            IssueType::InsufficientSquatDepth => IssueCategory::Depth,
            IssueType::KneeAsymmetryValgus | IssueType::AsymmetricMovementPattern => {
                IssueCategory::Asymmetry
            }
            IssueType::ExcessiveForwardLean => IssueCategory::Posture,
            IssueType::LimitedRangeOfMotion => IssueCategory::RangeOfMotion,
            IssueType::CoreStabilityIssue => IssueCategory::Stability,
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A detected deviation with an estimated frame span and a coaching cue.
///
/// `frame_start <= frame_end <= total_frames` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormIssue {
    pub issue_type: IssueType,
    pub severity: Severity,
    pub frame_start: usize,
    pub frame_end: usize,
    pub coaching_cue: String,
    #[serde(rename = "confidence_score")]
    pub confidence: f64,
}

/// Stable sort with the most severe issues first
pub fn sort_by_severity(issues: &mut [FormIssue]) {
    issues.sort_by(|a, b| b.severity.cmp(&a.severity));
}

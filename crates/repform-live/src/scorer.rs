//! Per-frame scorers used by the live loop.

use repform_core::{AggregateMetrics, AngleLayout, Bilateral, Sagittal};
use repform_rules::{assess_posture, PostureRanges, ScoringPolicy, Standards, CUE_SEPARATOR};

/// Score of a single smoothed frame on the 0-100 scale
#[derive(Debug, Clone, PartialEq)]
pub struct FrameAssessment {
    pub score: f64,
    pub cues: Vec<String>,
}

impl FrameAssessment {
    /// Cues joined for display and speech, or `fallback` when there are none
    pub fn message(&self, fallback: &str) -> String {
        if self.cues.is_empty() {
            fallback.to_string()
        } else {
            self.cues.join(CUE_SEPARATOR)
        }
    }
}

/// Scores a single-frame aggregate of the scorer's angle layout
pub trait FrameScorer {
    type Layout: AngleLayout;

    fn assess(&self, metrics: &AggregateMetrics) -> FrameAssessment;

    /// Shown and spoken when no cue applies
    fn good_form_cue(&self) -> &str {
        "Good form"
    }
}

/// Side-view posture ranges (hip, knee, back, ankle)
#[derive(Debug, Clone, Default)]
pub struct RangeScorer {
    ranges: PostureRanges,
}

impl RangeScorer {
    pub fn new(ranges: PostureRanges) -> Self {
        Self { ranges }
    }
}

impl FrameScorer for RangeScorer {
    type Layout = Sagittal;

    fn assess(&self, metrics: &AggregateMetrics) -> FrameAssessment {
        let assessment = assess_posture(metrics, &self.ranges);
        FrameAssessment {
            score: assessment.score,
            cues: assessment.cues,
        }
    }

    fn good_form_cue(&self) -> &str {
        &self.ranges.good_form_cue
    }
}

/// Bilateral rule policy, rescaled from 0-10 to 0-100
#[derive(Debug, Clone)]
pub struct PolicyScorer {
    policy: ScoringPolicy,
    exercise: String,
    standards: Standards,
}

impl PolicyScorer {
    pub fn new(exercise: impl Into<String>, standards: Standards) -> Self {
        let exercise = exercise.into();
        Self {
            policy: ScoringPolicy::for_exercise(&exercise),
            exercise,
            standards,
        }
    }

    pub fn policy(&self) -> ScoringPolicy {
        self.policy
    }
}

impl FrameScorer for PolicyScorer {
    type Layout = Bilateral;

    fn assess(&self, metrics: &AggregateMetrics) -> FrameAssessment {
        let result = self.policy.score(metrics, &self.standards);
        let cues = self
            .policy
            .identify_issues(metrics, &self.exercise, 1, &self.standards)
            .into_iter()
            .map(|issue| issue.issue_type.label().to_string())
            .collect();
        FrameAssessment {
            score: result.overall_score * 10.0,
            cues,
        }
    }
}

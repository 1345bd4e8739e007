//! Per-frame posture check against ideal joint ranges.
//!
//! Used by the live trainer: each joint inside its range scores 100, a joint
//! outside it scores linearly lower (toward 0° below the range, toward 180°
//! above it). The weighted mean is the 0-100 posture score.

use repform_core::AggregateMetrics;
use serde::Serialize;

use crate::standards::{PostureRanges, RangeRule};

const STRAIGHT: f64 = 180.0;

/// Separator used when several cues are reported together
pub const CUE_SEPARATOR: &str = " | ";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostureAssessment {
    /// Weighted score in [0, 100]
    pub score: f64,
    /// Corrective cues in rule order; empty when every joint is in range
    pub cues: Vec<String>,
}

impl PostureAssessment {
    pub fn is_good_form(&self) -> bool {
        self.cues.is_empty()
    }

    /// All cues joined, or `good_form_cue` when there are none
    pub fn message(&self, good_form_cue: &str) -> String {
        if self.cues.is_empty() {
            good_form_cue.to_string()
        } else {
            self.cues.join(CUE_SEPARATOR)
        }
    }
}

/// Score one joint reading against its rule, returning the cue if out of range
fn rate(rule: &RangeRule, value: f64) -> (f64, Option<&str>) {
    if value < rule.min {
        return (value / rule.min * 100.0, Some(rule.below_cue.as_str()));
    }
    if let Some(above) = &rule.above_cue {
        if value > rule.max && rule.max < STRAIGHT {
            return ((STRAIGHT - value) / (STRAIGHT - rule.max) * 100.0, Some(above.as_str()));
        }
    }
    (100.0, None)
}

/// Assess the average angle of every joint covered by `ranges`.
///
/// Joints missing from `metrics` are skipped and do not count toward the
/// weight total. Returns a zero score when no rule applies.
pub fn assess_posture(metrics: &AggregateMetrics, ranges: &PostureRanges) -> PostureAssessment {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    let mut cues = Vec::new();

    for rule in &ranges.rules {
        let Some(value) = metrics.avg(rule.joint) else {
            continue;
        };
        let (score, cue) = rate(rule, value);
        weighted += score.clamp(0.0, 100.0) * rule.weight;
        total_weight += rule.weight;
        if let Some(cue) = cue {
            cues.push(cue.to_string());
        }
    }

    let score = if total_weight > 0.0 {
        weighted / total_weight
    } else {
        0.0
    };

    PostureAssessment { score, cues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repform_core::{AngleVector, Sagittal};

    fn frame(hip: f64, knee: f64, back: f64, ankle: f64) -> AggregateMetrics {
        let v: AngleVector<Sagittal> = AngleVector::from_values([hip, knee, back, ankle]).unwrap();
        AggregateMetrics::from_single(&v)
    }

    #[test]
    fn test_ideal_posture() {
        let ranges = PostureRanges::default();
        let a = assess_posture(&frame(100.0, 100.0, 170.0, 90.0), &ranges);
        assert!((a.score - 100.0).abs() < 1e-9);
        assert!(a.is_good_form());
        assert_eq!(a.message(&ranges.good_form_cue), "Good form");
    }

    #[test]
    fn test_out_of_range_joints() {
        let ranges = PostureRanges::default();
        // hip 68 -> 80, knee 160 -> 50, back 120 -> 80, ankle in range
        let a = assess_posture(&frame(68.0, 160.0, 120.0, 90.0), &ranges);
        let expected = 0.35 * 80.0 + 0.35 * 50.0 + 0.2 * 80.0 + 0.1 * 100.0;
        assert!((a.score - expected).abs() < 1e-9);
        assert_eq!(
            a.message(&ranges.good_form_cue),
            "Hips too high | Need to bend knees more | Straighten your back"
        );
    }

    #[test]
    fn test_back_has_no_upper_bound() {
        let ranges = PostureRanges::default();
        let a = assess_posture(&frame(100.0, 100.0, 180.0, 90.0), &ranges);
        assert!(a.is_good_form());
    }

    #[test]
    fn test_missing_joints_are_skipped() {
        let ranges = PostureRanges::default();
        let v: AngleVector = AngleVector::from_values([90.0, 90.0, 150.0, 150.0]).unwrap();
        let a = assess_posture(&AggregateMetrics::from_single(&v), &ranges);
        assert_eq!(a.score, 0.0);
        assert!(a.cues.is_empty());
    }
}

//! Session report content: metric comparisons, strengths and recommendations.

use repform_core::{AggregateMetrics, SessionId};
use serde::{Deserialize, Serialize};

use crate::issues::{FormIssue, IssueCategory, Severity};
use crate::policy::ScoringPolicy;
use crate::signals::FormSignals;
use crate::standards::Standards;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStatus {
    Good,
    Warning,
    Error,
}

impl MetricStatus {
    /// Lower is better: good below `good`, warning below `warning`
    fn below(value: f64, good: f64, warning: f64) -> Self {
        if value < good {
            MetricStatus::Good
        } else if value < warning {
            MetricStatus::Warning
        } else {
            MetricStatus::Error
        }
    }

    /// Higher is better: good above `good`, warning above `warning`
    fn above(value: f64, good: f64, warning: f64) -> Self {
        if value > good {
            MetricStatus::Good
        } else if value > warning {
            MetricStatus::Warning
        } else {
            MetricStatus::Error
        }
    }
}

/// A measured value next to its target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub metric_name: String,
    pub actual_value: String,
    pub target_value: String,
    pub status: MetricStatus,
}

impl MetricComparison {
    fn new(name: &str, actual: String, target: String, status: MetricStatus) -> Self {
        Self {
            metric_name: name.to_string(),
            actual_value: actual,
            target_value: target,
            status,
        }
    }
}

/// 1 is critical, 3 is optional
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Priority {
    Critical = 1,
    Important = 2,
    Optional = 3,
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        p as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::Critical),
            2 => Ok(Priority::Important),
            3 => Ok(Priority::Optional),
            other => Err(format!("priority must be 1, 2 or 3, got {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommendation_text: String,
    pub priority: Priority,
}

impl Recommendation {
    fn new(text: impl Into<String>, priority: Priority) -> Self {
        Self {
            recommendation_text: text.into(),
            priority,
        }
    }
}

pub fn compare_metrics(
    policy: ScoringPolicy,
    metrics: &AggregateMetrics,
    standards: &Standards,
) -> Vec<MetricComparison> {
    let s = FormSignals::from_metrics(metrics);
    match policy {
        ScoringPolicy::Squat => {
            let t = &standards.squat;
            vec![
                MetricComparison::new(
                    "Knee Flexion (Depth)",
                    format!("{:.0}°", s.min_knee),
                    format!("< {:.0}°", t.optimal_depth_angle),
                    MetricStatus::below(s.min_knee, t.good_depth_max_angle, t.insufficient_depth_threshold),
                ),
                MetricComparison::new(
                    "Knee Symmetry",
                    format!("{:.0}° difference", s.knee_asymmetry),
                    format!("< {:.0}°", t.max_knee_asymmetry_good),
                    MetricStatus::below(
                        s.knee_asymmetry,
                        t.max_knee_asymmetry_good,
                        t.max_knee_asymmetry_error,
                    ),
                ),
                MetricComparison::new(
                    "Hip Angle (Torso Position)",
                    format!("{:.0}°", s.avg_hip),
                    format!("> {:.0}°", t.min_hip_angle_target),
                    MetricStatus::above(s.avg_hip, t.hip_angle_good, t.hip_angle_warning),
                ),
            ]
        }
        ScoringPolicy::Generic => {
            let t = &standards.generic;
            vec![
                MetricComparison::new(
                    "Movement Symmetry",
                    format!("{:.0}° difference", s.max_asymmetry()),
                    format!("< {:.0}°", t.max_knee_asymmetry_good),
                    MetricStatus::below(s.max_asymmetry(), t.max_knee_asymmetry_good, t.asymmetry_error),
                ),
                MetricComparison::new(
                    "Range of Motion",
                    format!("{:.0}°", s.knee_range),
                    format!("> {:.0}°", t.limited_rom_threshold),
                    MetricStatus::above(s.knee_range, t.good_rom_threshold, t.warning_rom_threshold),
                ),
                MetricComparison::new(
                    "Core Stability",
                    format!("{:.0}° variance", s.hip_spread),
                    format!("< {:.0}°", t.good_stability_max),
                    MetricStatus::below(s.hip_spread, t.good_stability_max, t.error_stability_max),
                ),
            ]
        }
    }
}

/// Positive feedback; never empty
pub fn strengths(
    policy: ScoringPolicy,
    metrics: &AggregateMetrics,
    issues: &[FormIssue],
    exercise: &str,
    standards: &Standards,
) -> Vec<String> {
    let s = FormSignals::from_metrics(metrics);
    let mut out = Vec::new();

    match policy {
        ScoringPolicy::Squat => {
            let t = &standards.squat;
            if s.min_knee < t.good_depth_max_angle {
                out.push("Excellent squat depth! You're achieving proper range of motion.".to_string());
            }
            if s.knee_asymmetry < t.max_knee_asymmetry_good {
                out.push("Great knee alignment and symmetry throughout the movement.".to_string());
            }
            if issues.is_empty() {
                out.push("Outstanding form! Keep up the excellent technique.".to_string());
            }
            if out.is_empty() {
                out.push("Good effort! Focus on the cues below to improve your form.".to_string());
            }
        }
        ScoringPolicy::Generic => {
            let t = &standards.generic;
            if s.knee_asymmetry < t.max_knee_asymmetry_good && s.hip_asymmetry < t.max_hip_asymmetry_good {
                out.push(format!(
                    "Excellent bilateral symmetry! Both sides of your body are moving evenly during {}.",
                    exercise
                ));
            }
            if s.knee_range > t.excellent_rom_threshold {
                out.push(format!(
                    "Great range of motion! You're using the full movement range for {}.",
                    exercise
                ));
            }
            if s.left_hip_spread < t.excellent_stability_max {
                out.push("Solid core stability! Your hips remain stable throughout the movement.".to_string());
            }
            if !issues.is_empty() && issues.iter().all(|i| i.severity != Severity::Severe) {
                out.push("No severe form issues detected. You're on the right track!".to_string());
            }
            if issues.is_empty() {
                out.push(format!("Outstanding {} form! Keep up the excellent technique.", exercise));
            }
            if out.is_empty() {
                out.push(format!(
                    "Good effort on your {}! Focus on the cues below to refine your technique.",
                    exercise
                ));
            }
        }
    }

    out
}

pub fn recommendations(
    policy: ScoringPolicy,
    issues: &[FormIssue],
    overall_score: f64,
    exercise: &str,
    standards: &Standards,
) -> Vec<Recommendation> {
    let has = |category: IssueCategory| issues.iter().any(|i| i.issue_type.category() == category);
    let bands = &standards.bands;
    let mut out = Vec::new();

    match policy {
        ScoringPolicy::Squat => {
            if overall_score < bands.good_min {
                out.push(Recommendation::new(
                    "Practice bodyweight squats with a focus on proper form before adding weight. \
                     Use a mirror or video feedback to monitor your technique.",
                    Priority::Critical,
                ));
            }
            if has(IssueCategory::Depth) {
                out.push(Recommendation::new(
                    "Work on hip mobility and ankle flexibility to improve squat depth. \
                     Consider exercises like goblet squats to practice the movement pattern.",
                    Priority::Important,
                ));
            }
            if has(IssueCategory::Asymmetry) {
                out.push(Recommendation::new(
                    "Strengthen your glutes and hip abductors with exercises like clamshells, \
                     lateral band walks, and hip thrusts to prevent knee caving.",
                    Priority::Important,
                ));
            }
            if overall_score >= bands.excellent_min {
                out.push(Recommendation::new(
                    "Your form is solid! Consider gradually increasing load or adding variations like pause squats.",
                    Priority::Optional,
                ));
            }
        }
        ScoringPolicy::Generic => {
            if overall_score < bands.good_min {
                out.push(Recommendation::new(
                    format!(
                        "Focus on mastering the basics of {} with reduced weight or bodyweight. \
                         Use video feedback or a mirror to monitor your form. Consider working with a trainer \
                         for personalized guidance on this movement pattern.",
                        exercise
                    ),
                    Priority::Critical,
                ));
            }
            if has(IssueCategory::Asymmetry) {
                out.push(Recommendation::new(
                    "Address the left-right imbalance with unilateral exercises (single-arm/leg variations). \
                     This builds balanced strength and reduces injury risk. Include mobility work for \
                     your weaker side.",
                    Priority::Important,
                ));
            }
            if has(IssueCategory::RangeOfMotion) {
                out.push(Recommendation::new(
                    format!(
                        "Improve your mobility with dynamic stretching and foam rolling before {}. \
                         Full range of motion is crucial for muscle activation and joint health. \
                         Practice the movement slowly without weight to build better patterns.",
                        exercise
                    ),
                    Priority::Important,
                ));
            }
            if has(IssueCategory::Stability) {
                out.push(Recommendation::new(
                    format!(
                        "Strengthen your core with planks, dead bugs, and anti-rotation exercises. \
                         A stable core prevents compensatory movements and transfers more power to the \
                         target muscles. Brace your core before each rep of {}.",
                        exercise
                    ),
                    Priority::Important,
                ));
            }
            if overall_score >= bands.excellent_min {
                out.push(Recommendation::new(
                    format!(
                        "Your {} form is solid! Consider progressive overload: gradually increase \
                         weight, reps, or time under tension. You can also try advanced variations to continue \
                         building strength and skill.",
                        exercise
                    ),
                    Priority::Optional,
                ));
            }
            if out.is_empty() {
                out.push(Recommendation::new(
                    format!(
                        "Keep practicing {} with consistent form. Record yourself regularly \
                         to track improvements and catch issues early.",
                        exercise
                    ),
                    Priority::Optional,
                ));
            }
        }
    }

    out
}

/// Persisted result of one analyzed session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: SessionId,
    pub exercise: String,
    pub policy: ScoringPolicy,
    pub overall_score: f64,
    /// Frames with a usable pose; issue frame spans index into these
    pub total_frames: usize,
    /// Frames rejected by the extractor
    pub skipped_frames: usize,
    pub issues: Vec<FormIssue>,
    pub metrics: Vec<MetricComparison>,
    pub strengths: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub analyzed_at: chrono::DateTime<chrono::Utc>,
}

impl SessionReport {
    pub fn has_severe_issues(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Severe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::IssueType;
    use repform_core::{AngleStats, Joint};

    fn metrics(joints: [(f64, f64, f64); 4]) -> AggregateMetrics {
        let ids = [Joint::LeftKnee, Joint::RightKnee, Joint::LeftHip, Joint::RightHip];
        AggregateMetrics::from_stats(
            30,
            ids.into_iter().zip(joints).map(|(joint, (min, avg, max))| {
                (
                    joint,
                    AngleStats {
                        min,
                        max,
                        avg,
                        frame_count: 30,
                    },
                )
            }),
        )
    }

    fn issue(issue_type: IssueType, severity: Severity) -> FormIssue {
        FormIssue {
            issue_type,
            severity,
            frame_start: 0,
            frame_end: 1,
            coaching_cue: String::new(),
            confidence: 0.8,
        }
    }

    #[test]
    fn test_squat_metric_statuses() {
        let standards = Standards::default();
        let m = metrics([
            (100.0, 120.0, 170.0),
            (102.0, 135.0, 170.0),
            (140.0, 150.0, 170.0),
            (140.0, 150.0, 170.0),
        ]);
        let comparisons = compare_metrics(ScoringPolicy::Squat, &m, &standards);
        let statuses: Vec<_> = comparisons.iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![MetricStatus::Warning, MetricStatus::Warning, MetricStatus::Warning]
        );
        assert_eq!(comparisons[0].actual_value, "100°");
        assert_eq!(comparisons[1].actual_value, "15° difference");
        assert_eq!(comparisons[2].target_value, "> 150°");
    }

    #[test]
    fn test_generic_metric_statuses() {
        let standards = Standards::default();
        let m = metrics([
            (60.0, 100.0, 150.0),
            (60.0, 104.0, 150.0),
            (140.0, 150.0, 170.0),
            (135.0, 152.0, 168.0),
        ]);
        let comparisons = compare_metrics(ScoringPolicy::Generic, &m, &standards);
        assert_eq!(comparisons[0].status, MetricStatus::Good);
        assert_eq!(comparisons[1].status, MetricStatus::Good);
        // spread 170 - 135 = 35
        assert_eq!(comparisons[2].status, MetricStatus::Error);
    }

    #[test]
    fn test_strengths_never_empty() {
        let standards = Standards::default();
        let poor = metrics([
            (150.0, 120.0, 160.0),
            (150.0, 160.0, 160.0),
            (60.0, 100.0, 170.0),
            (60.0, 120.0, 170.0),
        ]);
        let severe = vec![issue(IssueType::KneeAsymmetryValgus, Severity::Severe)];

        let squat = strengths(ScoringPolicy::Squat, &poor, &severe, "squat", &standards);
        assert_eq!(squat, vec!["Good effort! Focus on the cues below to improve your form."]);

        let generic = strengths(ScoringPolicy::Generic, &poor, &severe, "row", &standards);
        assert_eq!(generic.len(), 1);
        assert!(generic[0].starts_with("Good effort on your row!"));
    }

    #[test]
    fn test_generic_strengths_without_severe_issues() {
        let standards = Standards::default();
        let m = metrics([
            (60.0, 100.0, 150.0),
            (60.0, 104.0, 150.0),
            (150.0, 155.0, 160.0),
            (150.0, 156.0, 160.0),
        ]);
        let minor = vec![issue(IssueType::CoreStabilityIssue, Severity::Minor)];
        let out = strengths(ScoringPolicy::Generic, &m, &minor, "lunge", &standards);
        assert_eq!(out.len(), 4);
        assert!(out[0].contains("bilateral symmetry"));
        assert!(out[3].starts_with("No severe form issues"));
    }

    #[test]
    fn test_recommendation_priorities() {
        let standards = Standards::default();
        let issues = vec![
            issue(IssueType::InsufficientSquatDepth, Severity::Severe),
            issue(IssueType::KneeAsymmetryValgus, Severity::Moderate),
        ];
        let recs = recommendations(ScoringPolicy::Squat, &issues, 5.0, "squat", &standards);
        let priorities: Vec<_> = recs.iter().map(|r| r.priority).collect();
        assert_eq!(
            priorities,
            vec![Priority::Critical, Priority::Important, Priority::Important]
        );

        let recs = recommendations(ScoringPolicy::Squat, &[], 9.0, "squat", &standards);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].priority, Priority::Optional);

        // Squat policy has no fallback in the middle band
        assert!(recommendations(ScoringPolicy::Squat, &[], 7.0, "squat", &standards).is_empty());
        let recs = recommendations(ScoringPolicy::Generic, &[], 7.0, "row", &standards);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].recommendation_text.starts_with("Keep practicing row"));
    }

    #[test]
    fn test_priority_serializes_as_number() {
        let rec = Recommendation::new("x", Priority::Important);
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["priority"], 2);
        let back: Recommendation = serde_json::from_value(json).unwrap();
        assert_eq!(back, rec);
        assert!(serde_json::from_str::<Priority>("7").is_err());
    }
}

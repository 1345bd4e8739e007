//! Rule-based scoring and issue identification.
//!
//! A [`ScoringPolicy`] is chosen once per analysis from the exercise name.
//! Both policies start from [`PERFECT_SCORE`], subtract bounded penalties,
//! floor at zero and round to one decimal. Scoring and issue identification
//! are pure functions of the aggregate metrics and a read-only [`Standards`].

use repform_core::AggregateMetrics;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::issues::{sort_by_severity, FormIssue, IssueType, Severity};
use crate::signals::FormSignals;
use crate::standards::{FrameWindow, Standards, PERFECT_SCORE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringPolicy {
    Squat,
    Generic,
}

impl ScoringPolicy {
    /// "squat" and "squats" (any case) select the squat policy
    pub fn for_exercise(exercise: &str) -> Self {
        match exercise.trim().to_lowercase().as_str() {
            "squat" | "squats" => ScoringPolicy::Squat,
            _ => ScoringPolicy::Generic,
        }
    }

    pub fn score(&self, metrics: &AggregateMetrics, standards: &Standards) -> ScoreResult {
        let signals = FormSignals::from_metrics(metrics);
        let penalties = match self {
            ScoringPolicy::Squat => squat_penalties(&signals, standards),
            ScoringPolicy::Generic => generic_penalties(&signals, standards),
        };
        let result = ScoreResult::from_penalties(penalties);
        debug!(
            policy = ?self,
            score = result.overall_score,
            penalties = result.penalties.len(),
            "Scored session"
        );
        result
    }

    /// Issues sorted most severe first; empty when every dimension is within tolerance
    pub fn identify_issues(
        &self,
        metrics: &AggregateMetrics,
        exercise: &str,
        total_frames: usize,
        standards: &Standards,
    ) -> Vec<FormIssue> {
        let signals = FormSignals::from_metrics(metrics);
        let mut issues = match self {
            ScoringPolicy::Squat => squat_issues(&signals, total_frames, standards),
            ScoringPolicy::Generic => generic_issues(&signals, exercise, total_frames, standards),
        };
        sort_by_severity(&mut issues);
        debug!(policy = ?self, count = issues.len(), "Identified issues");
        issues
    }
}

/// One deduction applied by a rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Penalty {
    pub rule: &'static str,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    /// 0.0 to 10.0, one decimal
    pub overall_score: f64,
    pub penalties: Vec<Penalty>,
}

impl ScoreResult {
    fn from_penalties(penalties: Vec<Penalty>) -> Self {
        let total: f64 = penalties.iter().map(|p| p.amount).sum();
        let overall_score = round_one_decimal((PERFECT_SCORE - total).max(0.0));
        Self {
            overall_score,
            penalties,
        }
    }
}

/// Score `metrics` with the policy selected by `exercise`
pub fn score(metrics: &AggregateMetrics, exercise: &str, standards: &Standards) -> ScoreResult {
    ScoringPolicy::for_exercise(exercise).score(metrics, standards)
}

/// Identify issues with the policy selected by `exercise`
pub fn identify_issues(
    metrics: &AggregateMetrics,
    exercise: &str,
    total_frames: usize,
    standards: &Standards,
) -> Vec<FormIssue> {
    ScoringPolicy::for_exercise(exercise).identify_issues(metrics, exercise, total_frames, standards)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn squat_penalties(s: &FormSignals, standards: &Standards) -> Vec<Penalty> {
    let t = &standards.squat;
    let mut penalties = Vec::new();

    if s.min_knee > t.insufficient_depth_threshold {
        penalties.push(Penalty {
            rule: "insufficient_depth",
            amount: ((s.min_knee - t.optimal_depth_angle) / t.depth_penalty_scale)
                .min(t.depth_penalty_max),
        });
    } else if s.min_knee < t.excessive_depth_min {
        penalties.push(Penalty {
            rule: "excessive_depth",
            amount: ((t.excessive_depth_min - s.min_knee) / t.excessive_depth_penalty_scale)
                .min(t.excessive_depth_penalty_max),
        });
    }

    if s.knee_asymmetry > t.max_knee_asymmetry_warning {
        penalties.push(Penalty {
            rule: "knee_asymmetry",
            amount: (s.knee_asymmetry / t.max_knee_asymmetry_warning * t.asymmetry_penalty_factor)
                .min(t.asymmetry_penalty_max),
        });
    }

    if s.avg_hip < t.min_hip_angle_target {
        penalties.push(Penalty {
            rule: "forward_lean",
            amount: ((t.min_hip_angle_target - s.avg_hip) / t.forward_lean_penalty_scale)
                .min(t.forward_lean_penalty_max),
        });
    }

    penalties
}

fn generic_penalties(s: &FormSignals, standards: &Standards) -> Vec<Penalty> {
    let t = &standards.generic;
    let mut penalties = Vec::new();

    if s.knee_asymmetry > t.max_knee_asymmetry_warning {
        penalties.push(Penalty {
            rule: "knee_asymmetry",
            amount: ((s.knee_asymmetry - t.max_knee_asymmetry_warning) / 10.0
                * t.knee_asymmetry_penalty_rate)
                .min(t.asymmetry_penalty_max),
        });
    }

    if s.hip_asymmetry > t.max_hip_asymmetry_warning {
        penalties.push(Penalty {
            rule: "hip_asymmetry",
            amount: ((s.hip_asymmetry - t.max_hip_asymmetry_warning) / 10.0
                * t.hip_asymmetry_penalty_rate)
                .min(t.hip_asymmetry_penalty_max),
        });
    }

    if s.knee_range < t.poor_rom_threshold {
        penalties.push(Penalty {
            rule: "poor_range_of_motion",
            amount: t.poor_rom_penalty,
        });
    } else if s.knee_range < t.limited_rom_threshold {
        penalties.push(Penalty {
            rule: "limited_range_of_motion",
            amount: t.limited_rom_penalty,
        });
    }

    if s.hip_spread > t.warning_stability_max {
        penalties.push(Penalty {
            rule: "core_stability",
            amount: ((s.hip_spread - t.warning_stability_max) / t.stability_penalty_scale)
                .min(t.stability_penalty_max),
        });
    }

    penalties
}

fn issue(
    issue_type: IssueType,
    severity: Severity,
    window: FrameWindow,
    total_frames: usize,
    coaching_cue: String,
    confidence: f64,
) -> FormIssue {
    let (frame_start, frame_end) = window.span(total_frames);
    FormIssue {
        issue_type,
        severity,
        frame_start,
        frame_end,
        coaching_cue,
        confidence,
    }
}

fn squat_issues(s: &FormSignals, total_frames: usize, standards: &Standards) -> Vec<FormIssue> {
    let t = &standards.squat;
    let frames = &standards.frames;
    let mut issues = Vec::new();

    if s.min_knee > t.good_depth_max_angle {
        let severity = if s.min_knee > t.severe_depth_threshold {
            Severity::Severe
        } else {
            Severity::Moderate
        };
        issues.push(issue(
            IssueType::InsufficientSquatDepth,
            severity,
            frames.squat_depth,
            total_frames,
            format!(
                "Lower your hips until your thighs are parallel to the floor \
                 (target knee angle < {:.0}°). Currently reaching {:.0}°. \
                 Focus on pushing your hips back and down, not just your knees forward.",
                t.optimal_depth_angle, s.min_knee
            ),
            t.depth_confidence,
        ));
    }

    if s.knee_asymmetry > t.max_knee_asymmetry_warning {
        let severity = if s.knee_asymmetry > t.max_knee_asymmetry_severe {
            Severity::Severe
        } else {
            Severity::Moderate
        };
        issues.push(issue(
            IssueType::KneeAsymmetryValgus,
            severity,
            frames.squat_asymmetry,
            total_frames,
            format!(
                "Keep both knees aligned. You have {:.0}° difference between legs. \
                 Push your knees outward to track over your toes. Focus on engaging your glutes.",
                s.knee_asymmetry
            ),
            t.asymmetry_confidence,
        ));
    }

    if s.avg_hip < t.hip_angle_warning {
        let severity = if s.avg_hip < t.hip_angle_severe {
            Severity::Severe
        } else {
            Severity::Moderate
        };
        issues.push(issue(
            IssueType::ExcessiveForwardLean,
            severity,
            frames.forward_lean,
            total_frames,
            format!(
                "Maintain a more upright torso. Your hip angle is {:.0}° (target > {:.0}°). \
                 Keep your chest up, core braced, and focus on sitting back into the squat.",
                s.avg_hip, t.min_hip_angle_target
            ),
            t.forward_lean_confidence,
        ));
    }

    issues
}

fn generic_issues(
    s: &FormSignals,
    exercise: &str,
    total_frames: usize,
    standards: &Standards,
) -> Vec<FormIssue> {
    let t = &standards.generic;
    let frames = &standards.frames;
    let mut issues = Vec::new();

    let asymmetry = s.max_asymmetry();
    if asymmetry > t.max_knee_asymmetry_warning {
        let severity = if asymmetry > t.max_knee_asymmetry_severe {
            Severity::Severe
        } else {
            Severity::Moderate
        };
        issues.push(issue(
            IssueType::AsymmetricMovementPattern,
            severity,
            frames.generic_asymmetry,
            total_frames,
            format!(
                "Your left and right sides show {:.0}° difference in movement. \
                 This asymmetry can lead to muscle imbalances and injury over time. \
                 Focus on moving both sides equally. Consider reducing weight to perfect symmetry, \
                 and strengthen your weaker side with unilateral exercises.",
                asymmetry
            ),
            t.asymmetry_confidence,
        ));
    }

    if s.knee_range < t.limited_rom_threshold {
        let severity = if s.knee_range < t.poor_rom_threshold {
            Severity::Moderate
        } else {
            Severity::Minor
        };
        issues.push(issue(
            IssueType::LimitedRangeOfMotion,
            severity,
            frames.range_of_motion,
            total_frames,
            format!(
                "Increase your range of motion for {}. Full-range movements activate more \
                 muscle fibers and improve flexibility. Your current range is {:.0}°. \
                 Focus on controlled movement through the complete range. \
                 If mobility is limiting you, work on flexibility before adding weight.",
                exercise, s.knee_range
            ),
            t.rom_confidence,
        ));
    }

    if s.hip_spread > t.warning_stability_max {
        let severity = if s.hip_spread > t.severe_stability_max {
            Severity::Moderate
        } else {
            Severity::Minor
        };
        issues.push(issue(
            IssueType::CoreStabilityIssue,
            severity,
            frames.core_stability,
            total_frames,
            format!(
                "Keep your core braced and hips stable throughout {}. \
                 Your hip angle varies by {:.0}° during the movement. \
                 Engage your core muscles before each rep, maintain a neutral spine, \
                 and avoid using momentum or body English to move the weight.",
                exercise, s.hip_spread
            ),
            t.stability_confidence,
        ));
    }

    issues
}

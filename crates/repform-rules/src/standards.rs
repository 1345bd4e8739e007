//! Biomechanical threshold tables.
//!
//! All bounds, penalty weights and confidence constants used by the scoring
//! policies and the issue identifier live here. A [`Standards`] value is
//! built once at startup (defaults or configuration), validated, and then
//! shared read-only by every analysis.

use repform_core::{Error, Joint, Result};
use serde::{Deserialize, Serialize};

/// Current layout version of the threshold tables
pub const STANDARDS_VERSION: u32 = 1;

/// Base score every policy subtracts penalties from
pub const PERFECT_SCORE: f64 = 10.0;

/// Squat-specific bounds (knee flexion, symmetry, torso position)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquatStandards {
    /// Knee angle under which depth counts as good (thighs parallel)
    pub good_depth_max_angle: f64,
    pub optimal_depth_angle: f64,
    pub insufficient_depth_threshold: f64,
    pub severe_depth_threshold: f64,
    /// Knee angle under which the squat is deep enough to strain the knee
    pub excessive_depth_min: f64,

    pub max_knee_asymmetry_good: f64,
    pub max_knee_asymmetry_warning: f64,
    pub max_knee_asymmetry_severe: f64,
    pub max_knee_asymmetry_error: f64,

    pub min_hip_angle_target: f64,
    pub hip_angle_good: f64,
    pub hip_angle_warning: f64,
    pub hip_angle_severe: f64,

    /// Degrees of excess depth angle per penalty point
    pub depth_penalty_scale: f64,
    pub depth_penalty_max: f64,
    pub excessive_depth_penalty_scale: f64,
    pub excessive_depth_penalty_max: f64,
    /// Penalty per multiple of the asymmetry warning threshold
    pub asymmetry_penalty_factor: f64,
    pub asymmetry_penalty_max: f64,
    pub forward_lean_penalty_scale: f64,
    pub forward_lean_penalty_max: f64,

    pub depth_confidence: f64,
    pub asymmetry_confidence: f64,
    pub forward_lean_confidence: f64,
}

impl Default for SquatStandards {
    fn default() -> Self {
        Self {
            good_depth_max_angle: 95.0,
            optimal_depth_angle: 90.0,
            insufficient_depth_threshold: 110.0,
            severe_depth_threshold: 120.0,
            excessive_depth_min: 70.0,
            max_knee_asymmetry_good: 10.0,
            max_knee_asymmetry_warning: 15.0,
            max_knee_asymmetry_severe: 25.0,
            max_knee_asymmetry_error: 20.0,
            min_hip_angle_target: 150.0,
            hip_angle_good: 155.0,
            hip_angle_warning: 145.0,
            hip_angle_severe: 135.0,
            depth_penalty_scale: 20.0,
            depth_penalty_max: 3.0,
            excessive_depth_penalty_scale: 10.0,
            excessive_depth_penalty_max: 1.5,
            asymmetry_penalty_factor: 1.5,
            asymmetry_penalty_max: 2.0,
            forward_lean_penalty_scale: 20.0,
            forward_lean_penalty_max: 2.0,
            depth_confidence: 0.85,
            asymmetry_confidence: 0.75,
            forward_lean_confidence: 0.70,
        }
    }
}

/// Exercise-agnostic bounds: symmetry, range of motion, core stability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericStandards {
    pub max_knee_asymmetry_good: f64,
    pub max_knee_asymmetry_warning: f64,
    pub max_knee_asymmetry_severe: f64,
    pub max_hip_asymmetry_good: f64,
    pub max_hip_asymmetry_warning: f64,
    /// Combined asymmetry at which the symmetry metric turns red
    pub asymmetry_error: f64,

    pub excellent_rom_threshold: f64,
    pub good_rom_threshold: f64,
    /// Range under which a limited-ROM issue is raised
    pub limited_rom_threshold: f64,
    pub warning_rom_threshold: f64,
    pub poor_rom_threshold: f64,

    pub excellent_stability_max: f64,
    pub good_stability_max: f64,
    pub warning_stability_max: f64,
    pub error_stability_max: f64,
    pub severe_stability_max: f64,

    /// Penalty points per 10° of knee asymmetry beyond the warning bound
    pub knee_asymmetry_penalty_rate: f64,
    pub asymmetry_penalty_max: f64,
    pub hip_asymmetry_penalty_rate: f64,
    pub hip_asymmetry_penalty_max: f64,
    pub poor_rom_penalty: f64,
    pub limited_rom_penalty: f64,
    pub stability_penalty_scale: f64,
    pub stability_penalty_max: f64,

    pub asymmetry_confidence: f64,
    pub rom_confidence: f64,
    pub stability_confidence: f64,
}

impl Default for GenericStandards {
    fn default() -> Self {
        Self {
            max_knee_asymmetry_good: 10.0,
            max_knee_asymmetry_warning: 15.0,
            max_knee_asymmetry_severe: 25.0,
            max_hip_asymmetry_good: 8.0,
            max_hip_asymmetry_warning: 10.0,
            asymmetry_error: 20.0,
            excellent_rom_threshold: 60.0,
            good_rom_threshold: 50.0,
            limited_rom_threshold: 40.0,
            warning_rom_threshold: 30.0,
            poor_rom_threshold: 20.0,
            excellent_stability_max: 15.0,
            good_stability_max: 20.0,
            warning_stability_max: 25.0,
            error_stability_max: 30.0,
            severe_stability_max: 35.0,
            knee_asymmetry_penalty_rate: 2.0,
            asymmetry_penalty_max: 2.5,
            hip_asymmetry_penalty_rate: 1.5,
            hip_asymmetry_penalty_max: 2.0,
            poor_rom_penalty: 1.5,
            limited_rom_penalty: 0.5,
            stability_penalty_scale: 20.0,
            stability_penalty_max: 1.5,
            asymmetry_confidence: 0.80,
            rom_confidence: 0.75,
            stability_confidence: 0.70,
        }
    }
}

/// Fraction of a session assigned to an issue, `start..=end` in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameWindow {
    pub start: f64,
    pub end: f64,
}

impl FrameWindow {
    pub const FULL: FrameWindow = FrameWindow::new(0.0, 1.0);

    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Frame indices covered in a session of `total_frames` frames.
    ///
    /// Always satisfies `0 <= start <= end <= total_frames`; the end index is
    /// additionally capped at the last frame.
    pub fn span(&self, total_frames: usize) -> (usize, usize) {
        let n = total_frames as f64;
        let last = total_frames.saturating_sub(1);
        let end = ((self.end * n).floor().max(0.0) as usize).min(last);
        let start = ((self.start * n).floor().max(0.0) as usize).min(end);
        (start, end)
    }

    fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.start) && (0.0..=1.0).contains(&self.end) && self.start <= self.end
    }
}

/// Coarse timing assigned to each issue category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameWindows {
    pub squat_depth: FrameWindow,
    pub squat_asymmetry: FrameWindow,
    pub forward_lean: FrameWindow,
    pub generic_asymmetry: FrameWindow,
    pub range_of_motion: FrameWindow,
    pub core_stability: FrameWindow,
}

impl Default for FrameWindows {
    fn default() -> Self {
        Self {
            squat_depth: FrameWindow::new(0.2, 0.8),
            squat_asymmetry: FrameWindow::new(0.25, 0.75),
            forward_lean: FrameWindow::new(0.1, 0.9),
            generic_asymmetry: FrameWindow::new(0.2, 0.8),
            range_of_motion: FrameWindow::FULL,
            core_stability: FrameWindow::new(0.25, 0.75),
        }
    }
}

/// Ideal range for one joint in the live posture check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeRule {
    pub joint: Joint,
    pub min: f64,
    pub max: f64,
    pub weight: f64,
    /// Cue spoken when the angle is below `min`
    pub below_cue: String,
    /// Cue spoken when the angle is above `max`; `None` disables the upper check
    pub above_cue: Option<String>,
}

impl RangeRule {
    fn new(joint: Joint, min: f64, max: f64, weight: f64, below: &str, above: Option<&str>) -> Self {
        Self {
            joint,
            min,
            max,
            weight,
            below_cue: below.to_string(),
            above_cue: above.map(str::to_string),
        }
    }
}

/// Per-frame posture ranges (sagittal preset)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostureRanges {
    pub rules: Vec<RangeRule>,
    pub good_form_cue: String,
}

impl Default for PostureRanges {
    fn default() -> Self {
        Self {
            rules: vec![
                RangeRule::new(Joint::Hip, 85.0, 130.0, 0.35, "Hips too high", Some("Hips too low")),
                RangeRule::new(
                    Joint::Knee,
                    70.0,
                    140.0,
                    0.35,
                    "Knees too bent",
                    Some("Need to bend knees more"),
                ),
                RangeRule::new(Joint::Back, 150.0, 180.0, 0.2, "Straighten your back", None),
                RangeRule::new(
                    Joint::Ankle,
                    70.0,
                    110.0,
                    0.1,
                    "Ankles too bent",
                    Some("Need more ankle flexion"),
                ),
            ],
            good_form_cue: "Good form".to_string(),
        }
    }
}

/// Score interpretation bands on the 0-10 scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreBands {
    pub excellent_min: f64,
    pub good_min: f64,
}

impl Default for ScoreBands {
    fn default() -> Self {
        Self {
            excellent_min: 8.0,
            good_min: 6.0,
        }
    }
}

/// Complete, versioned threshold configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Standards {
    pub version: u32,
    pub squat: SquatStandards,
    pub generic: GenericStandards,
    pub frames: FrameWindows,
    pub posture: PostureRanges,
    pub bands: ScoreBands,
}

impl Default for Standards {
    fn default() -> Self {
        Self {
            version: STANDARDS_VERSION,
            squat: SquatStandards::default(),
            generic: GenericStandards::default(),
            frames: FrameWindows::default(),
            posture: PostureRanges::default(),
            bands: ScoreBands::default(),
        }
    }
}

impl Standards {
    /// Reject tables whose thresholds contradict each other
    pub fn validate(&self) -> Result<()> {
        if self.version != STANDARDS_VERSION {
            return Err(invalid(format!(
                "unsupported standards version {} (expected {})",
                self.version, STANDARDS_VERSION
            )));
        }

        let s = &self.squat;
        ensure(
            s.severe_depth_threshold >= s.good_depth_max_angle,
            "squat.severe_depth_threshold must not be below good_depth_max_angle",
        )?;
        ensure(
            s.excessive_depth_min < s.insufficient_depth_threshold,
            "squat.excessive_depth_min must be below insufficient_depth_threshold",
        )?;
        ensure(
            s.max_knee_asymmetry_severe >= s.max_knee_asymmetry_warning,
            "squat.max_knee_asymmetry_severe must not be below the warning bound",
        )?;
        ensure(
            s.hip_angle_severe <= s.hip_angle_warning,
            "squat.hip_angle_severe must not exceed hip_angle_warning",
        )?;
        ensure(
            s.depth_penalty_scale > 0.0
                && s.excessive_depth_penalty_scale > 0.0
                && s.forward_lean_penalty_scale > 0.0
                && s.max_knee_asymmetry_warning > 0.0,
            "squat penalty scales must be positive",
        )?;

        let g = &self.generic;
        ensure(
            g.max_knee_asymmetry_severe >= g.max_knee_asymmetry_warning,
            "generic.max_knee_asymmetry_severe must not be below the warning bound",
        )?;
        ensure(
            g.poor_rom_threshold <= g.limited_rom_threshold,
            "generic.poor_rom_threshold must not exceed limited_rom_threshold",
        )?;
        ensure(
            g.severe_stability_max >= g.warning_stability_max,
            "generic.severe_stability_max must not be below warning_stability_max",
        )?;
        ensure(
            g.stability_penalty_scale > 0.0,
            "generic.stability_penalty_scale must be positive",
        )?;

        let confidences = [
            s.depth_confidence,
            s.asymmetry_confidence,
            s.forward_lean_confidence,
            g.asymmetry_confidence,
            g.rom_confidence,
            g.stability_confidence,
        ];
        ensure(
            confidences.iter().all(|c| (0.0..=1.0).contains(c)),
            "confidence constants must lie in [0, 1]",
        )?;

        let f = &self.frames;
        let windows = [
            f.squat_depth,
            f.squat_asymmetry,
            f.forward_lean,
            f.generic_asymmetry,
            f.range_of_motion,
            f.core_stability,
        ];
        ensure(
            windows.iter().all(FrameWindow::is_valid),
            "frame windows must satisfy 0 <= start <= end <= 1",
        )?;

        for rule in &self.posture.rules {
            ensure(
                rule.min > 0.0 && rule.min <= rule.max && rule.max <= 180.0 && rule.weight >= 0.0,
                &format!("posture range for {} is inconsistent", rule.joint),
            )?;
        }

        Ok(())
    }
}

fn ensure(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(invalid(message.to_string()))
    }
}

fn invalid(message: String) -> Error {
    Error::Config(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        Standards::default().validate().unwrap();
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut standards = Standards::default();
        standards.squat.severe_depth_threshold = 80.0;
        assert!(standards.validate().is_err());

        let mut standards = Standards::default();
        standards.frames.core_stability = FrameWindow::new(0.8, 0.2);
        assert!(standards.validate().is_err());

        let mut standards = Standards::default();
        standards.generic.rom_confidence = 1.2;
        assert!(standards.validate().is_err());
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let standards = Standards {
            version: 99,
            ..Default::default()
        };
        assert!(standards.validate().is_err());
    }

    #[test]
    fn test_frame_window_span() {
        assert_eq!(FrameWindow::new(0.2, 0.8).span(100), (20, 80));
        assert_eq!(FrameWindow::new(0.25, 0.75).span(30), (7, 22));
        assert_eq!(FrameWindow::FULL.span(30), (0, 29));
        assert_eq!(FrameWindow::FULL.span(0), (0, 0));
        assert_eq!(FrameWindow::new(0.2, 0.8).span(1), (0, 0));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{"squat": {"insufficient_depth_threshold": 115.0}}"#;
        let standards: Standards = serde_json::from_str(json).unwrap();
        assert_eq!(standards.squat.insufficient_depth_threshold, 115.0);
        assert_eq!(standards.squat.severe_depth_threshold, 120.0);
        assert_eq!(standards.version, STANDARDS_VERSION);
        assert_eq!(standards.posture.rules.len(), 4);
    }
}

//! Scalar form signals derived from aggregate joint statistics.
//!
//! Every rule reads its inputs from a [`FormSignals`] instead of the raw
//! metrics so that missing joints resolve to the same neutral values
//! everywhere: a missing min/avg/max reads as 180° (straight joint), except
//! for the lower bounds of range-style spreads, which read as 0°.

use repform_core::{AggregateMetrics, Joint};
use serde::{Deserialize, Serialize};

const STRAIGHT: f64 = 180.0;
const FLOOR: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormSignals {
    /// Deepest knee flexion reached by either leg
    pub min_knee: f64,
    /// |left knee avg - right knee avg|
    pub knee_asymmetry: f64,
    /// |left hip avg - right hip avg|
    pub hip_asymmetry: f64,
    /// Mean of both hip averages (torso position)
    pub avg_hip: f64,
    /// Left knee max - min
    pub knee_range: f64,
    /// Widest hip excursion across both sides
    pub hip_spread: f64,
    /// Left hip max - min
    pub left_hip_spread: f64,
}

impl FormSignals {
    pub fn from_metrics(metrics: &AggregateMetrics) -> Self {
        let min = |joint, default| metrics.min(joint).unwrap_or(default);
        let max = |joint| metrics.max(joint).unwrap_or(STRAIGHT);
        let avg = |joint| metrics.avg(joint).unwrap_or(STRAIGHT);

        let min_knee = min(Joint::LeftKnee, STRAIGHT).min(min(Joint::RightKnee, STRAIGHT));
        let knee_asymmetry = (avg(Joint::LeftKnee) - avg(Joint::RightKnee)).abs();
        let hip_asymmetry = (avg(Joint::LeftHip) - avg(Joint::RightHip)).abs();
        let avg_hip = (avg(Joint::LeftHip) + avg(Joint::RightHip)) / 2.0;
        let knee_range = (max(Joint::LeftKnee) - min(Joint::LeftKnee, FLOOR)).abs();
        let hip_spread = max(Joint::LeftHip).max(max(Joint::RightHip))
            - min(Joint::LeftHip, FLOOR).min(min(Joint::RightHip, FLOOR));
        let left_hip_spread = (max(Joint::LeftHip) - min(Joint::LeftHip, FLOOR)).abs();

        Self {
            min_knee,
            knee_asymmetry,
            hip_asymmetry,
            avg_hip,
            knee_range,
            hip_spread,
            left_hip_spread,
        }
    }

    /// Larger of the knee and hip asymmetries
    pub fn max_asymmetry(&self) -> f64 {
        self.knee_asymmetry.max(self.hip_asymmetry)
    }
}

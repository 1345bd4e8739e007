//! Synthetic side-view skeletons with prescribed joint angles.
//!
//! Used for replay demos, benchmarks and tests where no pose model is
//! available. Coordinates follow the image convention (y grows downward).

use nalgebra::Vector2;

use crate::types::{BodyLandmark, Landmark, LandmarkSet};

const THIGH: f64 = 0.2;
const SHIN: f64 = 0.2;
const TORSO: f64 = 0.3;
const NECK: f64 = 0.1;
const FOOT: f64 = 0.08;

/// Target angles, in degrees, for a generated pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseAngles {
    pub left_knee: f64,
    pub right_knee: f64,
    pub left_hip: f64,
    pub right_hip: f64,
}

impl PoseAngles {
    pub fn symmetric(knee: f64, hip: f64) -> Self {
        Self {
            left_knee: knee,
            right_knee: knee,
            left_hip: hip,
            right_hip: hip,
        }
    }
}

struct Leg {
    shoulder: BodyLandmark,
    hip: BodyLandmark,
    knee: BodyLandmark,
    ankle: BodyLandmark,
}

const LEFT: Leg = Leg {
    shoulder: BodyLandmark::LeftShoulder,
    hip: BodyLandmark::LeftHip,
    knee: BodyLandmark::LeftKnee,
    ankle: BodyLandmark::LeftAnkle,
};

const RIGHT: Leg = Leg {
    shoulder: BodyLandmark::RightShoulder,
    hip: BodyLandmark::RightHip,
    knee: BodyLandmark::RightKnee,
    ankle: BodyLandmark::RightAnkle,
};

/// Build a full 33-point set whose bilateral knee and hip angles match
/// `angles`. On the right side the back reads 180° and the ankle 90°.
pub fn pose_with_angles(angles: PoseAngles) -> LandmarkSet {
    let mut set = LandmarkSet::new(vec![Landmark::new(0.5, 0.5, 0.0); BodyLandmark::COUNT]);

    place_leg(&mut set, &LEFT, 0.45, angles.left_knee, angles.left_hip);
    let [shoulder, hip, knee, ankle] =
        place_leg(&mut set, &RIGHT, 0.50, angles.right_knee, angles.right_hip);

    // Ear continues the hip-to-shoulder line
    let torso = (shoulder - hip).try_normalize(f64::EPSILON).unwrap_or_else(up);
    set.set(BodyLandmark::RightEar, point(&(shoulder + torso * NECK)));

    // Foot perpendicular to the shin
    let shin = (knee - ankle).try_normalize(f64::EPSILON).unwrap_or_else(up);
    let foot = Vector2::new(-shin.y, shin.x);
    set.set(BodyLandmark::RightFootIndex, point(&(ankle + foot * FOOT)));

    set
}

fn place_leg(
    set: &mut LandmarkSet,
    leg: &Leg,
    x: f64,
    knee_deg: f64,
    hip_deg: f64,
) -> [Vector2<f64>; 4] {
    let hip = Vector2::new(x, 0.5);
    let knee = hip + Vector2::new(0.0, THIGH);

    // Angle between hip->knee (0, 1) and hip->shoulder
    let h = hip_deg.to_radians();
    let shoulder = hip + Vector2::new(h.sin(), h.cos()) * TORSO;

    // Angle between knee->hip (0, -1) and knee->ankle
    let k = knee_deg.to_radians();
    let ankle = knee + Vector2::new(k.sin(), -k.cos()) * SHIN;

    set.set(leg.shoulder, point(&shoulder));
    set.set(leg.hip, point(&hip));
    set.set(leg.knee, point(&knee));
    set.set(leg.ankle, point(&ankle));

    [shoulder, hip, knee, ankle]
}

/// Upward in image coordinates
fn up() -> Vector2<f64> {
    Vector2::new(0.0, -1.0)
}

fn point(p: &Vector2<f64>) -> Landmark {
    Landmark::new(p.x, p.y, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angles::{extract_angles, AngleVector, Bilateral, Joint, Sagittal};

    #[test]
    fn test_generated_angles_match() {
        let pose = pose_with_angles(PoseAngles {
            left_knee: 95.0,
            right_knee: 110.0,
            left_hip: 150.0,
            right_hip: 140.0,
        });
        let v: AngleVector<Bilateral> = extract_angles(Some(&pose)).unwrap();
        assert!((v.get(Joint::LeftKnee).unwrap() - 95.0).abs() < 1e-3);
        assert!((v.get(Joint::RightKnee).unwrap() - 110.0).abs() < 1e-3);
        assert!((v.get(Joint::LeftHip).unwrap() - 150.0).abs() < 1e-3);
        assert!((v.get(Joint::RightHip).unwrap() - 140.0).abs() < 1e-3);
    }

    #[test]
    fn test_sagittal_back_and_ankle() {
        let pose = pose_with_angles(PoseAngles::symmetric(100.0, 110.0));
        let v: AngleVector<Sagittal> = extract_angles(Some(&pose)).unwrap();
        assert!((v.get(Joint::Hip).unwrap() - 110.0).abs() < 1e-3);
        assert!((v.get(Joint::Knee).unwrap() - 100.0).abs() < 1e-3);
        assert!((v.get(Joint::Back).unwrap() - 180.0).abs() < 0.1);
        assert!((v.get(Joint::Ankle).unwrap() - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_segment_lengths_hold_at_any_bend() {
        for knee in [30.0, 90.0, 170.0] {
            let pose = pose_with_angles(PoseAngles::symmetric(knee, 120.0));
            let at = |lm| pose.get(lm).unwrap().to_vector(false).xy();
            let shin = (at(BodyLandmark::RightAnkle) - at(BodyLandmark::RightKnee)).norm();
            let torso = (at(BodyLandmark::RightShoulder) - at(BodyLandmark::RightHip)).norm();
            let foot = (at(BodyLandmark::RightFootIndex) - at(BodyLandmark::RightAnkle)).norm();
            assert!((shin - SHIN).abs() < 1e-9);
            assert!((torso - TORSO).abs() < 1e-9);
            assert!((foot - FOOT).abs() < 1e-9);
        }
    }
}

//! Joint angle vectors and their extraction from landmark sets.
//!
//! An [`AngleVector`] is a fixed-size tuple of joint angles in degrees. Its
//! layout is a type parameter, so vectors from different presets can never be
//! blended or aggregated together:
//!
//! - [`Bilateral`]: `left_knee`, `right_knee`, `left_hip`, `right_hip`
//! - [`Sagittal`]: `hip`, `knee`, `back`, `ankle` (right side profile)

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::geometry::{is_valid_angle, joint_angle};
use crate::types::{BodyLandmark, LandmarkSet};

/// Number of components in every angle vector layout
pub const ANGLE_COUNT: usize = 4;

/// A tracked joint angle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    LeftKnee,
    RightKnee,
    LeftHip,
    RightHip,
    Hip,
    Knee,
    /// Torso line measured at the shoulder (ear, shoulder, hip), independent of the hip angle
    Back,
    Ankle,
}

impl Joint {
    pub fn name(&self) -> &'static str {
        match self {
            Joint::LeftKnee => "left_knee",
            Joint::RightKnee => "right_knee",
            Joint::LeftHip => "left_hip",
            Joint::RightHip => "right_hip",
            Joint::Hip => "hip",
            Joint::Knee => "knee",
            Joint::Back => "back",
            Joint::Ankle => "ankle",
        }
    }

    /// Landmark triple (A, B, C); the angle is measured at B.
    pub fn vertices(&self) -> [BodyLandmark; 3] {
        use BodyLandmark::*;
        match self {
            Joint::LeftKnee => [LeftHip, LeftKnee, LeftAnkle],
            Joint::RightKnee => [RightHip, RightKnee, RightAnkle],
            Joint::LeftHip => [LeftShoulder, LeftHip, LeftKnee],
            Joint::RightHip => [RightShoulder, RightHip, RightKnee],
            Joint::Hip => [RightShoulder, RightHip, RightKnee],
            Joint::Knee => [RightHip, RightKnee, RightAnkle],
            Joint::Back => [RightEar, RightShoulder, RightHip],
            Joint::Ankle => [RightKnee, RightAnkle, RightFootIndex],
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compile-time description of which joints an angle vector carries
pub trait AngleLayout: Copy + Default + fmt::Debug + PartialEq + Send + Sync + 'static {
    const JOINTS: [Joint; ANGLE_COUNT];
}

/// Left/right knee and hip angles, used for session analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bilateral;

impl AngleLayout for Bilateral {
    const JOINTS: [Joint; ANGLE_COUNT] = [
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftHip,
        Joint::RightHip,
    ];
}

/// Reduced side-profile preset used by the live trainer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sagittal;

impl AngleLayout for Sagittal {
    const JOINTS: [Joint; ANGLE_COUNT] = [Joint::Hip, Joint::Knee, Joint::Back, Joint::Ankle];
}

/// Validated joint angles for one frame; every component lies in [0°, 180°].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleVector<L: AngleLayout = Bilateral> {
    values: [f64; ANGLE_COUNT],
    layout: PhantomData<L>,
}

impl<L: AngleLayout> AngleVector<L> {
    /// Returns `None` if any component is NaN or outside [0°, 180°].
    pub fn from_values(values: [f64; ANGLE_COUNT]) -> Option<Self> {
        if values.iter().all(|v| is_valid_angle(*v)) {
            Some(Self::new_unchecked(values))
        } else {
            None
        }
    }

    /// Caller guarantees the range invariant (e.g. a convex blend of valid vectors).
    pub(crate) fn new_unchecked(values: [f64; ANGLE_COUNT]) -> Self {
        Self {
            values,
            layout: PhantomData,
        }
    }

    pub fn values(&self) -> [f64; ANGLE_COUNT] {
        self.values
    }

    pub fn joints() -> [Joint; ANGLE_COUNT] {
        L::JOINTS
    }

    pub fn get(&self, joint: Joint) -> Option<f64> {
        L::JOINTS
            .iter()
            .position(|j| *j == joint)
            .map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Joint, f64)> {
        L::JOINTS.into_iter().zip(self.values)
    }
}

/// Extraction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Landmarks below this visibility count as unresolvable
    pub min_visibility: f32,
    /// Use the z coordinate; `false` measures angles in the image plane
    pub use_depth: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_visibility: 0.0,
            use_depth: true,
        }
    }
}

impl ExtractorConfig {
    /// Image-plane extraction used for recorded sessions
    pub fn planar() -> Self {
        Self {
            use_depth: false,
            ..Default::default()
        }
    }
}

/// Converts landmark sets into angle vectors, failing closed.
#[derive(Debug, Clone, Default)]
pub struct AngleExtractor {
    config: ExtractorConfig,
}

impl AngleExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn extract<L: AngleLayout>(&self, landmarks: Option<&LandmarkSet>) -> Option<AngleVector<L>> {
        let landmarks = landmarks?;
        let mut values = [0.0; ANGLE_COUNT];

        for (slot, joint) in values.iter_mut().zip(L::JOINTS) {
            *slot = self.measure(landmarks, joint)?;
        }

        AngleVector::from_values(values)
    }

    fn measure(&self, landmarks: &LandmarkSet, joint: Joint) -> Option<f64> {
        let [a, b, c] = joint.vertices();
        let a = self.resolve(landmarks, a)?;
        let b = self.resolve(landmarks, b)?;
        let c = self.resolve(landmarks, c)?;
        Some(joint_angle(&a, &b, &c))
    }

    fn resolve(&self, landmarks: &LandmarkSet, which: BodyLandmark) -> Option<nalgebra::Vector3<f64>> {
        let lm = landmarks.get(which)?;
        if lm.visibility < self.config.min_visibility {
            return None;
        }
        Some(lm.to_vector(self.config.use_depth))
    }
}

/// Extract angles with the default (3D, ungated) extractor.
pub fn extract_angles<L: AngleLayout>(landmarks: Option<&LandmarkSet>) -> Option<AngleVector<L>> {
    AngleExtractor::default().extract(landmarks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Landmark;
    use proptest::prelude::*;

    /// Standing figure in image coordinates (y grows downward)
    fn standing_pose() -> LandmarkSet {
        let mut set = LandmarkSet::new(vec![Landmark::new(0.5, 0.5, 0.0); BodyLandmark::COUNT]);
        set.set(BodyLandmark::RightEar, Landmark::new(0.50, 0.10, 0.0));
        set.set(BodyLandmark::LeftShoulder, Landmark::new(0.45, 0.20, 0.0));
        set.set(BodyLandmark::RightShoulder, Landmark::new(0.50, 0.20, 0.0));
        set.set(BodyLandmark::LeftHip, Landmark::new(0.45, 0.50, 0.0));
        set.set(BodyLandmark::RightHip, Landmark::new(0.50, 0.50, 0.0));
        set.set(BodyLandmark::LeftKnee, Landmark::new(0.45, 0.70, 0.0));
        set.set(BodyLandmark::RightKnee, Landmark::new(0.50, 0.70, 0.0));
        set.set(BodyLandmark::LeftAnkle, Landmark::new(0.45, 0.90, 0.0));
        set.set(BodyLandmark::RightAnkle, Landmark::new(0.50, 0.90, 0.0));
        set.set(BodyLandmark::RightFootIndex, Landmark::new(0.58, 0.92, 0.0));
        set
    }

    #[test]
    fn test_absent_landmarks() {
        assert!(extract_angles::<Bilateral>(None).is_none());
    }

    #[test]
    fn test_standing_pose_is_extended() {
        let pose = standing_pose();
        let angles: AngleVector<Bilateral> = extract_angles(Some(&pose)).unwrap();

        for (joint, value) in angles.iter() {
            assert!(value > 175.0, "{} should be straight, got {}", joint, value);
        }
    }

    #[test]
    fn test_sagittal_layout() {
        let pose = standing_pose();
        let angles: AngleVector<Sagittal> = extract_angles(Some(&pose)).unwrap();

        assert!(angles.get(Joint::Knee).unwrap() > 175.0);
        assert!(angles.get(Joint::LeftKnee).is_none());
        let ankle = angles.get(Joint::Ankle).unwrap();
        assert!(ankle > 60.0 && ankle < 120.0);
    }

    #[test]
    fn test_bent_knee() {
        let mut pose = standing_pose();
        // Ankle pulled forward level with the knee: 90° knee bend
        pose.set(BodyLandmark::RightAnkle, Landmark::new(0.70, 0.70, 0.0));
        let angles: AngleVector<Bilateral> = extract_angles(Some(&pose)).unwrap();
        assert!((angles.get(Joint::RightKnee).unwrap() - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_truncated_set_fails_closed() {
        let pose = LandmarkSet::new(standing_pose().landmarks()[..25].to_vec());
        assert!(extract_angles::<Bilateral>(Some(&pose)).is_none());
    }

    #[test]
    fn test_nan_coordinate_fails_closed() {
        let mut pose = standing_pose();
        pose.set(BodyLandmark::LeftKnee, Landmark::new(f64::NAN, 0.7, 0.0));
        assert!(extract_angles::<Bilateral>(Some(&pose)).is_none());
    }

    #[test]
    fn test_visibility_gate() {
        let mut pose = standing_pose();
        pose.set(
            BodyLandmark::LeftAnkle,
            Landmark::new(0.45, 0.90, 0.0).with_visibility(0.2),
        );

        let gated = AngleExtractor::new(ExtractorConfig {
            min_visibility: 0.5,
            ..Default::default()
        });
        assert!(gated.extract::<Bilateral>(Some(&pose)).is_none());
        assert!(AngleExtractor::default().extract::<Bilateral>(Some(&pose)).is_some());
    }

    #[test]
    fn test_planar_ignores_depth() {
        let mut pose = standing_pose();
        pose.set(BodyLandmark::RightAnkle, Landmark::new(0.50, 0.90, 0.3));

        let planar = AngleExtractor::new(ExtractorConfig::planar());
        let flat: AngleVector<Bilateral> = planar.extract(Some(&pose)).unwrap();
        let deep: AngleVector<Bilateral> = AngleExtractor::default().extract(Some(&pose)).unwrap();

        assert!(flat.get(Joint::RightKnee).unwrap() > 179.0);
        assert!(deep.get(Joint::RightKnee).unwrap() < flat.get(Joint::RightKnee).unwrap());
    }

    #[test]
    fn test_back_does_not_repeat_hip_triple() {
        assert_eq!(
            Joint::Back.vertices(),
            [BodyLandmark::RightEar, BodyLandmark::RightShoulder, BodyLandmark::RightHip]
        );
        assert_ne!(Joint::Back.vertices(), Joint::Hip.vertices());
    }

    #[test]
    fn test_from_values_rejects_out_of_range() {
        assert!(AngleVector::<Bilateral>::from_values([90.0, 90.0, 90.0, 181.0]).is_none());
        assert!(AngleVector::<Bilateral>::from_values([90.0, -0.1, 90.0, 90.0]).is_none());
        assert!(AngleVector::<Bilateral>::from_values([f64::NAN, 90.0, 90.0, 90.0]).is_none());
        assert!(AngleVector::<Bilateral>::from_values([0.0, 180.0, 90.0, 90.0]).is_some());
    }

    proptest! {
        #[test]
        fn prop_extracted_angles_in_range(
            coords in prop::collection::vec((-2.0f64..2.0, -2.0f64..2.0, -2.0f64..2.0), BodyLandmark::COUNT)
        ) {
            let set: LandmarkSet = coords
                .into_iter()
                .map(|(x, y, z)| Landmark::new(x, y, z))
                .collect();

            if let Some(angles) = extract_angles::<Bilateral>(Some(&set)) {
                for v in angles.values() {
                    prop_assert!((0.0..=180.0).contains(&v));
                }
            }
            if let Some(angles) = extract_angles::<Sagittal>(Some(&set)) {
                for v in angles.values() {
                    prop_assert!((0.0..=180.0).contains(&v));
                }
            }
        }
    }
}

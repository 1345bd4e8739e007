//! Geometric utilities for joint-angle computation.

use nalgebra::Vector3;

/// Guards the cosine denominator against zero-length limb segments
pub const ANGLE_EPSILON: f64 = 1e-8;

/// Angle at `b` (degrees) between segments b→a and b→c
///
/// Coincident points yield a zero-length segment; the cosine then collapses
/// to 0 and the angle to 90°, never NaN.
pub fn joint_angle(a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> f64 {
    let ba = a - b;
    let bc = c - b;
    let denom = ba.norm() * bc.norm() + ANGLE_EPSILON;
    (ba.dot(&bc) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// True for a finite angle inside the anatomical range [0°, 180°]
pub fn is_valid_angle(degrees: f64) -> bool {
    degrees.is_finite() && (0.0..=180.0).contains(&degrees)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_right_angle() {
        let a = Vector3::new(0.0, 1.0, 0.0);
        let b = Vector3::zeros();
        let c = Vector3::new(1.0, 0.0, 0.0);
        assert!((joint_angle(&a, &b, &c) - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_straight_limb() {
        let a = Vector3::new(0.0, 0.0, 0.0);
        let b = Vector3::new(0.0, 0.5, 0.0);
        let c = Vector3::new(0.0, 1.0, 0.0);
        // Epsilon in the denominator keeps a collinear limb just short of 180
        assert!((joint_angle(&a, &b, &c) - 180.0).abs() < 0.05);
    }

    #[test]
    fn test_degenerate_segment_is_finite() {
        let p = Vector3::new(0.3, 0.3, 0.0);
        let angle = joint_angle(&p, &p, &Vector3::new(1.0, 0.0, 0.0));
        assert!(is_valid_angle(angle));
    }

    #[test]
    fn test_angle_validity() {
        assert!(is_valid_angle(0.0));
        assert!(is_valid_angle(180.0));
        assert!(!is_valid_angle(180.5));
        assert!(!is_valid_angle(-1.0));
        assert!(!is_valid_angle(f64::NAN));
    }
}

//! Helper functions

use crate::kinematic_traits::{JointLimit, Joints};
use nalgebra::{DVector, Isometry3, UnitQuaternion};
use std::f64::consts::{PI, TAU};

/// Maps any finite angle into the half open range (-PI, PI]. Values already
/// inside come back unchanged, and applying the function twice gives the
/// same result as applying it once.
pub fn ranged_angle(angle: f64) -> f64 {
    let mut a = angle % TAU;
    if a > PI {
        a -= TAU;
    }
    if a <= -PI {
        a += TAU;
    }
    a
}

/// Pins every out-of-range joint to the nearest bound, leaving the others
/// untouched. Returns true if anything had to move.
pub fn clip_to_limits(joints: &mut Joints, limits: &[JointLimit]) -> bool {
    let mut clipped = false;
    for (value, limit) in joints.iter_mut().zip(limits.iter()) {
        let pinned = limit.clamp(*value);
        if pinned != *value {
            *value = pinned;
            clipped = true;
        }
    }
    clipped
}

/// Builds a joint vector from a slice of radian values.
pub fn joints(values: &[f64]) -> Joints {
    DVector::from_row_slice(values)
}

/// Allows to specify joint values in degrees (converts to radians)
#[allow(dead_code)]
pub fn as_radians(degrees: &[i32]) -> Joints {
    DVector::from_iterator(degrees.len(), degrees.iter().map(|d| (*d as f64).to_radians()))
}

/// Print joint values, converting radians to degrees.
#[allow(dead_code)]
pub fn dump_joints(joints: &Joints) {
    let mut row_str = String::new();
    for joint_idx in 0..joints.len() {
        let computed = joints[joint_idx];
        row_str.push_str(&format!("{:5.2} ", computed.to_degrees()));
    }
    println!("[{}]", row_str.trim_end());
}

pub fn dump_pose(isometry: &Isometry3<f64>) {
    let translation = isometry.translation.vector;
    let rotation: UnitQuaternion<f64> = isometry.rotation;
    println!(
        "x: {:.5}, y: {:.5}, z: {:.5},  quat: {:.5},{:.5},{:.5},{:.5}",
        translation.x, translation.y, translation.z, rotation.i, rotation.j, rotation.k, rotation.w
    );
}

/// Panics with a dump of both poses if they differ more than the given
/// tolerances. Intended for tests.
pub fn assert_pose_eq(
    ta: &Isometry3<f64>,
    tb: &Isometry3<f64>,
    distance_tolerance: f64,
    angular_tolerance: f64,
) -> bool {
    fn bad(ta: &Isometry3<f64>, tb: &Isometry3<f64>) {
        dump_pose(ta);
        dump_pose(tb);
    }

    let translation_distance = (ta.translation.vector - tb.translation.vector).norm();
    let angular_distance = ta.rotation.angle_to(&tb.rotation);

    if translation_distance.abs() > distance_tolerance {
        bad(ta, tb);
        panic!("Poses have too different translations");
    }

    if angular_distance.abs() > angular_tolerance {
        bad(ta, tb);
        panic!("Poses have too different angles");
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematic_traits::JointLimit;

    #[test]
    fn test_ranged_angle_in_range() {
        for angle in [-3.0, -0.5, 0.0, 0.5, 3.0, PI] {
            assert_eq!(ranged_angle(angle), angle);
        }
    }

    #[test]
    fn test_ranged_angle_wraps() {
        assert!((ranged_angle(PI + 0.25) - (-PI + 0.25)).abs() < 1e-12);
        assert!((ranged_angle(-PI - 0.25) - (PI - 0.25)).abs() < 1e-12);
        assert!((ranged_angle(3.0 * TAU + 0.5) - 0.5).abs() < 1e-12);
        assert!((ranged_angle(-3.0 * TAU - 0.5) + 0.5).abs() < 1e-12);
        // -PI is excluded from the range, PI is not
        assert_eq!(ranged_angle(-PI), PI);
        assert_eq!(ranged_angle(PI), PI);
    }

    #[test]
    fn test_ranged_angle_idempotent() {
        for i in -100..100 {
            let angle = i as f64 * 0.37;
            let once = ranged_angle(angle);
            assert!(once > -PI && once <= PI, "out of range for {}", angle);
            assert_eq!(ranged_angle(once), once);
        }
    }

    #[test]
    fn test_clip_to_limits() {
        let limits = vec![
            JointLimit::new(-1.0, 1.0),
            JointLimit::new(0.0, 2.0),
            JointLimit::unbounded(),
        ];
        let mut values = joints(&[-1.5, 0.5, 100.0]);
        assert!(clip_to_limits(&mut values, &limits));
        assert_eq!(values, joints(&[-1.0, 0.5, 100.0]));

        // Clipping the already clipped vector changes nothing
        let before = values.clone();
        assert!(!clip_to_limits(&mut values, &limits));
        assert_eq!(values, before);
    }

    #[test]
    fn test_as_radians() {
        let j = as_radians(&[180, -90]);
        assert!((j[0] - PI).abs() < 1e-12);
        assert!((j[1] + PI / 2.0).abs() < 1e-12);
    }
}

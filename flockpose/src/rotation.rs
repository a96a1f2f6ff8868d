//! Rotation codec and local transform resolution.
//!
//! Euler angles are always in degrees and describe an intrinsic Z-Y-X rotation, so
//! `R = Rz * Ry * Rx`. This is the convention the pose evaluator uses to rebuild joint rotations.

use crate::NodeTransform;
use glam::{Mat3, Mat4, Quat, Vec3};

/// Distance from |sin(pitch)| = 1 treated as gimbal lock. A few ulps, enough to catch exact
/// quarter turns whose sine rounds to just below one.
const GIMBAL_EPSILON: f32 = 4.0 * f32::EPSILON;

/// Decodes a unit quaternion into Euler angles `(x, y, z)` in degrees.
///
/// At the gimbal singularity (|sin(pitch)| >= 1) the pitch is pinned to exactly +/-90 degrees.
/// Only the composite rotation survives a round trip there, not the individual angles.
pub fn quaternion_to_euler(q: Quat) -> Vec3 {
    let (x, y, z, w) = (q.x, q.y, q.z, q.w);

    let sinp = 2.0 * (w * y - z * x);
    if sinp.abs() >= 1.0 - GIMBAL_EPSILON {
        log::debug!("gimbal lock while decoding {q:?}, clamping pitch to +/-90 degrees");
        // Roll and yaw are no longer independent: keep roll at zero and fold the whole twist
        // into yaw, read from the second matrix column.
        let yaw = (2.0 * (w * z - x * y)).atan2(1.0 - 2.0 * (x * x + z * z));
        return Vec3::new(0.0, 90f32.copysign(sinp), yaw.to_degrees());
    }
    let pitch = sinp.asin();

    let sinr_cosp = 2.0 * (w * x + y * z);
    let cosr_cosp = 1.0 - 2.0 * (x * x + y * y);
    let roll = sinr_cosp.atan2(cosr_cosp);

    let siny_cosp = 2.0 * (w * z + x * y);
    let cosy_cosp = 1.0 - 2.0 * (y * y + z * z);
    let yaw = siny_cosp.atan2(cosy_cosp);

    Vec3::new(roll.to_degrees(), pitch.to_degrees(), yaw.to_degrees())
}

/// Rebuilds the 3x3 rotation for Euler angles produced by [`quaternion_to_euler`].
pub fn euler_to_rotation_mat3(degrees: Vec3) -> Mat3 {
    let rx = Mat3::from_rotation_x(degrees.x.to_radians());
    let ry = Mat3::from_rotation_y(degrees.y.to_radians());
    let rz = Mat3::from_rotation_z(degrees.z.to_radians());
    rz * ry * rx
}

pub fn euler_to_rotation_matrix(degrees: Vec3) -> Mat4 {
    Mat4::from_mat3(euler_to_rotation_mat3(degrees))
}

/// Canonical 4x4 local transform of a node.
///
/// Missing TRS fields default to zero translation, identity rotation and unit scale, composed as
/// `T * R * S`. An explicit matrix is returned as-is, without any orthogonality check.
pub fn resolve_local(transform: &NodeTransform) -> Mat4 {
    match transform {
        NodeTransform::Matrix(matrix) => *matrix,
        NodeTransform::Trs { .. } => {
            let (translation, rotation, scale) = local_trs(transform);
            Mat4::from_scale_rotation_translation(scale, rotation, translation)
        }
        NodeTransform::Identity => Mat4::IDENTITY,
    }
}

/// Local translation, rotation and scale of a node.
///
/// Explicit matrices are decomposed; an identity transform yields the defaults.
pub fn local_trs(transform: &NodeTransform) -> (Vec3, Quat, Vec3) {
    match transform {
        NodeTransform::Matrix(matrix) => {
            let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
            (translation, rotation, scale)
        }
        NodeTransform::Trs {
            translation,
            rotation,
            scale,
        } => {
            if translation.is_none() || rotation.is_none() || scale.is_none() {
                log::trace!(
                    "defaulting missing TRS fields (t: {}, r: {}, s: {})",
                    translation.is_some(),
                    rotation.is_some(),
                    scale.is_some()
                );
            }
            (
                translation.unwrap_or(Vec3::ZERO),
                rotation.unwrap_or(Quat::IDENTITY),
                scale.unwrap_or(Vec3::ONE),
            )
        }
        NodeTransform::Identity => (Vec3::ZERO, Quat::IDENTITY, Vec3::ONE),
    }
}

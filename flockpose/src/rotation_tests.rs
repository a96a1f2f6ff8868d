use crate::{
    NodeTransform, euler_to_rotation_matrix, local_trs, quaternion_to_euler, resolve_local,
};
use glam::{EulerRot, Mat4, Quat, Vec3};
use proptest::prelude::*;

fn assert_approx(actual: f32, expected: f32, eps: f32) {
    let diff = (actual - expected).abs();
    assert!(diff <= eps, "expected {expected}, got {actual} (diff {diff})");
}

fn assert_mat4_approx(actual: Mat4, expected: Mat4, eps: f32) {
    for (a, e) in actual
        .to_cols_array()
        .into_iter()
        .zip(expected.to_cols_array())
    {
        assert_approx(a, e, eps);
    }
}

#[test]
fn identity_quaternion_decodes_to_zero_angles() {
    let euler = quaternion_to_euler(Quat::IDENTITY);
    assert_eq!(euler, Vec3::ZERO);
}

#[test]
fn quarter_turn_about_y_decodes_and_reencodes() {
    let q = Quat::from_rotation_y(90f32.to_radians());
    let euler = quaternion_to_euler(q);
    assert_approx(euler.x, 0.0, 0.05);
    assert_approx(euler.y, 90.0, 0.05);
    assert_approx(euler.z, 0.0, 0.05);

    let direct = Mat4::from_rotation_y(90f32.to_radians());
    assert_mat4_approx(euler_to_rotation_matrix(euler), direct, 1.0e-3);
}

#[test]
fn single_axis_rotations_decode_to_their_axis() {
    let euler = quaternion_to_euler(Quat::from_rotation_x(30f32.to_radians()));
    assert_approx(euler.x, 30.0, 1.0e-4);
    assert_approx(euler.y, 0.0, 1.0e-4);
    assert_approx(euler.z, 0.0, 1.0e-4);

    let euler = quaternion_to_euler(Quat::from_rotation_z(-120f32.to_radians()));
    assert_approx(euler.x, 0.0, 1.0e-4);
    assert_approx(euler.y, 0.0, 1.0e-4);
    assert_approx(euler.z, -120.0, 1.0e-3);
}

#[test]
fn gimbal_lock_clamps_pitch_and_stays_finite() {
    // Slightly denormalized on purpose so sin(pitch) lands above 1.
    let q = Quat::from_xyzw(0.0, 0.7072, 0.0, 0.7072);
    let euler = quaternion_to_euler(q);
    assert!(euler.is_finite());
    assert_eq!(euler.y, 90.0);

    let q = Quat::from_xyzw(0.0, -0.7072, 0.0, 0.7072);
    assert_eq!(quaternion_to_euler(q).y, -90.0);
}

#[test]
fn gimbal_lock_preserves_composite_rotation() {
    let q = Quat::from_euler(EulerRot::ZYX, 0.4, std::f32::consts::FRAC_PI_2, 0.0);
    let euler = quaternion_to_euler(q);
    assert!(euler.is_finite());
    // Pinning the pitch to 90 drops the leftover f32 tilt of about 3.5e-4 rad.
    assert_mat4_approx(euler_to_rotation_matrix(euler), Mat4::from_quat(q), 1.0e-3);
}

#[test]
fn pitch_just_below_ninety_is_not_clamped() {
    for pitch in [89.9f32, 89.92, -89.92] {
        let q = Quat::from_euler(EulerRot::ZYX, 0.3, pitch.to_radians(), -0.2);
        let euler = quaternion_to_euler(q);
        assert!(euler.y.abs() < 90.0, "pitch {pitch} decoded as {euler}");
        assert_approx(euler.y, pitch, 0.03);
        assert_mat4_approx(euler_to_rotation_matrix(euler), Mat4::from_quat(q), 5.0e-4);
    }
}

#[test]
fn resolve_local_uses_explicit_matrix_verbatim() {
    let skewed = Mat4::from_cols_array(&[
        1.0, 2.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 3.0, 0.0, 4.0, 5.0, 6.0, 1.0,
    ]);
    assert_eq!(resolve_local(&NodeTransform::Matrix(skewed)), skewed);
}

#[test]
fn resolve_local_composes_translation_rotation_scale() {
    let t = Vec3::new(1.0, 2.0, 3.0);
    let r = Quat::from_rotation_z(90f32.to_radians());
    let s = Vec3::new(2.0, 2.0, 2.0);
    let local = resolve_local(&NodeTransform::from_trs(t, r, s));
    let expected = Mat4::from_translation(t) * Mat4::from_quat(r) * Mat4::from_scale(s);
    assert_mat4_approx(local, expected, 1.0e-6);

    // Scale first, then rotation, then translation.
    let p = local.transform_point3(Vec3::X);
    assert_approx(p.x, 1.0, 1.0e-5);
    assert_approx(p.y, 4.0, 1.0e-5);
    assert_approx(p.z, 3.0, 1.0e-5);
}

#[test]
fn resolve_local_defaults_missing_fields() {
    let only_scale = NodeTransform::Trs {
        translation: None,
        rotation: None,
        scale: Some(Vec3::splat(3.0)),
    };
    assert_eq!(resolve_local(&only_scale), Mat4::from_scale(Vec3::splat(3.0)));
    assert_eq!(
        local_trs(&only_scale),
        (Vec3::ZERO, Quat::IDENTITY, Vec3::splat(3.0))
    );
    assert_eq!(resolve_local(&NodeTransform::Identity), Mat4::IDENTITY);
}

#[test]
fn local_trs_decomposes_matrix_transforms() {
    let t = Vec3::new(0.5, -1.0, 2.0);
    let r = Quat::from_rotation_x(0.3);
    let s = Vec3::new(1.0, 2.0, 3.0);
    let matrix = Mat4::from_scale_rotation_translation(s, r, t);
    let (dt, dr, ds) = local_trs(&NodeTransform::Matrix(matrix));
    assert!(dt.abs_diff_eq(t, 1.0e-5));
    assert!(ds.abs_diff_eq(s, 1.0e-5));
    assert!(dr.abs_diff_eq(r, 1.0e-5));
}

proptest! {
    #[test]
    fn euler_round_trip_reproduces_rotation(
        x in -179.0f32..179.0,
        y in -80.0f32..80.0,
        z in -179.0f32..179.0,
    ) {
        let q = Quat::from_euler(EulerRot::ZYX, z.to_radians(), y.to_radians(), x.to_radians());
        let euler = quaternion_to_euler(q);
        prop_assert!(euler.is_finite());

        let rebuilt = euler_to_rotation_matrix(euler).to_cols_array();
        let expected = Mat4::from_quat(q).to_cols_array();
        for (a, e) in rebuilt.iter().zip(expected.iter()) {
            prop_assert!((a - e).abs() <= 1.0e-5, "{a} vs {e}");
        }
    }

    #[test]
    fn near_gimbal_round_trip_stays_close(
        x in -179.0f32..179.0,
        y in prop_oneof![85.0f32..89.9, -89.9f32..-85.0],
        z in -179.0f32..179.0,
    ) {
        let q = Quat::from_euler(EulerRot::ZYX, z.to_radians(), y.to_radians(), x.to_radians());
        let euler = quaternion_to_euler(q);
        prop_assert!(euler.is_finite());
        prop_assert!(euler.y.abs() < 90.0);

        // Decoded angles lose precision as 1/cos(pitch); at 89.9 degrees f32 rounding of the
        // quaternion costs a few 1e-4 in the rebuilt matrix.
        let rebuilt = euler_to_rotation_matrix(euler).to_cols_array();
        let expected = Mat4::from_quat(q).to_cols_array();
        for (a, e) in rebuilt.iter().zip(expected.iter()) {
            prop_assert!((a - e).abs() <= 1.0e-3, "{a} vs {e}");
        }
    }
}

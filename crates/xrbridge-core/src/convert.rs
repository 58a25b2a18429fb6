//! Conversion between the producer's and the host's spatial conventions.
//!
//! The browser graphics API hands out right-handed, Y-up, column-major
//! matrices with the camera looking down -Z. The host is left-handed with
//! the camera looking down +Z. Four rules cover everything that crosses
//! the boundary:
//!
//! - projection matrix: transpose only
//! - view matrix: transpose, then negate the Z row
//! - position: negate Z
//! - quaternion: negate X and Y
//!
//! Every pose in every buffer (headset, controller, hand joints, hit-test)
//! goes through exactly these rules. Applying a different rule to any one
//! of them mirrors the interaction space.

use glam::{Mat3, Mat4, Quat, Vec3};

use crate::types::Pose;

/// Convert a producer-native projection matrix to the host convention.
pub fn projection_from_gl(gl: [f32; 16]) -> Mat4 {
    Mat4::from_cols_array(&gl).transpose()
}

/// Convert a producer-native view matrix to the host convention.
pub fn view_from_gl(gl: [f32; 16]) -> Mat4 {
    negate_z_row(Mat4::from_cols_array(&gl).transpose())
}

/// Convert a producer-native position to the host convention.
pub fn position_from_gl(p: Vec3) -> Vec3 {
    Vec3::new(p.x, p.y, -p.z)
}

/// Convert a producer-native orientation to the host convention.
///
/// Negating X and Y is the quaternion counterpart of the Z-negation
/// applied to positions.
pub fn rotation_from_gl(q: Quat) -> Quat {
    Quat::from_xyzw(-q.x, -q.y, q.z, q.w)
}

/// Extract translation and rotation from a host-convention view matrix
/// (the output of [`view_from_gl`]).
///
/// Inverts the view to recover the camera transform, then reads the
/// translation column and rebuilds the rotation from the basis columns.
pub fn pose_from_view(view: Mat4) -> Pose {
    let trs = view.inverse();
    Pose {
        position: trs.w_axis.truncate(),
        rotation: look_rotation(trs.z_axis.truncate(), trs.y_axis.truncate()),
    }
}

/// Rotation whose forward axis is `forward` and whose up axis is closest
/// to `up`, in the host's left-handed basis.
fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let z = forward.normalize();
    let x = up.cross(z).normalize();
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z))
}

fn negate_z_row(m: Mat4) -> Mat4 {
    let mut cols = m.to_cols_array();
    for col in 0..4 {
        cols[col * 4 + 2] = -cols[col * 4 + 2];
    }
    Mat4::from_cols_array(&cols)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn approx_eq(a: Mat4, b: Mat4) -> bool {
        a.to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
            .all(|(x, y)| (x - y).abs() < EPS)
    }

    // Inverse rules, used to check the conversions round-trip.
    fn projection_to_gl(host: Mat4) -> [f32; 16] {
        host.transpose().to_cols_array()
    }

    fn view_to_gl(host: Mat4) -> [f32; 16] {
        negate_z_row(host).transpose().to_cols_array()
    }

    fn sample_matrix() -> [f32; 16] {
        let mut gl = [0.0f32; 16];
        for (i, v) in gl.iter_mut().enumerate() {
            *v = (i as f32) * 0.37 - 2.0;
        }
        gl
    }

    #[test]
    fn identity_projection_stays_identity() {
        assert!(approx_eq(
            projection_from_gl(Mat4::IDENTITY.to_cols_array()),
            Mat4::IDENTITY
        ));
    }

    #[test]
    fn projection_roundtrip() {
        let gl = sample_matrix();
        let host = projection_from_gl(gl);
        assert_eq!(projection_to_gl(host), gl);
    }

    #[test]
    fn view_roundtrip() {
        let gl = sample_matrix();
        let host = view_from_gl(gl);
        assert_eq!(view_to_gl(host), gl);
    }

    #[test]
    fn projection_transposes() {
        let gl = sample_matrix();
        let host = projection_from_gl(gl);
        // Host (row 1, col 3) is the producer's (row 3, col 1), which the
        // column-major input stores at 1 * 4 + 3.
        assert_eq!(host.row(1)[3], gl[1 * 4 + 3]);
        assert_eq!(host.row(0)[1], gl[1]);
    }

    #[test]
    fn position_flips_z_only() {
        let p = position_from_gl(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p, Vec3::new(1.0, 2.0, -3.0));
        assert_eq!(position_from_gl(p), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn rotation_flips_x_and_y() {
        let q = rotation_from_gl(Quat::from_xyzw(0.1, 0.2, 0.3, 0.9));
        assert_eq!(q, Quat::from_xyzw(-0.1, -0.2, 0.3, 0.9));
        // Identity is a fixed point of the conversion.
        assert_eq!(rotation_from_gl(Quat::IDENTITY), Quat::IDENTITY);
    }

    #[test]
    fn pose_from_view_recovers_camera_transform() {
        let rotation = Quat::from_rotation_y(0.6);
        let position = Vec3::new(0.3, 1.5, -2.0);
        let view = Mat4::from_rotation_translation(rotation, position).inverse();
        let pose = pose_from_view(view);
        assert!(pose.position.abs_diff_eq(position, EPS));
        assert!(
            pose.rotation.abs_diff_eq(rotation, EPS)
                || pose.rotation.abs_diff_eq(-rotation, EPS)
        );
    }

    #[test]
    fn gl_identity_view_faces_host_forward() {
        // A producer-native identity view means a camera at the origin
        // looking down the producer's -Z, which is the host's +Z mirrored:
        // position stays at the origin, rotation turns half way around Y.
        let pose = pose_from_view(view_from_gl(Mat4::IDENTITY.to_cols_array()));
        assert!(pose.position.abs_diff_eq(Vec3::ZERO, EPS));
        let expected = Quat::from_rotation_y(std::f32::consts::PI);
        assert!(
            pose.rotation.abs_diff_eq(expected, EPS) || pose.rotation.abs_diff_eq(-expected, EPS)
        );
    }
}

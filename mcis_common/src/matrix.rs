//! Fixed 3x3 matrix algebra and direction cosine matrix generation.

use crate::vector::Vector3;

/// A 3x3 row-major matrix of doubles.
///
/// Row-major index layout:
/// ```text
/// | m[0] m[1] m[2] |
/// | m[3] m[4] m[5] |
/// | m[6] m[7] m[8] |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3 {
    m: [f64; 9],
}

impl Matrix3 {
    pub const IDENTITY: Matrix3 = Matrix3 {
        m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
    };

    pub const fn from_array(m: [f64; 9]) -> Self {
        Matrix3 { m }
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.m[row * 3 + col]
    }

    /// Builds the inverse-ZYX direction cosine matrix from Euler angles
    /// (roll phi, pitch theta, yaw psi), in radians.
    ///
    /// This is the transpose of the standard body-from-inertial ZYX DCM,
    /// generated directly in transposed form rather than built and then
    /// transposed.
    pub fn inverse_zyx_dcm(euler: Vector3) -> Matrix3 {
        let (phi, theta, psi) = (euler.x, euler.y, euler.z);

        let s_phi = phi.sin();
        let c_phi = phi.cos();
        let s_theta = theta.sin();
        let c_theta = theta.cos();
        let s_psi = psi.sin();
        let c_psi = psi.cos();

        Matrix3::from_array([
            c_theta * c_psi,
            s_phi * s_theta * c_psi - c_phi * s_psi,
            c_phi * s_theta * c_psi + s_phi * s_psi,
            c_theta * s_psi,
            s_phi * s_theta * s_psi + c_phi * c_psi,
            c_phi * s_theta * s_psi - s_phi * c_psi,
            -s_theta,
            s_phi * c_theta,
            c_phi * c_theta,
        ])
    }

    pub fn right_multiply(&self, v: Vector3) -> Vector3 {
        Vector3::new(
            self.m[0] * v.x + self.m[1] * v.y + self.m[2] * v.z,
            self.m[3] * v.x + self.m[4] * v.y + self.m[5] * v.z,
            self.m[6] * v.x + self.m[7] * v.y + self.m[8] * v.z,
        )
    }

    pub fn transpose(&self) -> Matrix3 {
        Matrix3::from_array([
            self.m[0], self.m[3], self.m[6], self.m[1], self.m[4], self.m[7], self.m[2],
            self.m[5], self.m[8],
        ])
    }
}

/// Rotates `v` from the body frame to the inertial frame using the inverse
/// ZYX DCM built from `euler`, overwriting `v` in place.
pub fn body_to_inertial(v: &mut Vector3, euler: Vector3) {
    let dcm = Matrix3::inverse_zyx_dcm(euler);
    *v = dcm.right_multiply(*v);
}

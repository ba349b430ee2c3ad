// column-major 4x4 math in the layout glUniformMatrix4fv expects

use itertools::Itertools;
use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matrix4x4f {
    m: [f32; 16],
}

#[derive(Default, Copy, Clone, Debug, PartialEq)]
#[repr(C)]
pub struct Vector3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3f {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, rhs: &Vector3f) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(&self, rhs: &Vector3f) -> Vector3f {
        Vector3f {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// a zero vector stays zero
    pub fn normalized(&self) -> Vector3f {
        let length = self.length();
        if length == 0.0 {
            *self
        } else {
            self.scaled(1.0 / length)
        }
    }

    pub fn scaled(&self, factor: f32) -> Vector3f {
        Vector3f {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }
}

impl std::ops::Add for Vector3f {
    type Output = Vector3f;

    fn add(self, rhs: Self) -> Self::Output {
        Vector3f {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl std::ops::Sub for Vector3f {
    type Output = Vector3f;

    fn sub(self, rhs: Self) -> Self::Output {
        Vector3f {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

//

#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(C)]
pub struct Quaternionf {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternionf {
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// `axis` does not need to be unit length
    pub fn from_axis_angle(axis: &Vector3f, radians: f32) -> Self {
        let axis = axis.normalized();
        let (sin, cos) = (radians * 0.5).sin_cos();
        Self::new(axis.x * sin, axis.y * sin, axis.z * sin, cos)
    }
}

impl Default for Quaternionf {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }
}

//

impl Matrix4x4f {
    pub fn new(m: [f32; 16]) -> Self {
        Matrix4x4f { m }
    }

    pub fn slice(&self) -> &[f32; 16] {
        &self.m
    }

    /// post-multiply, so the scale reaches vertices before anything already in `self`
    pub fn scaled(&self, x: f32, y: f32, z: f32) -> Matrix4x4f {
        self * matrix4x4f_create_scale(x, y, z)
    }

    pub fn translated(&self, dx: f32, dy: f32, dz: f32) -> Matrix4x4f {
        self * matrix4x4f_create_translation(dx, dy, dz)
    }

    pub fn rotated(&self, degrees: f32, axis: &Vector3f) -> Matrix4x4f {
        self * matrix4x4f_create_rotation_degrees(degrees, axis)
    }
}

impl Default for Matrix4x4f {
    fn default() -> Self {
        matrix4x4f_identity()
    }
}

impl From<[f32; 16]> for Matrix4x4f {
    fn from(value: [f32; 16]) -> Self {
        Matrix4x4f::new(value)
    }
}

impl Display for Matrix4x4f {
    /// one row per line, which is not the storage order
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rows = (0..4)
            .map(|row| (0..4).map(|col| format!("{:9.4}", self.m[col * 4 + row])).join(" "))
            .join("\n");
        f.write_str(&rows)
    }
}

impl<'a, 'b> std::ops::Mul<&'a Matrix4x4f> for &'b Matrix4x4f {
    type Output = Matrix4x4f;

    fn mul(self, rhs: &Matrix4x4f) -> Self::Output {
        matrix4x4f_multiply(self, rhs)
    }
}
impl<'a> std::ops::Mul<Matrix4x4f> for &'a Matrix4x4f {
    type Output = Matrix4x4f;

    fn mul(self, rhs: Matrix4x4f) -> Self::Output {
        matrix4x4f_multiply(self, &rhs)
    }
}
impl<'a> std::ops::Mul<&'a Matrix4x4f> for Matrix4x4f {
    type Output = Matrix4x4f;

    fn mul(self, rhs: &Matrix4x4f) -> Self::Output {
        matrix4x4f_multiply(&self, rhs)
    }
}
impl std::ops::Mul<Matrix4x4f> for Matrix4x4f {
    type Output = Matrix4x4f;

    fn mul(self, rhs: Matrix4x4f) -> Self::Output {
        matrix4x4f_multiply(&self, &rhs)
    }
}

#[rustfmt::skip]
pub fn matrix4x4f_identity() -> Matrix4x4f {
    [
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ].into()
}

/// Perspective projection for a [-1,1] Z clip space with positive Y up (OpenGL ES).
pub fn matrix4x4f_create_projection(
    tan_angle_left: f32,
    tan_angle_right: f32,
    tan_angle_up: f32,
    tan_angle_down: f32,
    near_z: f32,
    far_z: f32,
) -> Matrix4x4f {
    let tan_angle_width = tan_angle_right - tan_angle_left;
    let tan_angle_height = tan_angle_up - tan_angle_down;
    let offset_z = near_z;

    let m0 = 2.0 / tan_angle_width;
    let m4 = 0.0;
    let m8 = (tan_angle_right + tan_angle_left) / tan_angle_width;
    let m12 = 0.0;

    let m1 = 0.0;
    let m5 = 2.0 / tan_angle_height;
    let m9 = (tan_angle_up + tan_angle_down) / tan_angle_height;
    let m13 = 0.0;

    let (m10, m14) = if far_z <= near_z {
        // place the far plane at infinity
        (-1.0, -(near_z + offset_z))
    } else {
        (
            -(far_z + offset_z) / (far_z - near_z),
            -(far_z * (near_z + offset_z)) / (far_z - near_z),
        )
    };
    let m2 = 0.0;
    let m6 = 0.0;

    let m3 = 0.0;
    let m7 = 0.0;
    let m11 = -1.0;
    let m15 = 0.0;
    [
        m0, m1, m2, m3, m4, m5, m6, m7, m8, m9, m10, m11, m12, m13, m14, m15,
    ]
    .into()
}

/// The classic `glFrustum`: clip planes given at the near plane's distance.
pub fn matrix4x4f_create_frustum(
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    near_z: f32,
    far_z: f32,
) -> Matrix4x4f {
    matrix4x4f_create_projection(
        left / near_z,
        right / near_z,
        top / near_z,
        bottom / near_z,
        near_z,
        far_z,
    )
}

/// View matrix for a camera at `eye` looking at `target`.
pub fn matrix4x4f_create_look_at(eye: &Vector3f, target: &Vector3f, up: &Vector3f) -> Matrix4x4f {
    let forward = (*target - *eye).normalized();
    let side = forward.cross(up).normalized();
    let up = side.cross(&forward);

    let m0 = side.x;
    let m1 = up.x;
    let m2 = -forward.x;
    let m3 = 0.0;

    let m4 = side.y;
    let m5 = up.y;
    let m6 = -forward.y;
    let m7 = 0.0;

    let m8 = side.z;
    let m9 = up.z;
    let m10 = -forward.z;
    let m11 = 0.0;

    let m12 = -side.dot(eye);
    let m13 = -up.dot(eye);
    let m14 = forward.dot(eye);
    let m15 = 1.0;
    [
        m0, m1, m2, m3, m4, m5, m6, m7, m8, m9, m10, m11, m12, m13, m14, m15,
    ]
    .into()
}

pub fn matrix4x4f_create_translation(dx: f32, dy: f32, dz: f32) -> Matrix4x4f {
    [
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, dx, dy, dz, 1.0,
    ]
    .into()
}

pub fn matrix4x4f_create_rotation_degrees(degrees: f32, axis: &Vector3f) -> Matrix4x4f {
    matrix4x4f_create_from_quaternion(&Quaternionf::from_axis_angle(axis, degrees.to_radians()))
}

pub fn matrix4x4f_create_from_quaternion(quat: &Quaternionf) -> Matrix4x4f {
    let x2 = quat.x + quat.x;
    let y2 = quat.y + quat.y;
    let z2 = quat.z + quat.z;

    let xx2 = quat.x * x2;
    let yy2 = quat.y * y2;
    let zz2 = quat.z * z2;

    let yz2 = quat.y * z2;
    let wx2 = quat.w * x2;
    let xy2 = quat.x * y2;
    let wz2 = quat.w * z2;
    let xz2 = quat.x * z2;
    let wy2 = quat.w * y2;

    let m0 = 1.0 - yy2 - zz2;
    let m1 = xy2 + wz2;
    let m2 = xz2 - wy2;
    let m3 = 0.0;

    let m4 = xy2 - wz2;
    let m5 = 1.0 - xx2 - zz2;
    let m6 = yz2 + wx2;
    let m7 = 0.0;

    let m8 = xz2 + wy2;
    let m9 = yz2 - wx2;
    let m10 = 1.0 - xx2 - yy2;
    let m11 = 0.0;

    let m12 = 0.0;
    let m13 = 0.0;
    let m14 = 0.0;
    let m15 = 1.0;
    [
        m0, m1, m2, m3, m4, m5, m6, m7, m8, m9, m10, m11, m12, m13, m14, m15,
    ]
    .into()
}

pub fn matrix4x4f_create_scale(x: f32, y: f32, z: f32) -> Matrix4x4f {
    [
        x, 0.0, 0.0, 0.0, 0.0, y, 0.0, 0.0, 0.0, 0.0, z, 0.0, 0.0, 0.0, 0.0, 1.0,
    ]
    .into()
}

pub fn matrix4x4f_multiply(a: &Matrix4x4f, b: &Matrix4x4f) -> Matrix4x4f {
    let mut m = [0.0f32; 16];
    for col in 0..4 {
        for row in 0..4 {
            m[col * 4 + row] = (0..4).map(|k| a.m[k * 4 + row] * b.m[col * 4 + k]).sum();
        }
    }
    m.into()
}

/// Homogeneous transform of `(v, 1)`; returns clip coordinates including `w`.
pub fn matrix4x4f_transform_point(m: &Matrix4x4f, v: &Vector3f) -> [f32; 4] {
    let x = m.m[0] * v.x + m.m[4] * v.y + m.m[8] * v.z + m.m[12];
    let y = m.m[1] * v.x + m.m[5] * v.y + m.m[9] * v.z + m.m[13];
    let z = m.m[2] * v.x + m.m[6] * v.y + m.m[10] * v.z + m.m[14];
    let w = m.m[3] * v.x + m.m[7] * v.y + m.m[11] * v.z + m.m[15];
    [x, y, z, w]
}

/// Like [`matrix4x4f_transform_point`] followed by the perspective divide.
pub fn matrix4x4f_transform_vector3f(m: &Matrix4x4f, v: &Vector3f) -> Vector3f {
    let [x, y, z, w] = matrix4x4f_transform_point(m, v);
    let rcp_w = 1.0 / w;
    Vector3f {
        x: x * rcp_w,
        y: y * rcp_w,
        z: z * rcp_w,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn assert_close(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!((a - e).abs() < EPSILON, "element {}: {} != {}", i, a, e);
        }
    }

    #[test]
    fn frustum_matches_gl_frustum() {
        let ratio = 800.0 / 600.0;
        let p = matrix4x4f_create_frustum(-ratio, ratio, -1.0, 1.0, 1.0, 10.0);
        #[rustfmt::skip]
        let expected = [
            1.0 / ratio, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, -11.0 / 9.0, -1.0,
            0.0, 0.0, -20.0 / 9.0, 0.0,
        ];
        assert_close(p.slice(), &expected);
    }

    #[test]
    fn near_and_far_planes_map_to_clip_bounds() {
        let p = matrix4x4f_create_frustum(-2.0, 2.0, -1.0, 1.0, 1.0, 10.0);
        let near = matrix4x4f_transform_vector3f(&p, &Vector3f::new(0.0, 0.0, -1.0));
        let far = matrix4x4f_transform_vector3f(&p, &Vector3f::new(0.0, 0.0, -10.0));
        assert!((near.z + 1.0).abs() < EPSILON);
        assert!((far.z - 1.0).abs() < EPSILON);
    }

    #[test]
    fn look_at_from_positive_z_is_a_translation() {
        let view = matrix4x4f_create_look_at(
            &Vector3f::new(0.0, 0.0, 3.0),
            &Vector3f::default(),
            &Vector3f::new(0.0, 1.0, 0.0),
        );
        assert_close(
            view.slice(),
            matrix4x4f_create_translation(0.0, 0.0, -3.0).slice(),
        );
    }

    #[test]
    fn rotation_about_z_turns_x_into_y() {
        let r = matrix4x4f_create_rotation_degrees(90.0, &Vector3f::new(0.0, 0.0, 2.0));
        let v = matrix4x4f_transform_vector3f(&r, &Vector3f::new(1.0, 0.0, 0.0));
        assert_close(&[v.x, v.y, v.z], &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn rotation_keeps_points_on_the_axis() {
        let axis = Vector3f::new(1.0, 1.0, 0.0);
        let r = matrix4x4f_create_rotation_degrees(37.5, &axis);
        let v = matrix4x4f_transform_vector3f(&r, &axis);
        assert_close(&[v.x, v.y, v.z], &[1.0, 1.0, 0.0]);
    }

    #[test]
    fn chained_transforms_apply_right_to_left() {
        // scale first, then translate
        let m = matrix4x4f_identity()
            .translated(0.0, 0.0, -1.0)
            .scaled(6.0, 6.0, 1.0);
        let v = matrix4x4f_transform_vector3f(&m, &Vector3f::new(1.0, 1.0, 0.0));
        assert_close(&[v.x, v.y, v.z], &[6.0, 6.0, -1.0]);

        // translate first, then scale: z is untouched by a z-scale of 1
        let m = matrix4x4f_identity()
            .scaled(6.0, 6.0, 1.0)
            .translated(0.0, 0.0, -1.0);
        let v = matrix4x4f_transform_vector3f(&m, &Vector3f::new(1.0, 1.0, 0.0));
        assert_close(&[v.x, v.y, v.z], &[6.0, 6.0, -1.0]);
    }

    #[test]
    fn display_prints_rows() {
        let text = matrix4x4f_create_translation(1.0, 2.0, 3.0).to_string();
        let first_row: Vec<&str> = text.lines().next().unwrap().split_whitespace().collect();
        assert_eq!(first_row, vec!["1.0000", "0.0000", "0.0000", "1.0000"]);
    }
}

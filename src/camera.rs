use crate::vec::{Mat4x4, Vec3};

const MAX_PITCH: f32 = 89.;

/// First person camera. The view basis is rebuilt from `yaw` and `pitch` whenever a matrix is
/// requested, `+y` is always up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub origin: Vec3,
    /// Pitch measured in degrees, positive looks up.
    pub pitch: f32,
    /// Yaw measured in degrees around `+y`, zero looks down `+z`.
    pub yaw: f32,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub ratio: f32,
    pub near: f32,
    pub far: f32,
    pub speed: f32,
    pub sensitivity: f32,
}

impl Camera {
    pub fn new(origin: Vec3, fovy: f32, ratio: f32) -> Self {
        Camera {
            origin,
            pitch: 0.,
            yaw: 0.,
            fovy,
            ratio,
            near: 0.1,
            far: 100.,
            speed: 10.,
            sensitivity: 0.25,
        }
    }

    pub fn forward(&self) -> Vec3 {
        let rotation =
            Mat4x4::rotation_y(self.yaw.to_radians()) * Mat4x4::rotation_x(-self.pitch.to_radians());
        rotation
            .transform_vector(Vec3::from([0., 0., 1.]))
            .normalized()
    }

    pub fn right(&self) -> Vec3 {
        Vec3::from([0., 1., 0.]).cross(self.forward()).normalized()
    }

    pub fn up(&self) -> Vec3 {
        let forward = self.forward();
        forward.cross(self.right()).normalized()
    }

    /// Inverse of the camera-to-world transform. The basis is orthonormal, so the inverse is the
    /// transposed rotation followed by the negated, rotated origin.
    #[rustfmt::skip]
    pub fn view_matrix(&self) -> Mat4x4 {
        let forward = self.forward();
        let right = Vec3::from([0., 1., 0.]).cross(forward).normalized();
        let up = forward.cross(right).normalized();
        let o = self.origin;
        Mat4x4::from([[  right.x,   right.y,   right.z,   -right.dot(o)],
                      [     up.x,      up.y,      up.z,      -up.dot(o)],
                      [forward.x, forward.y, forward.z, -forward.dot(o)],
                      [       0.,        0.,        0.,              1.]])
    }

    pub fn projection_matrix(&self) -> Mat4x4 {
        Mat4x4::perspective(self.ratio, self.fovy, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4x4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Rotates by mouse deltas, scaled by the sensitivity.
    pub fn rotate_delta(&mut self, delta_pitch: f32, delta_yaw: f32) {
        self.pitch = (self.pitch + delta_pitch * self.sensitivity).clamp(-MAX_PITCH, MAX_PITCH);
        self.yaw = (self.yaw + delta_yaw * self.sensitivity) % 360.;
    }

    /// Moves along the camera axes: `x` to the right, `y` up and `z` forward, scaled by the speed.
    pub fn move_delta(&mut self, axis: Vec3) {
        let delta = self.right() * axis.x + self.up() * axis.y + self.forward() * axis.z;
        self.origin += delta * self.speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).mag() < 1e-5, "{:?} != {:?}", a.to_array(), b.to_array());
    }

    #[test]
    fn default_orientation_looks_down_z() {
        let cam = Camera::new(Vec3::zero(), 90., 1.);
        assert_close(cam.forward(), Vec3::from([0., 0., 1.]));
        assert_close(cam.right(), Vec3::from([1., 0., 0.]));
        assert_close(cam.up(), Vec3::from([0., 1., 0.]));
    }

    #[test]
    fn view_matrix_is_inverse_of_camera_frame() {
        let mut cam = Camera::new(Vec3::from([1., 2., -30.]), 45., 1.5);
        cam.pitch = 20.;
        cam.yaw = -35.;
        let frame = Mat4x4::from_basis(cam.right(), cam.up(), cam.forward(), cam.origin);
        let expected = frame.inverse().unwrap();
        let view = cam.view_matrix();
        for i in 0..4 {
            for j in 0..4 {
                assert!((view[(i, j)] - expected[(i, j)]).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn point_ahead_has_positive_view_depth() {
        let cam = Camera::new(Vec3::from([0., 0., -10.]), 60., 1.);
        let p = cam.view_matrix().transform_point(Vec3::zero());
        assert_close(p, Vec3::from([0., 0., 10.]));
    }

    #[test]
    fn positive_pitch_looks_up() {
        let mut cam = Camera::new(Vec3::zero(), 60., 1.);
        cam.rotate_delta(100., 0.);
        assert!(cam.forward().y > 0.);
        cam.rotate_delta(10_000., 0.);
        assert_eq!(cam.pitch, MAX_PITCH);
    }

    #[test]
    fn move_delta_follows_camera_axes() {
        let mut cam = Camera::new(Vec3::zero(), 60., 1.);
        cam.speed = 2.;
        cam.yaw = 90.;
        cam.move_delta(Vec3::from([0., 0., 1.]));
        assert_close(cam.origin, Vec3::from([2., 0., 0.]));
    }
}

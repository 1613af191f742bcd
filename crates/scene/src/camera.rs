use glam::{Mat4, Vec3};

/// Perspective camera with a cached projection matrix.
///
/// Changing `fov`, `aspect`, `near` or `far` has no effect on
/// [`projection_matrix`](Self::projection_matrix) until
/// [`update_projection_matrix`](Self::update_projection_matrix) is called.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Mat4,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(50.0, 1.0, 0.1, 2000.0)
    }
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            up: Vec3::Y,
            fov,
            aspect,
            near,
            far,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Recompute the projection from the current frustum parameters.
    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far);
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_camera() -> PerspectiveCamera {
        let mut cam = PerspectiveCamera::new(75.0, 800.0 / 600.0, 0.1, 1000.0);
        cam.set_position(Vec3::new(5.0, 5.0, 5.0));
        cam.look_at(Vec3::ZERO);
        cam
    }

    #[test]
    fn target_projects_to_screen_center() {
        let cam = scene_camera();
        let clip = cam.view_projection() * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn projection_is_cached_until_updated() {
        let mut cam = scene_camera();
        let before = cam.projection_matrix();
        cam.aspect = 2.0;
        assert_eq!(cam.projection_matrix(), before);
        cam.update_projection_matrix();
        assert_ne!(cam.projection_matrix(), before);
        let expected = Mat4::perspective_rh(75f32.to_radians(), 2.0, 0.1, 1000.0);
        assert!(cam.projection_matrix().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn view_projection_has_no_nan() {
        let vp = scene_camera().view_projection();
        assert!(!vp.is_nan());
    }
}

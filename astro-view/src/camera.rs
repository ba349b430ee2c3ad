use crate::config::SceneConfig;
use astro_gl::linear::{
    matrix4x4f_create_frustum, matrix4x4f_create_look_at, matrix4x4f_identity, Matrix4x4f,
    Vector3f,
};

/// Projection and view for one surface. The projection only exists after the first resize.
pub struct Camera {
    eye: Vector3f,
    target: Vector3f,
    up: Vector3f,
    near: f32,
    far: f32,
    projection: Option<Matrix4x4f>,
    view: Matrix4x4f,
}

impl Camera {
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            eye: config.eye,
            target: config.target,
            up: config.up,
            near: config.near,
            far: config.far,
            projection: None,
            view: matrix4x4f_identity(),
        }
    }

    /// Frustum spanning `±width/height` horizontally and `±1` vertically at the near plane.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        let ratio = width as f32 / height as f32;
        self.projection = Some(matrix4x4f_create_frustum(
            -ratio, ratio, -1.0, 1.0, self.near, self.far,
        ));
    }

    pub fn update_view(&mut self) {
        self.view = matrix4x4f_create_look_at(&self.eye, &self.target, &self.up);
    }

    pub fn projection(&self) -> Option<&Matrix4x4f> {
        self.projection.as_ref()
    }

    pub fn view(&self) -> &Matrix4x4f {
        &self.view
    }

    /// `projection * view * model`, or `None` before the first resize
    pub fn mvp(&self, model: &Matrix4x4f) -> Option<Matrix4x4f> {
        self.projection
            .as_ref()
            .map(|projection| projection * &self.view * model)
    }

    pub fn forget_projection(&mut self) {
        self.projection = None;
    }
}

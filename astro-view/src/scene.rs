use crate::camera::Camera;
use crate::config::SceneConfig;
use crate::cube::Cube;
use crate::errors::SceneError;
use crate::square::Square;
use crate::texture::background_bitmap;
use crate::SurfaceRenderer;
use astro_gl::errors::GLErrorWrapper;
use astro_gl::gl_fancy::GPUState;
use astro_gl::linear::{matrix4x4f_identity, Matrix4x4f, Vector3f};

/// Something the render loop can draw once it knows the full MVP.
pub trait Renderable {
    /// use program, upload `mvp`, enable attributes, bind textures, draw, disable attributes
    fn draw(&self, mvp: &Matrix4x4f, gpu_state: &GPUState) -> Result<(), GLErrorWrapper>;

    /// Free the GPU objects now. Safe to call more than once, and `Drop` will not free them again.
    fn dispose(&mut self);
}

/// Where a shape sits in the world for a given frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Placement {
    /// scaled in x/y, then pushed back to `depth`
    Backdrop { scale: f32, depth: f32 },
    /// rotated by the frame's angle about `axis`, after a uniform scale
    Spinning { axis: Vector3f, scale: f32 },
}

impl Placement {
    /// Model matrix; each transform is post-multiplied onto identity.
    pub fn model(&self, rotation_angle: f32) -> Matrix4x4f {
        match self {
            Placement::Backdrop { scale, depth } => matrix4x4f_identity()
                .scaled(*scale, *scale, 1.0)
                .translated(0.0, 0.0, *depth),
            Placement::Spinning { axis, scale } => matrix4x4f_identity()
                .rotated(rotation_angle, axis)
                .scaled(*scale, *scale, *scale),
        }
    }
}

pub struct PlacedShape {
    pub shape: Box<dyn Renderable>,
    pub placement: Placement,
}

//

enum SceneState {
    Uninitialized,
    /// shapes in draw order
    Ready(Vec<PlacedShape>),
}

/// Per-surface render state: the shapes, the camera and the cube's angle.
/// Must be driven from the thread that owns the GL context.
pub struct RenderLoop {
    gpu_state: GPUState,
    config: SceneConfig,
    camera: Camera,
    state: SceneState,
    rotation_angle: f32,
}

impl RenderLoop {
    pub fn new(gpu_state: GPUState, config: SceneConfig) -> Self {
        let camera = Camera::new(&config);
        Self {
            gpu_state,
            config,
            camera,
            state: SceneState::Uninitialized,
            rotation_angle: 0.0,
        }
    }

    /// degrees, grows by the configured step after every frame
    pub fn rotation_angle(&self) -> f32 {
        self.rotation_angle
    }

    pub fn projection(&self) -> Option<&Matrix4x4f> {
        self.camera.projection()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, SceneState::Ready(_))
    }

    pub fn shape_count(&self) -> usize {
        match &self.state {
            SceneState::Uninitialized => 0,
            SceneState::Ready(shapes) => shapes.len(),
        }
    }

    /// Background first so the translucent cube blends over it.
    fn build_shapes(&self) -> Result<Vec<PlacedShape>, SceneError> {
        let bitmap = background_bitmap()?;
        let square = Square::new(&self.gpu_state, bitmap)?;
        // an error here drops `square`, which frees its GPU objects
        let cube = Cube::new(&self.gpu_state)?;
        Ok(vec![
            PlacedShape {
                shape: Box::new(square),
                placement: Placement::Backdrop {
                    scale: self.config.backdrop_scale,
                    depth: self.config.backdrop_depth,
                },
            },
            PlacedShape {
                shape: Box::new(cube),
                placement: Placement::Spinning {
                    axis: self.config.rotation_axis,
                    scale: self.config.cube_scale,
                },
            },
        ])
    }

    /// Dispose every shape and go back to waiting for a surface.
    pub fn release_gpu_resources(&mut self) {
        if let SceneState::Ready(shapes) = &mut self.state {
            for placed in shapes.iter_mut() {
                placed.shape.dispose();
            }
            log::debug!("released {} shapes", shapes.len());
        }
        self.state = SceneState::Uninitialized;
        self.camera.forget_projection();
    }
}

impl SurfaceRenderer for RenderLoop {
    fn on_surface_created(&mut self) -> Result<(), SceneError> {
        // a fresh context invalidates anything built for the old one
        self.release_gpu_resources();

        let shapes = match self.build_shapes() {
            Ok(shapes) => shapes,
            Err(e) => {
                log::error!("failed to build the scene: {}", e);
                return Err(e);
            }
        };

        self.gpu_state.clear_color(&self.config.clear_color)?;
        self.gpu_state.enable(gl::DEPTH_TEST)?;
        self.gpu_state.enable(gl::BLEND)?;
        self.gpu_state
            .blend_func(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA)?;

        log::debug!("scene ready with {} shapes", shapes.len());
        self.state = SceneState::Ready(shapes);
        Ok(())
    }

    fn on_surface_resized(&mut self, width: u32, height: u32) -> Result<(), SceneError> {
        if width == 0 || height == 0 {
            log::debug!("ignoring degenerate surface size {}x{}", width, height);
            return Ok(());
        }
        self.gpu_state
            .viewport(width as i32, height as i32)?;
        self.camera.on_resize(width, height);
        log::debug!("surface resized to {}x{}", width, height);
        Ok(())
    }

    fn on_draw_frame(&mut self) -> Result<(), SceneError> {
        let SceneState::Ready(shapes) = &self.state else {
            return Err(SceneError::NotReady("frame requested before surface creation"));
        };
        if self.camera.projection().is_none() {
            return Err(SceneError::NotReady("frame requested before first resize"));
        }

        self.gpu_state
            .clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT)?;

        self.camera.update_view();

        for placed in shapes {
            let model = placed.placement.model(self.rotation_angle);
            let mvp = self
                .camera
                .mvp(&model)
                .ok_or(SceneError::NotReady("projection vanished mid-frame"))?;
            placed.shape.draw(&mvp, &self.gpu_state)?;
        }

        self.rotation_angle += self.config.rotation_step;
        log::trace!("frame done, rotation {}", self.rotation_angle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astro_gl::linear::matrix4x4f_transform_point;
    use astro_gl::recording::{GlCall, RecordingGl};
    use std::rc::Rc;

    const EPSILON: f32 = 1e-5;

    fn recording_loop(gl: &Rc<RecordingGl>) -> RenderLoop {
        RenderLoop::new(GPUState::new(gl.clone()), SceneConfig::default())
    }

    #[test]
    fn created_resized_one_frame() {
        let gl = Rc::new(RecordingGl::new());
        let mut render_loop = recording_loop(&gl);

        render_loop.on_surface_created().unwrap();
        render_loop.on_surface_resized(800, 600).unwrap();
        render_loop.on_draw_frame().unwrap();

        assert_eq!(render_loop.rotation_angle(), 0.5);
        assert_eq!(render_loop.shape_count(), 2);

        let calls = gl.calls();
        let draws: Vec<&GlCall> = calls.iter().filter(|c| c.is_draw()).collect();
        assert_eq!(draws.len(), 2);
        assert!(matches!(
            draws[0],
            GlCall::DrawArrays {
                mode: gl::TRIANGLE_FAN,
                first: 0,
                count: 4
            }
        ));
        assert!(matches!(
            draws[1],
            GlCall::DrawElements {
                mode: gl::TRIANGLES,
                count: 36,
                ..
            }
        ));

        let first_draw = calls.iter().position(GlCall::is_draw).unwrap();
        let depth = calls
            .iter()
            .position(|c| *c == GlCall::Enable(gl::DEPTH_TEST))
            .unwrap();
        let blend = calls
            .iter()
            .position(|c| *c == GlCall::Enable(gl::BLEND))
            .unwrap();
        assert!(depth < first_draw);
        assert!(blend < first_draw);
        assert!(calls.contains(&GlCall::BlendFunc {
            sfactor: gl::SRC_ALPHA,
            dfactor: gl::ONE_MINUS_SRC_ALPHA
        }));
        assert!(calls.contains(&GlCall::Viewport {
            x: 0,
            y: 0,
            width: 800,
            height: 600
        }));
        assert!(calls.contains(&GlCall::ClearColor([0.0, 0.0, 0.0, 1.0])));

        // cleared before anything is drawn
        let clear = calls
            .iter()
            .position(|c| *c == GlCall::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT))
            .unwrap();
        assert!(clear < first_draw);
    }

    #[test]
    fn rotation_advances_half_a_degree_per_frame() {
        let gl = Rc::new(RecordingGl::new());
        let mut render_loop = recording_loop(&gl);
        render_loop.on_surface_created().unwrap();
        render_loop.on_surface_resized(640, 480).unwrap();
        for _ in 0..1000 {
            render_loop.on_draw_frame().unwrap();
        }
        assert_eq!(render_loop.rotation_angle(), 500.0);
    }

    #[test]
    fn frames_need_create_and_resize() {
        let gl = Rc::new(RecordingGl::new());
        let mut render_loop = recording_loop(&gl);
        assert!(matches!(
            render_loop.on_draw_frame(),
            Err(SceneError::NotReady(_))
        ));
        render_loop.on_surface_created().unwrap();
        assert!(render_loop.projection().is_none());
        assert!(matches!(
            render_loop.on_draw_frame(),
            Err(SceneError::NotReady(_))
        ));
        assert_eq!(gl.count(GlCall::is_draw), 0);
        assert_eq!(render_loop.rotation_angle(), 0.0);
    }

    #[test]
    fn zero_height_keeps_the_old_projection() {
        let gl = Rc::new(RecordingGl::new());
        let mut render_loop = recording_loop(&gl);
        render_loop.on_surface_created().unwrap();
        render_loop.on_surface_resized(800, 600).unwrap();
        let before = *render_loop.projection().unwrap();
        render_loop.on_surface_resized(800, 0).unwrap();
        assert_eq!(render_loop.projection(), Some(&before));
    }

    #[test]
    fn background_corners_land_on_expected_clip_coordinates() {
        let gl = Rc::new(RecordingGl::new());
        let mut render_loop = recording_loop(&gl);
        render_loop.on_surface_created().unwrap();
        render_loop.on_surface_resized(800, 600).unwrap();
        render_loop.on_draw_frame().unwrap();

        let model = Placement::Backdrop {
            scale: 6.0,
            depth: -1.0,
        }
        .model(0.0);
        let mvp = render_loop.camera().mvp(&model).unwrap();

        // world (±6, ±6, -1), eye space z = -4
        let ratio = 800.0f32 / 600.0;
        let z_clip = (-11.0 / 9.0) * -4.0 - 20.0 / 9.0;
        for (x, y) in [(-1.0f32, 1.0f32), (-1.0, -1.0), (1.0, -1.0), (1.0, 1.0)] {
            let clip = matrix4x4f_transform_point(&mvp, &Vector3f::new(x, y, 0.0));
            let expected = [6.0 * x / ratio, 6.0 * y, z_clip, 4.0];
            for (a, e) in clip.iter().zip(expected.iter()) {
                assert!((a - e).abs() < EPSILON, "{:?} != {:?}", clip, expected);
            }
        }

        // and the uploaded uniform is exactly that matrix
        assert!(gl.calls().contains(&GlCall::UniformMatrix4fv {
            location: 0,
            value: *mvp.slice()
        }));
    }

    #[test]
    fn cube_model_rotates_then_scales() {
        let placement = Placement::Spinning {
            axis: Vector3f::new(1.0, 1.0, 0.0),
            scale: 0.5,
        };
        let at_rest = placement.model(0.0);
        let corner = matrix4x4f_transform_point(&at_rest, &Vector3f::new(1.0, 1.0, 1.0));
        for (a, e) in corner.iter().zip([0.5, 0.5, 0.5, 1.0].iter()) {
            assert!((a - e).abs() < EPSILON);
        }
        // a point on the axis only scales, whatever the angle
        let turned = placement.model(123.0);
        let on_axis = matrix4x4f_transform_point(&turned, &Vector3f::new(1.0, 1.0, 0.0));
        for (a, e) in on_axis.iter().zip([0.5, 0.5, 0.0, 1.0].iter()) {
            assert!((a - e).abs() < EPSILON);
        }
    }

    #[test]
    fn broken_cube_shader_releases_the_square() {
        let gl = Rc::new(RecordingGl::failing_compile_on("aColor"));
        let mut render_loop = recording_loop(&gl);

        let err = render_loop.on_surface_created().unwrap_err();
        assert!(matches!(
            err,
            SceneError::GL(GLErrorWrapper::ShaderCompile { .. })
        ));
        assert!(!render_loop.is_ready());

        // the square's program, vertex buffer and texture, each freed once
        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteProgram(_))), 1);
        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteBuffer(_))), 1);
        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteTexture(_))), 1);
        // the cube never got a program object
        assert_eq!(gl.count(|c| matches!(c, GlCall::CreateProgram(_))), 1);
        // nothing was configured for drawing
        assert_eq!(gl.count(|c| matches!(c, GlCall::Enable(_))), 0);
    }

    #[test]
    fn release_then_drop_frees_everything_once() {
        let gl = Rc::new(RecordingGl::new());
        let mut render_loop = recording_loop(&gl);
        render_loop.on_surface_created().unwrap();
        render_loop.on_surface_resized(800, 600).unwrap();
        render_loop.on_draw_frame().unwrap();

        render_loop.release_gpu_resources();
        assert!(!render_loop.is_ready());
        assert!(render_loop.projection().is_none());
        render_loop.release_gpu_resources();
        drop(render_loop);

        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteProgram(_))), 2);
        // square vbo; cube positions, indices, colours
        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteBuffer(_))), 4);
        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteTexture(_))), 1);
    }

    #[test]
    fn recreating_the_surface_rebuilds_cleanly() {
        let gl = Rc::new(RecordingGl::new());
        let mut render_loop = recording_loop(&gl);
        render_loop.on_surface_created().unwrap();
        render_loop.on_surface_created().unwrap();
        assert_eq!(render_loop.shape_count(), 2);
        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteProgram(_))), 2);
        assert_eq!(gl.count(|c| matches!(c, GlCall::CreateProgram(_))), 4);
    }
}

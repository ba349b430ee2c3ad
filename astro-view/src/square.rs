use crate::scene::Renderable;
use crate::texture::{load_texture, Bitmap};
use astro_gl::errors::GLErrorWrapper;
use astro_gl::gl_fancy::{GPUState, GeometryBuffer};
use astro_gl::gl_helper::Texture;
use astro_gl::linear::Matrix4x4f;
use astro_shaders::geometry::{square_layout, SQUARE_XYZUV};
use astro_shaders::textured_shader::TexturedShader;

/// The textured quad behind everything else.
pub struct Square {
    pub program: TexturedShader,
    pub buffers: GeometryBuffer,
    pub texture: Texture,
}

impl Square {
    pub fn new(gpu_state: &GPUState, bitmap: Bitmap) -> Result<Self, GLErrorWrapper> {
        let program = TexturedShader::new(gpu_state)?;
        let buffers = GeometryBuffer::new(gpu_state, &SQUARE_XYZUV, None, square_layout())?;
        let texture = load_texture(gpu_state, bitmap)?;

        Ok(Self {
            program,
            buffers,
            texture,
        })
    }
}

impl Renderable for Square {
    fn draw(&self, mvp: &Matrix4x4f, gpu_state: &GPUState) -> Result<(), GLErrorWrapper> {
        self.program.program.use_()?;
        self.program.set_mvp(mvp)?;

        let mut attributes = gpu_state.enabled_attributes();
        self.buffers
            .rig_attributes(&self.program.program, &mut attributes)?;

        self.program.set_texture(&self.texture, gl::TEXTURE_2D, 0)?;

        self.buffers.draw_arrays(gpu_state, gl::TRIANGLE_FAN)?;

        drop(attributes);

        Ok(())
    }

    fn dispose(&mut self) {
        self.program.program.release();
        self.buffers.release();
        self.texture.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::starfield;
    use astro_gl::linear::matrix4x4f_identity;
    use astro_gl::recording::{GlCall, RecordingGl};
    use std::rc::Rc;

    fn positions(calls: &[GlCall], wanted: impl Fn(&GlCall) -> bool) -> Vec<usize> {
        calls
            .iter()
            .enumerate()
            .filter(|(_, c)| wanted(c))
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn texture_is_bound_between_rigging_and_the_fan() {
        let gl = Rc::new(RecordingGl::new());
        let gpu_state = GPUState::new(gl.clone());
        let square = Square::new(&gpu_state, starfield(4, 4)).unwrap();
        gl.clear_calls();

        square.draw(&matrix4x4f_identity(), &gpu_state).unwrap();

        let calls = gl.calls();
        assert_eq!(calls[0], GlCall::UseProgram(square.program.program.borrow()));
        assert!(matches!(calls[1], GlCall::UniformMatrix4fv { .. }));

        let draw = calls.iter().position(GlCall::is_draw).unwrap();
        assert_eq!(
            calls[draw],
            GlCall::DrawArrays {
                mode: gl::TRIANGLE_FAN,
                first: 0,
                count: 4
            }
        );

        let enabled = positions(&calls, |c| matches!(c, GlCall::EnableVertexAttribArray(_)));
        let disabled = positions(&calls, |c| matches!(c, GlCall::DisableVertexAttribArray(_)));
        assert_eq!(enabled.len(), 2);
        assert_eq!(disabled.len(), 2);
        assert!(disabled.iter().all(|i| *i > draw));

        let last_enable = *enabled.iter().max().unwrap();
        let texture_steps = [
            positions(&calls, |c| *c == GlCall::ActiveTexture(gl::TEXTURE0)),
            positions(&calls, |c| {
                *c == GlCall::BindTexture {
                    target: gl::TEXTURE_2D,
                    texture: square.texture.borrow(),
                }
            }),
            positions(&calls, |c| matches!(c, GlCall::Uniform1i { value: 0, .. })),
        ];
        for step in texture_steps.iter() {
            assert_eq!(step.len(), 1);
            assert!(step[0] > last_enable && step[0] < draw);
        }
        assert!(texture_steps[0][0] < texture_steps[1][0]);
        assert!(texture_steps[1][0] < texture_steps[2][0]);
        assert!(calls.contains(&GlCall::VertexAttribPointer {
            index: 1,
            size: 2,
            kind: gl::FLOAT,
            stride: 20,
            offset: 12
        }));
    }

    #[test]
    fn dispose_then_drop_releases_once() {
        let gl = Rc::new(RecordingGl::new());
        let gpu_state = GPUState::new(gl.clone());
        let mut square = Square::new(&gpu_state, starfield(2, 2)).unwrap();
        square.dispose();
        drop(square);
        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteProgram(_))), 1);
        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteBuffer(_))), 1);
        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteTexture(_))), 1);
    }
}

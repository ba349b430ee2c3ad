use astro_gl::errors::GLErrorWrapper;
use astro_gl::gl_fancy::GPUState;
use astro_gl::gl_helper::{Program, Texture};
use astro_gl::linear::Matrix4x4f;
use gl::types::{GLenum, GLint, GLuint};

/// Samples one 2D texture through interpolated texture coordinates.
pub struct TexturedShader {
    pub program: Program,
}

impl TexturedShader {
    pub const ATTRIBUTE_POSITION: &'static str = "aPosition";
    pub const ATTRIBUTE_TEX_COORD: &'static str = "aTexCoord";
    pub const UNIFORM_MVP: &'static str = "uMVPMatrix";
    pub const UNIFORM_TEXTURE: &'static str = "uTexture";

    pub fn new(gpu_state: &GPUState) -> Result<Self, GLErrorWrapper> {
        let program = Program::compile(gpu_state, shader_v_src(), shader_f_src())?;

        log::debug!(
            "attribute, uniform locations {:?} {:?}  {:?} {:?}",
            program.attribute_location(Self::ATTRIBUTE_POSITION),
            program.attribute_location(Self::ATTRIBUTE_TEX_COORD),
            program.uniform_location(Self::UNIFORM_MVP),
            program.uniform_location(Self::UNIFORM_TEXTURE),
        );

        Ok(Self { program })
    }

    pub fn set_mvp(&self, mvp: &Matrix4x4f) -> Result<(), GLErrorWrapper> {
        self.program.set_mat4u(Self::UNIFORM_MVP, mvp.slice())
    }

    /// Bind `texture` to `texture_unit` and point the sampler at it.
    pub fn set_texture(
        &self,
        texture: &Texture,
        target: GLenum,
        texture_unit: GLuint,
    ) -> Result<(), GLErrorWrapper> {
        texture.bind_to_unit(texture_unit, target)?;
        self.program
            .set_uniform_1i(Self::UNIFORM_TEXTURE, texture_unit as GLint)
    }
}

fn shader_v_src() -> &'static str {
    "
attribute vec4 aPosition;
attribute vec2 aTexCoord;
varying vec2 vTexCoord;
uniform mat4 uMVPMatrix;

void main()
{
    gl_Position = uMVPMatrix * aPosition;
    vTexCoord = aTexCoord;
}
"
}

fn shader_f_src() -> &'static str {
    "precision mediump float;
varying vec2 vTexCoord;
uniform sampler2D uTexture;

void main()
{
    gl_FragColor = texture2D(uTexture, vTexCoord);
}
"
}

#[cfg(test)]
mod tests {
    use super::*;
    use astro_gl::linear::matrix4x4f_identity;
    use astro_gl::recording::{GlCall, RecordingGl};
    use std::rc::Rc;

    #[test]
    fn resolves_declared_names() {
        let gl = Rc::new(RecordingGl::new());
        let gpu_state = GPUState::new(gl.clone());
        let shader = TexturedShader::new(&gpu_state).unwrap();

        assert_eq!(shader.program.attribute_location("aPosition"), Some(0));
        assert_eq!(shader.program.attribute_location("aTexCoord"), Some(1));
        assert!(shader.program.uniform_location("uMVPMatrix").is_some());
        assert!(shader.program.uniform_location("uTexture").is_some());
        assert_eq!(shader.program.attribute_location("aColor"), None);
    }

    #[test]
    fn sampler_reads_the_unit_the_texture_is_bound_to() {
        let gl = Rc::new(RecordingGl::new());
        let gpu_state = GPUState::new(gl.clone());
        let shader = TexturedShader::new(&gpu_state).unwrap();
        let texture = Texture::new(&gpu_state).unwrap();
        gl.clear_calls();

        shader.set_mvp(&matrix4x4f_identity()).unwrap();
        shader.set_texture(&texture, gl::TEXTURE_2D, 0).unwrap();

        let calls = gl.calls();
        assert!(matches!(calls[0], GlCall::UniformMatrix4fv { .. }));
        assert_eq!(calls[1], GlCall::ActiveTexture(gl::TEXTURE0));
        assert_eq!(
            calls[2],
            GlCall::BindTexture {
                target: gl::TEXTURE_2D,
                texture: texture.borrow()
            }
        );
        assert!(matches!(calls[3], GlCall::Uniform1i { value: 0, .. }));
    }
}

use astro_gl::errors::GLErrorWrapper;
use astro_gl::gl_fancy::GPUState;
use astro_gl::gl_helper::Program;
use astro_gl::linear::Matrix4x4f;

/// Per-vertex RGBA colour, alpha included, so blending sees it.
pub struct VertexColorShader {
    pub program: Program,
}

impl VertexColorShader {
    pub const ATTRIBUTE_POSITION: &'static str = "aPosition";
    pub const ATTRIBUTE_COLOR: &'static str = "aColor";
    pub const UNIFORM_MVP: &'static str = "uMVPMatrix";

    pub fn new(gpu_state: &GPUState) -> Result<Self, GLErrorWrapper> {
        const VERTEX_SHADER: &str = "
attribute vec4 aPosition;
attribute vec4 aColor;
varying vec4 vColor;
uniform mat4 uMVPMatrix;

void main() {
    gl_Position = uMVPMatrix * aPosition;
    vColor = aColor;
}
            ";
        const FRAGMENT_SHADER: &str = "
precision mediump float;
varying vec4 vColor;

void main() {
    gl_FragColor = vColor;
}
            ";
        let program = Program::compile(gpu_state, VERTEX_SHADER, FRAGMENT_SHADER)?;
        log::debug!(
            "attribute, uniform locations {:?} {:?}  {:?}",
            program.attribute_location(Self::ATTRIBUTE_POSITION),
            program.attribute_location(Self::ATTRIBUTE_COLOR),
            program.uniform_location(Self::UNIFORM_MVP),
        );
        Ok(Self { program })
    }

    pub fn set_mvp(&self, mvp: &Matrix4x4f) -> Result<(), GLErrorWrapper> {
        self.program.set_mat4u(Self::UNIFORM_MVP, mvp.slice())
    }
}

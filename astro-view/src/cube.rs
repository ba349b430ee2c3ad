use crate::scene::Renderable;
use astro_gl::errors::GLErrorWrapper;
use astro_gl::gl_fancy::{GPUState, GeometryBuffer};
use astro_gl::linear::Matrix4x4f;
use astro_shaders::geometry::{
    cube_color_layout, cube_colors, cube_position_layout, CUBE_INDICES, CUBE_POSITIONS,
};
use astro_shaders::vertex_color_shader::VertexColorShader;

/// Translucent grey cube; positions and colours live in separate buffers.
pub struct Cube {
    pub program: VertexColorShader,
    pub positions: GeometryBuffer,
    pub colors: GeometryBuffer,
}

impl Cube {
    pub fn new(gpu_state: &GPUState) -> Result<Self, GLErrorWrapper> {
        let program = VertexColorShader::new(gpu_state)?;
        let positions = GeometryBuffer::new(
            gpu_state,
            &CUBE_POSITIONS,
            Some(&CUBE_INDICES[..]),
            cube_position_layout(),
        )?;
        let colors = GeometryBuffer::new(gpu_state, &cube_colors(), None, cube_color_layout())?;

        Ok(Self {
            program,
            positions,
            colors,
        })
    }
}

impl Renderable for Cube {
    fn draw(&self, mvp: &Matrix4x4f, gpu_state: &GPUState) -> Result<(), GLErrorWrapper> {
        self.program.program.use_()?;
        self.program.set_mvp(mvp)?;

        let mut attributes = gpu_state.enabled_attributes();
        self.positions
            .rig_attributes(&self.program.program, &mut attributes)?;
        self.colors
            .rig_attributes(&self.program.program, &mut attributes)?;

        self.positions.draw_elements(gpu_state, gl::TRIANGLES)?;

        drop(attributes);

        Ok(())
    }

    fn dispose(&mut self) {
        self.program.program.release();
        self.positions.release();
        self.colors.release();
    }
}

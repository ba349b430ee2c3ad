pub mod geometry;
pub mod textured_shader;
pub mod vertex_color_shader;

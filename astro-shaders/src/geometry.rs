//! Vertex data for the two fixed shapes and the layouts that describe it.

use crate::textured_shader::TexturedShader;
use crate::vertex_color_shader::VertexColorShader;
use astro_gl::gl_fancy::{AttributeSpec, VertexLayout};
use astro_gl::linear::Vector3f;
use gl::types::{GLfloat, GLushort};
use itertools::Itertools;

/// x, y, z, u, v per corner; v grows downward like image rows.
#[rustfmt::skip]
pub const SQUARE_XYZUV: [GLfloat; 20] = [
    -1.0, 1.0, 0.0,   0.0, 0.0, // top left
    -1.0, -1.0, 0.0,  0.0, 1.0, // bottom left
    1.0, -1.0, 0.0,   1.0, 1.0, // bottom right
    1.0, 1.0, 0.0,    1.0, 0.0, // top right
];

pub fn square_layout() -> VertexLayout {
    VertexLayout::new(
        5,
        &[
            AttributeSpec::new(TexturedShader::ATTRIBUTE_POSITION, 0, 3),
            AttributeSpec::new(TexturedShader::ATTRIBUTE_TEX_COORD, 3, 2),
        ],
    )
}

#[rustfmt::skip]
pub const CUBE_POSITIONS: [GLfloat; 24] = [
    -1.0, 1.0, 1.0,
    -1.0, -1.0, 1.0,
    1.0, -1.0, 1.0,
    1.0, 1.0, 1.0,
    -1.0, 1.0, -1.0,
    -1.0, -1.0, -1.0,
    1.0, -1.0, -1.0,
    1.0, 1.0, -1.0,
];

/// two counter-clockwise triangles per face
#[rustfmt::skip]
pub const CUBE_INDICES: [GLushort; 36] = [
    0, 1, 2, 0, 2, 3, // front
    3, 2, 6, 3, 6, 7, // right
    7, 6, 5, 7, 5, 4, // back
    4, 5, 1, 4, 1, 0, // left
    4, 0, 3, 4, 3, 7, // top
    1, 5, 6, 1, 6, 2, // bottom
];

pub const CUBE_COLOR: [GLfloat; 4] = [0.5, 0.5, 0.5, 0.6];

/// [`CUBE_COLOR`] once per cube vertex
pub fn cube_colors() -> Vec<GLfloat> {
    CUBE_COLOR
        .iter()
        .copied()
        .cycle()
        .take(CUBE_COLOR.len() * CUBE_POSITIONS.len() / 3)
        .collect()
}

pub fn cube_position_layout() -> VertexLayout {
    VertexLayout::new(
        3,
        &[AttributeSpec::new(VertexColorShader::ATTRIBUTE_POSITION, 0, 3)],
    )
}

pub fn cube_color_layout() -> VertexLayout {
    VertexLayout::new(
        4,
        &[AttributeSpec::new(VertexColorShader::ATTRIBUTE_COLOR, 0, 4)],
    )
}

//

pub fn vertex_at(positions: &[GLfloat], index: GLushort) -> Vector3f {
    let base = index as usize * 3;
    Vector3f::new(positions[base], positions[base + 1], positions[base + 2])
}

/// Group an index list into triangles of vertex positions.
pub fn triangles(positions: &[GLfloat], indices: &[GLushort]) -> Vec<[Vector3f; 3]> {
    indices
        .iter()
        .tuples()
        .map(|(a, b, c)| {
            [
                vertex_at(positions, *a),
                vertex_at(positions, *b),
                vertex_at(positions, *c),
            ]
        })
        .collect()
}

/// counter-clockwise winding normal, not normalized
pub fn winding_normal(triangle: &[Vector3f; 3]) -> Vector3f {
    let [a, b, c] = *triangle;
    (b - a).cross(&(c - a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_indices_cover_every_vertex_once_per_corner() {
        assert_eq!(CUBE_INDICES.len(), 36);
        assert_eq!(CUBE_INDICES.iter().unique().count(), 8);
        assert!(CUBE_INDICES.iter().all(|i| (*i as usize) < CUBE_POSITIONS.len() / 3));
    }

    #[test]
    fn cube_faces_point_outward() {
        let triangles = triangles(&CUBE_POSITIONS, &CUBE_INDICES);
        assert_eq!(triangles.len(), 12);
        for (i, triangle) in triangles.iter().enumerate() {
            let centroid = (triangle[0] + triangle[1] + triangle[2]).scaled(1.0 / 3.0);
            let normal = winding_normal(triangle);
            assert!(
                normal.dot(&centroid) > 0.0,
                "triangle {} winds inward: normal {:?} centroid {:?}",
                i,
                normal,
                centroid
            );
        }
    }

    #[test]
    fn cube_is_translucent_grey() {
        let colors = cube_colors();
        assert_eq!(colors.len(), 32);
        for rgba in colors.chunks(4) {
            assert_eq!(rgba, &CUBE_COLOR[..]);
        }
    }

    #[test]
    fn square_is_a_fan_of_five_float_records() {
        let layout = square_layout();
        assert_eq!(layout.stride_bytes(), 20);
        assert_eq!(SQUARE_XYZUV.len() % 5, 0);
        // the fan's corners go around the quad in one direction
        let corners: Vec<Vector3f> = SQUARE_XYZUV
            .chunks(5)
            .map(|r| Vector3f::new(r[0], r[1], r[2]))
            .collect();
        let normal = winding_normal(&[corners[0], corners[1], corners[2]]);
        assert!(normal.z > 0.0);
    }
}

//! 2D colored vertices and procedural geometry

use ash::vk;
use bytemuck::{Pod, Zeroable};
use nalgebra::Vector2;

/// Corner colors used for generated triangles (top, right, left)
pub const CORNER_COLORS: [[f32; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Vertex with a 2D position and an RGB color
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in normalized device coordinates
    pub position: [f32; 2],
    /// Linear RGB color
    pub color: [f32; 3],
}

impl Vertex {
    /// Create a vertex
    pub fn new(position: Vector2<f32>, color: [f32; 3]) -> Self {
        Self {
            position: [position.x, position.y],
            color,
        }
    }

    /// Single interleaved binding
    pub fn binding_descriptions() -> Vec<vk::VertexInputBindingDescription> {
        vec![vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Self>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }]
    }

    /// Location 0: position, location 1: color
    pub fn attribute_descriptions() -> Vec<vk::VertexInputAttributeDescription> {
        vec![
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32_SFLOAT,
                offset: 0,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: std::mem::size_of::<[f32; 2]>() as u32,
            },
        ]
    }
}

/// Sierpinski triangle as a flat triangle list
///
/// Depth 0 is the single triangle `left`/`right`/`top`; every level splits
/// each triangle into its three corner sub-triangles, so the result holds
/// `3 * 3^depth` vertices.
pub fn sierpinski(depth: u32, left: Vector2<f32>, right: Vector2<f32>, top: Vector2<f32>) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(3 * 3usize.pow(depth));
    subdivide(&mut vertices, depth, left, right, top);
    vertices
}

fn subdivide(vertices: &mut Vec<Vertex>, depth: u32, left: Vector2<f32>, right: Vector2<f32>, top: Vector2<f32>) {
    if depth == 0 {
        vertices.push(Vertex::new(top, CORNER_COLORS[0]));
        vertices.push(Vertex::new(right, CORNER_COLORS[1]));
        vertices.push(Vertex::new(left, CORNER_COLORS[2]));
        return;
    }

    let left_top = (left + top) * 0.5;
    let right_top = (right + top) * 0.5;
    let left_right = (left + right) * 0.5;
    subdivide(vertices, depth - 1, left, left_right, left_top);
    subdivide(vertices, depth - 1, left_right, right, right_top);
    subdivide(vertices, depth - 1, left_top, right_top, top);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn corners() -> (Vector2<f32>, Vector2<f32>, Vector2<f32>) {
        (
            Vector2::new(-0.9, 0.9),
            Vector2::new(0.9, 0.9),
            Vector2::new(0.0, -0.9),
        )
    }

    #[test]
    fn test_depth_zero_is_one_triangle() {
        let (left, right, top) = corners();
        let vertices = sierpinski(0, left, right, top);

        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[0].position, [0.0, -0.9]);
        assert_eq!(vertices[0].color, CORNER_COLORS[0]);
        assert_eq!(vertices[2].position, [-0.9, 0.9]);
    }

    #[test]
    fn test_vertex_count_grows_by_three() {
        let (left, right, top) = corners();
        for depth in 0..6 {
            assert_eq!(sierpinski(depth, left, right, top).len(), 3 * 3usize.pow(depth));
        }
    }

    #[test]
    fn test_first_level_midpoints() {
        let (left, right, top) = corners();
        let vertices = sierpinski(1, left, right, top);

        // Bottom-left sub-triangle: top corner is the left/top midpoint
        assert_relative_eq!(vertices[0].position[0], -0.45);
        assert_relative_eq!(vertices[0].position[1], 0.0);
        // Its right corner is the left/right midpoint
        assert_relative_eq!(vertices[1].position[0], 0.0);
        assert_relative_eq!(vertices[1].position[1], 0.9);
    }

    #[test]
    fn test_vertices_stay_inside_bounds() {
        let (left, right, top) = corners();
        for vertex in sierpinski(4, left, right, top) {
            assert!(vertex.position[0] >= -0.9 && vertex.position[0] <= 0.9);
            assert!(vertex.position[1] >= -0.9 && vertex.position[1] <= 0.9);
        }
    }

    #[test]
    fn test_attribute_layout_matches_struct() {
        let attributes = Vertex::attribute_descriptions();
        assert_eq!(attributes[1].offset, 8);
        assert_eq!(Vertex::binding_descriptions()[0].stride, 20);
        assert_eq!(bytemuck::cast_slice::<Vertex, u8>(&[Vertex::zeroed()]).len(), 20);
    }
}

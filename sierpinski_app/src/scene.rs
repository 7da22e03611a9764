//! The Sierpinski triangle as a [`Drawable`]

use std::rc::Rc;

use ash::vk;
use frame_engine::config::ShaderConfig;
use frame_engine::render::vulkan::{GraphicsPipeline, VertexBuffer, VulkanDevice};
use frame_engine::render::{sierpinski, Drawable, FrameTarget, RenderError, RenderResult, Vertex};
use nalgebra::Vector2;

/// Vertices of the triangle at `depth`, spanning most of the viewport
pub fn triangle_vertices(depth: u32) -> Vec<Vertex> {
    sierpinski(
        depth,
        Vector2::new(-0.9, 0.9),
        Vector2::new(0.9, 0.9),
        Vector2::new(0.0, -0.9),
    )
}

/// Static geometry plus a pipeline that follows the active render pass
pub struct SierpinskiScene {
    pipeline: Option<GraphicsPipeline>,
    vertices: VertexBuffer,
    shaders: ShaderConfig,
    device: Rc<VulkanDevice>,
}

impl SierpinskiScene {
    /// Upload the triangle; the pipeline is built on the first swapchain build
    pub fn new(device: Rc<VulkanDevice>, depth: u32, shaders: ShaderConfig) -> RenderResult<Self> {
        let vertices = triangle_vertices(depth);
        log::info!("Sierpinski depth {} ({} vertices)", depth, vertices.len());

        let vertices = VertexBuffer::new(device.raw().clone(), device.physical(), &vertices)?;
        Ok(Self {
            pipeline: None,
            vertices,
            shaders,
            device,
        })
    }
}

impl Drawable for SierpinskiScene {
    fn swapchain_rebuilt(&mut self, render_pass: vk::RenderPass, _extent: vk::Extent2D) -> RenderResult<()> {
        if self
            .pipeline
            .as_ref()
            .is_some_and(|pipeline| pipeline.render_pass() == render_pass)
        {
            return Ok(());
        }

        self.pipeline = None;
        self.pipeline = Some(GraphicsPipeline::new(self.device.raw().clone(), render_pass, &self.shaders)?);
        Ok(())
    }

    fn record(&mut self, target: &FrameTarget) -> RenderResult<()> {
        let pipeline = self
            .pipeline
            .as_ref()
            .ok_or_else(|| RenderError::Recording("Pipeline not built".to_string()))?;

        pipeline.bind(target.command_buffer);
        self.vertices.bind(target.command_buffer);
        self.vertices.draw(target.command_buffer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outer_corners_carry_their_colors() {
        let vertices = triangle_vertices(0);
        assert_eq!(vertices[0].position, [0.0, -0.9]);
        assert_eq!(vertices[0].color, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[1].position, [0.9, 0.9]);
        assert_eq!(vertices[1].color, [0.0, 1.0, 0.0]);
        assert_eq!(vertices[2].position, [-0.9, 0.9]);
        assert_eq!(vertices[2].color, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_default_depth_vertex_count() {
        assert_eq!(triangle_vertices(8).len(), 3 * 6561);
    }
}

//! Command pool and frame recording commands

use ash::{vk, Device};

use crate::render::{FrameTarget, RenderResult};

/// Command pool wrapper with RAII cleanup
pub struct CommandPool {
    device: Device,
    command_pool: vk::CommandPool,
}

impl CommandPool {
    /// Create a pool whose buffers can be reset individually
    pub fn new(device: Device, queue_family_index: u32) -> RenderResult<Self> {
        let pool_create_info = vk::CommandPoolCreateInfo::builder()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(queue_family_index);

        let command_pool = unsafe { device.create_command_pool(&pool_create_info, None)? };

        Ok(Self { device, command_pool })
    }

    /// Allocate primary command buffers
    pub fn allocate_command_buffers(&self, count: u32) -> RenderResult<Vec<vk::CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(self.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);

        Ok(unsafe { self.device.allocate_command_buffers(&alloc_info)? })
    }

    /// Return buffers to the pool
    pub fn free_command_buffers(&self, buffers: &[vk::CommandBuffer]) {
        if buffers.is_empty() {
            return;
        }
        unsafe {
            self.device.free_command_buffers(self.command_pool, buffers);
        }
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_command_pool(self.command_pool, None);
        }
    }
}

/// Begin the command buffer and open the render pass on the target framebuffer
///
/// Color is cleared to `clear_color` and depth to 1.0. Viewport and scissor
/// are dynamic state and cover the full extent.
pub fn begin_frame(device: &Device, target: &FrameTarget, clear_color: [f32; 4]) -> RenderResult<()> {
    let begin_info = vk::CommandBufferBeginInfo::builder();

    let clear_values = [
        vk::ClearValue {
            color: vk::ClearColorValue { float32: clear_color },
        },
        vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
        },
    ];

    let render_pass_begin = vk::RenderPassBeginInfo::builder()
        .render_pass(target.render_pass)
        .framebuffer(target.framebuffer)
        .render_area(target.render_area())
        .clear_values(&clear_values);

    unsafe {
        device.begin_command_buffer(target.command_buffer, &begin_info)?;
        device.cmd_begin_render_pass(target.command_buffer, &render_pass_begin, vk::SubpassContents::INLINE);
        device.cmd_set_viewport(target.command_buffer, 0, &[target.viewport()]);
        device.cmd_set_scissor(target.command_buffer, 0, &[target.render_area()]);
    }
    Ok(())
}

/// Close the render pass and finish recording
pub fn end_frame(device: &Device, command_buffer: vk::CommandBuffer) -> RenderResult<()> {
    unsafe {
        device.cmd_end_render_pass(command_buffer);
        device.end_command_buffer(command_buffer)?;
    }
    Ok(())
}

//! Host-visible vertex buffers

use ash::{vk, Device};
use bytemuck::Pod;

use crate::render::vulkan::context::PhysicalDeviceInfo;
use crate::render::{RenderError, RenderResult};

/// Vertex buffer filled once from host memory
pub struct VertexBuffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    vertex_count: u32,
}

impl VertexBuffer {
    /// Upload `vertices` into a new host-visible, host-coherent buffer
    pub fn new<T: Pod>(device: Device, physical: &PhysicalDeviceInfo, vertices: &[T]) -> RenderResult<Self> {
        if vertices.is_empty() {
            return Err(RenderError::InvalidOperation {
                reason: "Vertex buffer needs at least one vertex".to_string(),
            });
        }
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let size = bytes.len() as vk::DeviceSize;

        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(vk::BufferUsageFlags::VERTEX_BUFFER)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let buffer = unsafe { device.create_buffer(&buffer_info, None)? };

        let memory = match Self::allocate_and_fill(&device, physical, buffer, bytes) {
            Ok(memory) => memory,
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        Ok(Self {
            device,
            buffer,
            memory,
            vertex_count: vertices.len() as u32,
        })
    }

    fn allocate_and_fill(
        device: &Device,
        physical: &PhysicalDeviceInfo,
        buffer: vk::Buffer,
        bytes: &[u8],
    ) -> RenderResult<vk::DeviceMemory> {
        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };
        let memory_type_index = physical.find_memory_type(
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);
        let memory = unsafe { device.allocate_memory(&alloc_info, None)? };

        let filled = unsafe {
            device.bind_buffer_memory(buffer, memory, 0).and_then(|()| {
                let mapped = device.map_memory(memory, 0, bytes.len() as vk::DeviceSize, vk::MemoryMapFlags::empty())?;
                std::ptr::copy_nonoverlapping(bytes.as_ptr(), mapped.cast::<u8>(), bytes.len());
                device.unmap_memory(memory);
                Ok(())
            })
        };

        if let Err(e) = filled {
            unsafe { device.free_memory(memory, None) };
            return Err(e.into());
        }
        Ok(memory)
    }

    /// Bind as vertex binding 0
    pub fn bind(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            self.device
                .cmd_bind_vertex_buffers(command_buffer, 0, &[self.buffer], &[0]);
        }
    }

    /// Draw every vertex once
    pub fn draw(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            self.device.cmd_draw(command_buffer, self.vertex_count, 1, 0, 0);
        }
    }

    /// Number of vertices uploaded
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

impl Drop for VertexBuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

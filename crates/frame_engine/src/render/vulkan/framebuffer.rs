//! Framebuffers, image views and depth attachments

use ash::{vk, Device};

use crate::render::vulkan::context::PhysicalDeviceInfo;
use crate::render::vulkan::render_pass::DEPTH_FORMAT;
use crate::render::RenderResult;

/// 2D image view with RAII cleanup
pub struct ImageView {
    device: Device,
    view: vk::ImageView,
}

impl ImageView {
    /// Create a single-mip, single-layer view of `image`
    pub fn new(device: Device, image: vk::Image, format: vk::Format, aspect: vk::ImageAspectFlags) -> RenderResult<Self> {
        let view = Self::create_raw(&device, image, format, aspect)?;
        Ok(Self { device, view })
    }

    fn create_raw(
        device: &Device,
        image: vk::Image,
        format: vk::Format,
        aspect: vk::ImageAspectFlags,
    ) -> RenderResult<vk::ImageView> {
        let create_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        Ok(unsafe { device.create_image_view(&create_info, None)? })
    }

    /// Get the image view handle
    pub fn handle(&self) -> vk::ImageView {
        self.view
    }
}

impl Drop for ImageView {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_image_view(self.view, None);
        }
    }
}

/// Framebuffer wrapper with RAII cleanup
pub struct Framebuffer {
    device: Device,
    framebuffer: vk::Framebuffer,
}

impl Framebuffer {
    /// Create a new framebuffer
    pub fn new(
        device: Device,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> RenderResult<Self> {
        let create_info = vk::FramebufferCreateInfo::builder()
            .render_pass(render_pass)
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe { device.create_framebuffer(&create_info, None)? };
        Ok(Self { device, framebuffer })
    }

    /// Get the framebuffer handle
    pub fn handle(&self) -> vk::Framebuffer {
        self.framebuffer
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}

/// Device-local depth image with its view
pub struct DepthBuffer {
    device: Device,
    image_view: vk::ImageView,
    image: vk::Image,
    memory: vk::DeviceMemory,
}

impl DepthBuffer {
    /// Create a depth attachment of `extent`
    pub fn new(device: Device, physical: &PhysicalDeviceInfo, extent: vk::Extent2D) -> RenderResult<Self> {
        let image_create_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .format(DEPTH_FORMAT)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(vk::SampleCountFlags::TYPE_1);

        let image = unsafe { device.create_image(&image_create_info, None)? };

        let memory = match Self::bind_memory(&device, physical, image) {
            Ok(memory) => memory,
            Err(e) => {
                unsafe { device.destroy_image(image, None) };
                return Err(e);
            }
        };

        let image_view = match ImageView::create_raw(&device, image, DEPTH_FORMAT, vk::ImageAspectFlags::DEPTH) {
            Ok(view) => view,
            Err(e) => {
                unsafe {
                    device.destroy_image(image, None);
                    device.free_memory(memory, None);
                }
                return Err(e);
            }
        };

        Ok(Self {
            device,
            image_view,
            image,
            memory,
        })
    }

    fn bind_memory(device: &Device, physical: &PhysicalDeviceInfo, image: vk::Image) -> RenderResult<vk::DeviceMemory> {
        let requirements = unsafe { device.get_image_memory_requirements(image) };
        let memory_type_index =
            physical.find_memory_type(requirements.memory_type_bits, vk::MemoryPropertyFlags::DEVICE_LOCAL)?;

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);

        unsafe {
            let memory = device.allocate_memory(&alloc_info, None)?;
            if let Err(e) = device.bind_image_memory(image, memory, 0) {
                device.free_memory(memory, None);
                return Err(e.into());
            }
            Ok(memory)
        }
    }

    /// Get the image view handle
    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }
}

impl Drop for DepthBuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_image_view(self.image_view, None);
            self.device.destroy_image(self.image, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

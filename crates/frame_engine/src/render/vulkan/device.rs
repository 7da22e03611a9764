//! Vulkan implementation of [`GraphicsDevice`]

use ash::{vk, Device, Instance};

use crate::config::RendererConfig;
use crate::render::vulkan::commands::{self, CommandPool};
use crate::render::vulkan::context::{LogicalDevice, PhysicalDeviceInfo, VulkanInstance, WindowSurface};
use crate::render::vulkan::{VulkanSwapchain, Window};
use crate::render::{FrameTarget, GraphicsDevice, RenderResult};

/// Everything the frame loop needs from Vulkan, created for one window
pub struct VulkanDevice {
    // Field order is release order
    command_pool: CommandPool,
    logical: LogicalDevice,
    physical: PhysicalDeviceInfo,
    surface: WindowSurface,
    instance: VulkanInstance,
    config: RendererConfig,
}

impl VulkanDevice {
    /// Create instance, surface, device, queues and command pool for `window`
    pub fn new(window: &Window, config: &RendererConfig) -> RenderResult<Self> {
        config.validate()?;

        let instance = VulkanInstance::new(window, &config.application_name, config.validation_enabled())?;
        let surface = WindowSurface::new(&instance, window)?;
        let physical = PhysicalDeviceInfo::select_suitable_device(instance.instance(), &surface)?;
        let logical = LogicalDevice::new(instance.instance(), &physical)?;
        let command_pool = CommandPool::new(logical.handle().clone(), physical.graphics_family)?;

        Ok(Self {
            command_pool,
            logical,
            physical,
            surface,
            instance,
            config: config.clone(),
        })
    }

    /// Device function table
    pub fn raw(&self) -> &Device {
        self.logical.handle()
    }

    /// Instance function table
    pub fn instance(&self) -> &Instance {
        self.instance.instance()
    }

    /// Logical device and queues
    pub fn logical(&self) -> &LogicalDevice {
        &self.logical
    }

    /// Selected GPU
    pub fn physical(&self) -> &PhysicalDeviceInfo {
        &self.physical
    }

    /// Window surface
    pub fn surface(&self) -> &WindowSurface {
        &self.surface
    }

    /// Renderer configuration the device was created with
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }
}

impl GraphicsDevice for VulkanDevice {
    type Swapchain = VulkanSwapchain;

    fn wait_idle(&self) -> RenderResult<()> {
        unsafe { Ok(self.raw().device_wait_idle()?) }
    }

    fn allocate_command_buffers(&self, count: u32) -> RenderResult<Vec<vk::CommandBuffer>> {
        self.command_pool.allocate_command_buffers(count)
    }

    fn free_command_buffers(&self, buffers: &[vk::CommandBuffer]) {
        self.command_pool.free_command_buffers(buffers);
    }

    fn begin_recording(&self, target: &FrameTarget) -> RenderResult<()> {
        commands::begin_frame(self.raw(), target, self.config.clear_color)
    }

    fn finish_recording(&self, command_buffer: vk::CommandBuffer) -> RenderResult<()> {
        commands::end_frame(self.raw(), command_buffer)
    }

    fn build_swapchain(
        &self,
        extent: vk::Extent2D,
        previous: Option<VulkanSwapchain>,
    ) -> RenderResult<VulkanSwapchain> {
        VulkanSwapchain::new(self, extent, previous)
    }
}

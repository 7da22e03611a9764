//! Swapchain generation lifecycle
//!
//! A [`SwapchainManager`] wraps exactly one generation of presentable images.
//! Generations are never patched: a resize or a stale chain produces a new
//! manager via [`SwapchainManager::recreate`], which consumes the old one.

use ash::vk;

use crate::render::{GraphicsDevice, RenderError, RenderResult, SwapchainBackend, SwapchainStatus};

/// Owner of the active swapchain generation
pub struct SwapchainManager<D: GraphicsDevice> {
    generation: D::Swapchain,
    sequence: u64,
}

impl<D: GraphicsDevice> SwapchainManager<D> {
    /// Build the first generation
    pub fn create(device: &D, extent: vk::Extent2D) -> RenderResult<Self> {
        ensure_drawable(extent)?;

        let generation = device.build_swapchain(extent, None)?;
        log::info!(
            "Created swapchain {}x{} with {} images",
            generation.extent().width,
            generation.extent().height,
            generation.image_count()
        );

        Ok(Self {
            generation,
            sequence: 0,
        })
    }

    /// Build a new generation, migrating from `previous`
    ///
    /// The device must be idle: the previous generation is handed to the
    /// device and is unreachable once this returns.
    pub fn recreate(device: &D, extent: vk::Extent2D, previous: Self) -> RenderResult<Self> {
        ensure_drawable(extent)?;

        let Self {
            generation: old,
            sequence,
        } = previous;
        let old_count = old.image_count();

        let generation = device.build_swapchain(extent, Some(old))?;
        log::info!(
            "Recreated swapchain {}x{} ({} -> {} images)",
            generation.extent().width,
            generation.extent().height,
            old_count,
            generation.image_count()
        );

        Ok(Self {
            generation,
            sequence: sequence + 1,
        })
    }

    /// Acquire the next presentable image
    pub fn acquire_next_image(&mut self) -> (u32, SwapchainStatus) {
        self.generation.acquire_next_image()
    }

    /// Submit `command_buffer` and present `image_index`
    pub fn submit(&mut self, command_buffer: vk::CommandBuffer, image_index: u32) -> SwapchainStatus {
        self.generation.submit(command_buffer, image_index)
    }

    /// Number of presentable images
    pub fn image_count(&self) -> u32 {
        self.generation.image_count()
    }

    /// Extent of this generation
    pub fn extent(&self) -> vk::Extent2D {
        self.generation.extent()
    }

    /// Render pass of this generation
    pub fn render_pass(&self) -> vk::RenderPass {
        self.generation.render_pass()
    }

    /// Framebuffer for image `index`
    pub fn framebuffer(&self, index: u32) -> RenderResult<vk::Framebuffer> {
        if index >= self.image_count() {
            return Err(RenderError::InvalidOperation {
                reason: format!(
                    "Framebuffer index {} out of range ({} images)",
                    index,
                    self.image_count()
                ),
            });
        }
        Ok(self.generation.framebuffer(index as usize))
    }

    /// How many times this chain has been recreated
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Continue the rebuild count of a generation that was lost mid-rebuild
    pub(crate) fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }
}

/// True if neither dimension is zero
pub fn is_drawable(extent: vk::Extent2D) -> bool {
    extent.width != 0 && extent.height != 0
}

fn ensure_drawable(extent: vk::Extent2D) -> RenderResult<()> {
    if is_drawable(extent) {
        Ok(())
    } else {
        Err(RenderError::ZeroExtent {
            width: extent.width,
            height: extent.height,
        })
    }
}

//! Contracts between the frame loop and its collaborators
//!
//! The frame loop only ever talks to a window through [`PresentationSurface`],
//! to the GPU through [`GraphicsDevice`] and [`SwapchainBackend`], and to the
//! application through [`Drawable`]. The Vulkan/GLFW implementations live in
//! [`crate::render::vulkan`]; the unit tests plug in scripted mocks.

use ash::vk;

use crate::render::RenderResult;

/// Outcome of an acquire or present operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapchainStatus {
    /// The image was acquired / presented normally
    Success,
    /// Still usable, but no longer matches the surface exactly
    Suboptimal,
    /// Unusable; the swapchain must be rebuilt
    OutOfDate,
    /// Any other result code
    Failed(vk::Result),
}

impl SwapchainStatus {
    /// Map the `suboptimal` flag ash returns on success
    pub fn from_suboptimal(suboptimal: bool) -> Self {
        if suboptimal {
            Self::Suboptimal
        } else {
            Self::Success
        }
    }

    /// Map an error code returned by acquire or present
    pub fn from_error(result: vk::Result) -> Self {
        match result {
            vk::Result::ERROR_OUT_OF_DATE_KHR => Self::OutOfDate,
            vk::Result::SUBOPTIMAL_KHR => Self::Suboptimal,
            vk::Result::SUCCESS => Self::Success,
            other => Self::Failed(other),
        }
    }

    /// True for `Suboptimal` and `OutOfDate`
    pub fn is_stale(self) -> bool {
        matches!(self, Self::Suboptimal | Self::OutOfDate)
    }
}

/// Everything a drawing callback needs to fill one command buffer
#[derive(Debug, Clone, Copy)]
pub struct FrameTarget {
    /// Buffer being recorded; already inside the render pass
    pub command_buffer: vk::CommandBuffer,
    /// Swapchain image this buffer renders into
    pub image_index: u32,
    /// Render pass of the active swapchain generation
    pub render_pass: vk::RenderPass,
    /// Framebuffer bound to `image_index`
    pub framebuffer: vk::Framebuffer,
    /// Drawable extent of the active generation
    pub extent: vk::Extent2D,
}

impl FrameTarget {
    /// Full-extent render area
    pub fn render_area(&self) -> vk::Rect2D {
        vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: self.extent,
        }
    }

    /// Full-extent viewport with a 0..1 depth range
    pub fn viewport(&self) -> vk::Viewport {
        vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: self.extent.width as f32,
            height: self.extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// The on-screen target and its events
pub trait PresentationSurface {
    /// Current drawable extent in pixels; zero-area while minimized
    fn extent(&self) -> vk::Extent2D;

    /// True once the user asked the window to close
    fn should_close(&self) -> bool;

    /// Process pending window events without blocking
    fn poll_events(&mut self);

    /// Block until at least one window event arrives
    fn wait_events(&mut self);

    /// True if a resize notification arrived since the last reset
    fn was_resized(&self) -> bool;

    /// Clear the resize notification
    fn reset_resized_flag(&mut self);
}

/// One generation of presentable images
///
/// A generation is immutable once built. Dropping it releases its images,
/// framebuffers and render pass, so it must only be dropped once the device
/// is idle.
pub trait SwapchainBackend {
    /// Number of presentable images
    fn image_count(&self) -> u32;

    /// Extent the images were created with
    fn extent(&self) -> vk::Extent2D;

    /// Render pass compatible with every framebuffer of this generation
    fn render_pass(&self) -> vk::RenderPass;

    /// Framebuffer for the image at `index`
    fn framebuffer(&self, index: usize) -> vk::Framebuffer;

    /// Acquire the next presentable image
    fn acquire_next_image(&mut self) -> (u32, SwapchainStatus);

    /// Submit a recorded buffer and present the image it renders into
    fn submit(&mut self, command_buffer: vk::CommandBuffer, image_index: u32) -> SwapchainStatus;
}

/// The GPU as seen by the frame loop
pub trait GraphicsDevice {
    /// Swapchain generation type produced by this device
    type Swapchain: SwapchainBackend;

    /// Block until all submitted work has completed
    fn wait_idle(&self) -> RenderResult<()>;

    /// Allocate `count` primary command buffers
    fn allocate_command_buffers(&self, count: u32) -> RenderResult<Vec<vk::CommandBuffer>>;

    /// Return command buffers to the pool they came from
    fn free_command_buffers(&self, buffers: &[vk::CommandBuffer]);

    /// Begin recording `target.command_buffer` and open the render pass on its framebuffer
    fn begin_recording(&self, target: &FrameTarget) -> RenderResult<()>;

    /// Close the render pass and finish recording
    fn finish_recording(&self, command_buffer: vk::CommandBuffer) -> RenderResult<()>;

    /// Build a swapchain generation, optionally migrating from `previous`
    ///
    /// `previous` is consumed: it is either absorbed into the new generation
    /// or dropped before this returns.
    fn build_swapchain(
        &self,
        extent: vk::Extent2D,
        previous: Option<Self::Swapchain>,
    ) -> RenderResult<Self::Swapchain>;
}

/// Application-side drawing callback
pub trait Drawable {
    /// Called after every swapchain (re)build, before the next frame is recorded
    fn swapchain_rebuilt(&mut self, _render_pass: vk::RenderPass, _extent: vk::Extent2D) -> RenderResult<()> {
        Ok(())
    }

    /// Record this frame's draw commands into `target.command_buffer`
    fn record(&mut self, target: &FrameTarget) -> RenderResult<()>;
}

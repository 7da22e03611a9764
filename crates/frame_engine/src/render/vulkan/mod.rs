//! Vulkan rendering backend
//!
//! ash/GLFW implementations of the collaborator traits in
//! [`crate::render::backend`], plus the RAII wrappers they are built from.

pub mod buffer;
pub mod commands;
pub mod context;
pub mod device;
pub mod framebuffer;
pub mod pipeline;
pub mod render_pass;
pub mod swapchain;
pub mod sync;
pub mod window;

pub use buffer::VertexBuffer;
pub use commands::CommandPool;
pub use context::{LogicalDevice, PhysicalDeviceInfo, VulkanInstance, WindowSurface};
pub use device::VulkanDevice;
pub use framebuffer::{DepthBuffer, Framebuffer, ImageView};
pub use pipeline::{GraphicsPipeline, ShaderModule};
pub use render_pass::RenderPass;
pub use swapchain::VulkanSwapchain;
pub use sync::{Fence, FrameSync, Semaphore};
pub use window::{Window, WindowError, WindowResult};

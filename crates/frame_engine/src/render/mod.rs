//! Frame loop and presentation-chain lifecycle
//!
//! The backend-agnostic core lives at this level:
//!
//! - [`FrameRenderer`]: acquire → record → submit/present, plus recreate-on-demand
//! - [`SwapchainManager`]: one immutable swapchain generation
//! - [`CommandBufferPool`]: one command buffer per swapchain image
//! - [`ResizeSignal`]: resize notification shared with the window
//!
//! [`vulkan`] holds the ash/GLFW implementations of the collaborator traits
//! declared in [`backend`].

pub mod backend;
pub mod command_pool;
pub mod error;
pub mod frame_renderer;
pub mod model;
pub mod resize;
pub mod swapchain_manager;
pub mod vulkan;

#[cfg(test)]
pub(crate) mod testing;
#[cfg(test)]
mod tests;

pub use backend::{
    Drawable, FrameTarget, GraphicsDevice, PresentationSurface, SwapchainBackend, SwapchainStatus,
};
pub use command_pool::CommandBufferPool;
pub use error::{RenderError, RenderResult};
pub use frame_renderer::{wait_for_drawable_extent, FrameOutcome, FrameRenderer, FrameState};
pub use model::{sierpinski, Vertex};
pub use resize::ResizeSignal;
pub use swapchain_manager::SwapchainManager;

//! Rendering errors
//!
//! Everything that can terminate the frame loop funnels into [`RenderError`].
//! Staleness of the presentation chain is *not* an error; it is reported as a
//! [`SwapchainStatus`](crate::render::SwapchainStatus) and handled by recreation.

use ash::vk;
use thiserror::Error;

use crate::config::ConfigError;
use crate::render::vulkan::WindowError;

/// Fatal rendering errors propagated out of the frame loop
#[derive(Error, Debug)]
pub enum RenderError {
    /// A Vulkan call failed
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// Image acquisition returned a status outside {Success, Suboptimal, OutOfDate}
    #[error("Failed to acquire swapchain image: {0:?}")]
    AcquireFailed(vk::Result),

    /// Presentation returned a status outside {Success, Suboptimal, OutOfDate}
    #[error("Failed to present swapchain image: {0:?}")]
    PresentFailed(vk::Result),

    /// Swapchain construction was requested for a minimized surface
    #[error("Cannot build a swapchain for a zero-area extent ({width}x{height})")]
    ZeroExtent {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Command buffer recording failed
    #[error("Command buffer recording failed: {0}")]
    Recording(String),

    /// Vulkan loader or instance setup failed
    #[error("Vulkan initialization failed: {0}")]
    InitializationFailed(String),

    /// No physical device supports graphics, presentation and swapchains
    #[error("No suitable physical device found")]
    NoSuitableDevice,

    /// Operation called in the wrong state
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// What went wrong
        reason: String,
    },

    /// Window system failure
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    /// Configuration failure
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl From<vk::Result> for RenderError {
    fn from(result: vk::Result) -> Self {
        Self::Api(result)
    }
}

/// Result alias used throughout the renderer
pub type RenderResult<T> = Result<T, RenderError>;

//! # Frame Engine
//!
//! Frame loop and swapchain lifecycle management for Vulkan rendering.
//!
//! ## Overview
//!
//! - [`render::FrameRenderer`] drives acquire, record and submit/present for
//!   every frame and rebuilds the swapchain when it goes stale or the window
//!   is resized.
//! - [`render::vulkan`] provides the ash/GLFW window, device and swapchain.
//! - [`config`] holds serde-backed settings loadable from TOML or RON.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use frame_engine::prelude::*;
//!
//! struct Clear;
//!
//! impl Drawable for Clear {
//!     fn record(&mut self, _target: &FrameTarget) -> RenderResult<()> {
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::default();
//!     let mut window = Window::new(&config.window)?;
//!     let device = Rc::new(VulkanDevice::new(&window, &config.renderer)?);
//!     let mut scene = Clear;
//!     let mut renderer = FrameRenderer::new(device, &mut window, &mut scene)?;
//!     renderer.run(&mut window, &mut scene)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod foundation;
pub mod render;

/// Common imports for engine users
pub mod prelude {
    pub use crate::config::{AppConfig, Config, ConfigError, RendererConfig, ShaderConfig, WindowConfig};
    pub use crate::render::vulkan::{GraphicsPipeline, VertexBuffer, VulkanDevice, Window, WindowError};
    pub use crate::render::{
        Drawable, FrameOutcome, FrameRenderer, FrameTarget, GraphicsDevice, PresentationSurface, RenderError,
        RenderResult, Vertex,
    };
}

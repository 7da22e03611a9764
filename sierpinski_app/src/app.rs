//! Window, device, renderer and scene wired together

use std::rc::Rc;

use frame_engine::config::{AppConfig, ConfigError};
use frame_engine::render::vulkan::{VulkanDevice, Window, WindowError};
use frame_engine::render::{FrameRenderer, RenderError};
use thiserror::Error;

use crate::scene::SierpinskiScene;
use crate::settings::SceneConfig;

/// Application-level failures
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The window could not be created
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    /// Rendering failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

/// The running demo
pub struct SierpinskiApp {
    // Field order is release order: the renderer waits for the device to go
    // idle before the scene's GPU objects are destroyed
    renderer: FrameRenderer<VulkanDevice>,
    scene: SierpinskiScene,
    device: Rc<VulkanDevice>,
    window: Window,
}

impl SierpinskiApp {
    /// Open the window and build everything needed for the first frame
    pub fn new(config: &AppConfig, scene_config: &SceneConfig) -> Result<Self, AppError> {
        config.validate()?;
        scene_config.validate()?;

        let mut window = Window::new(&config.window)?;
        let device = Rc::new(VulkanDevice::new(&window, &config.renderer)?);
        let mut scene = SierpinskiScene::new(Rc::clone(&device), scene_config.depth, config.renderer.shaders.clone())?;
        let renderer = FrameRenderer::new(Rc::clone(&device), &mut window, &mut scene)?;

        Ok(Self {
            renderer,
            scene,
            device,
            window,
        })
    }

    /// Render until the window is closed
    pub fn run(&mut self) -> Result<(), AppError> {
        log::info!("Running on {}", self.device.physical().name());
        self.renderer.run(&mut self.window, &mut self.scene)?;
        Ok(())
    }
}

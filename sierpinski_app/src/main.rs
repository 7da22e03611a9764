//! Sierpinski triangle demo
//!
//! Opens a resizable window and draws a colored Sierpinski triangle until the
//! window is closed or Escape is pressed. Settings are read from
//! `sierpinski.toml` in the working directory when present.

mod app;
mod scene;
mod settings;

use frame_engine::config::{AppConfig, Config};
use frame_engine::foundation::logging;

use crate::app::SierpinskiApp;
use crate::settings::{SceneSettings, CONFIG_PATH};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_or_default(CONFIG_PATH)?;
    let scene = SceneSettings::load_or_default(CONFIG_PATH)?.scene;
    logging::init_with_level(&config.log_level);

    log::info!("Starting Sierpinski demo");

    let result = SierpinskiApp::new(&config, &scene).and_then(|mut app| app.run());
    if let Err(e) = &result {
        log::error!("Application error: {}", e);
    }
    result?;

    log::info!("Sierpinski demo finished");
    Ok(())
}

//! Main demo
//!
//! Starts logging, echoes the command line, then runs a few frames that
//! acquire and release textures from a small foreign pool. Run with
//! `LP3_LOG_LEVEL=info` to hide the per-frame debug output, or point
//! `LP3_CONSOLE_ADDR` at a listening console to watch the variables live.

mod texture_pool;

use std::path::Path;

use lp3_core::prelude::*;
use texture_pool::Texture;

const FRAMES: u32 = 6;
const CONFIG_PATH: &str = "lp3_log.toml";

/// Errors that end the demo early
#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),
}

fn load_config() -> Result<LogConfig, DemoError> {
    if Path::new(CONFIG_PATH).exists() {
        Ok(LogConfig::load_from_file(CONFIG_PATH)?)
    } else {
        Ok(LogConfig::default())
    }
}

fn run_frames() -> Result<(), DemoError> {
    // The backdrop lives for the whole run; losing it is fatal.
    let backdrop = Texture::new(texture_pool::create(640, 480))?;
    lp3_log_info!("Backdrop texture is %d", backdrop.get());

    let mut sprites: Vec<Texture> = Vec::new();
    let mut cursor = Texture::empty();

    for frame in 0..FRAMES {
        match Texture::new(texture_pool::create(32, 32)) {
            Ok(sprite) => sprites.push(sprite),
            Err(err) => {
                lp3_log_warning!("Frame %d: dropping oldest sprite after %s", frame, err);
                if !sprites.is_empty() {
                    sprites.remove(0);
                }
            }
        }

        if cursor.is_empty() {
            if let Ok(texture) = Texture::new(texture_pool::create(16, 16)) {
                cursor.assign(texture);
            }
        } else if frame % 2 == 0 {
            cursor.destroy();
        }

        lp3_log_set!("frame", frame);
        lp3_log_set!("live_textures", texture_pool::live_count());
    }

    // Handing a texture to another owner leaves the old slot empty.
    let retained = cursor.take();
    lp3_log_debug!(
        "Cursor slot empty: %s, retained texture: %s",
        cursor.is_empty(),
        retained.try_get().map_or_else(|| "none".to_string(), |id| id.to_string())
    );

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let _log = LogSystem::builder().config(config).bridge_log_crate(true).build();

    lp3_log_debug!("Greetings from the Main Demo.");
    for (index, element) in std::env::args().enumerate() {
        lp3_log_error!("%d. %s", index, element);
        if !lp3_core::logging::COMPILED_IN {
            println!("{element}");
        }
    }

    let result = run_frames();
    if let Err(err) = &result {
        lp3_log_critical!("Demo failed: %s", err);
    }

    lp3_log_debug!("Good bye.");
    Ok(result?)
}

//! Configuration management.
//!
//! - TOML-based settings with one table per concern
//! - Atomic file writes (write to temp, then rename)
//! - Validation on load with automatic defaults
//!
//! # Example
//!
//! ```no_run
//! use sfm_core::config::ConfigManager;
//!
//! let mut config = ConfigManager::new("settings.toml");
//! config.load_or_create().unwrap();
//! println!("colmap: {}", config.settings().tools.colmap);
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, FrameSettings, LoggingSettings, ReconstructionSettings, Settings,
    ToolSettings, TrainingSettings,
};

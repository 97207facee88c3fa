//! TOML configuration file adapter.
//!
//! ```toml
//! mode = 1
//! use_ac1 = true
//! use_ac2 = true
//!
//! [control]
//! cooling_threshold = 56.0
//!
//! [hardware]
//! invert_output = true
//!
//! [hardware.pins]
//! ac1_compressor = 5
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::ConfigPort;
use crate::config::{SystemConfig, validate_config};
use crate::error::ConfigError;

/// Default location of the config file.
pub const DEFAULT_PATH: &str = "/etc/hpm.toml";

pub struct FileConfig {
    path: PathBuf,
}

impl FileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load, or fall back to defaults with a warning.
    pub fn load_or_default(&self) -> SystemConfig {
        match self.load() {
            Ok(cfg) => {
                info!("INFO: config loaded from {}", self.path.display());
                cfg
            }
            Err(e) => {
                warn!(
                    "WARNING: config {} ({e}), using defaults",
                    self.path.display()
                );
                SystemConfig::default()
            }
        }
    }
}

/// Parse, normalize and validate config text.
pub fn parse(text: &str) -> Result<SystemConfig, ConfigError> {
    let mut cfg: SystemConfig = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
    cfg.normalize();
    validate_config(&cfg)?;
    Ok(cfg)
}

impl ConfigPort for FileConfig {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let text = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound,
            _ => ConfigError::Io,
        })?;
        parse(&text)
    }
}

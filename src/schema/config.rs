//! Configuration types for the encoder.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_first_index() -> u32 {
    1
}

fn default_extension() -> String {
    "png".to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from("data.bin")
}

/// Encoder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Output grid width in pixels. Source images are twice as wide.
    pub width: u32,
    /// Output grid height in pixels.
    pub height: u32,
    /// Playback frame rate.
    pub framerate: u32,
    /// Directory holding numbered source images.
    pub frames_dir: PathBuf,
    /// Index of the first image.
    #[serde(default = "default_first_index")]
    pub first_index: u32,
    /// Image file extension.
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Container path to write.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 48,
            framerate: 30,
            frames_dir: PathBuf::from("frames"),
            first_index: default_first_index(),
            extension: default_extension(),
            output: default_output(),
        }
    }
}

impl EncoderConfig {
    /// Expected source image size `(width, height)`.
    pub fn source_dimensions(&self) -> (u32, u32) {
        (self.width * 2, self.height)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.width.checked_mul(2).is_none() {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.framerate == 0 {
            return Err(ConfigError::InvalidFrameRate);
        }
        if self.extension.is_empty() {
            return Err(ConfigError::MissingExtension);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Grid dimensions (width, height) must be non-zero")]
    InvalidDimensions,
    #[error("Frame rate must be non-zero")]
    InvalidFrameRate,
    #[error("Image extension must not be empty")]
    MissingExtension,
}

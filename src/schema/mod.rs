//! Schema module - Configuration types for encoding.

mod config;

pub use config::*;

//! Shared utilities for revscope.
//!
//! This crate provides common utilities used across the revscope workspace:
//! - Logging setup with tracing
//! - Relative path handling for version trees and config lookup

pub mod log;
pub mod path;

pub use log::{LogConfig, LogLevel};
pub use path::{config_dir, path_segments};

//! Core utilities shared across the kiln engine.
//!
//! This crate provides the foundation the other kiln crates build on:
//! - Error types and result aliases
//! - Logging initialization
//! - Frame timing

mod error;
mod logging;
mod timer;

pub use error::{Error, Result};
pub use logging::init_logging;
pub use timer::{FrameReport, FrameStats, Timer};

//! # Setlist Common Library
//!
//! Shared code for the setlist workspace:
//! - Error types
//! - TOML configuration model and config file resolution
//! - Logging initialization

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};

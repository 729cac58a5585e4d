//! # Recipe Common Library
//!
//! Shared code for the recipe merge tooling:
//! - Common error type
//! - TOML bootstrap configuration and its resolution order
//! - Tracing subscriber initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};

//! Utility modules
//!
//! This module contains utilities and helpers:
//! - Error types and result types
//! - Comparison configuration

pub mod config;
pub mod error;

// Re-export commonly used items
pub use config::{CompareConfig, OutputProfile};
pub use error::{TableError, TableResult};

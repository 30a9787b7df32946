//! Shared types for the ned privacy estimator.
//!
//! This crate provides foundational types used across the ned crates:
//! - System identity and bounded system views
//! - The unified error type with stable codes
//! - Output formats

pub mod error;
pub mod id;
pub mod output;

pub use error::{format_error_human, Error, ErrorCategory, Result, StructuredError};
pub use id::{SystemId, SystemView};
pub use output::OutputFormat;

/// Report schema version.
pub const SCHEMA_VERSION: &str = "1.0.0";

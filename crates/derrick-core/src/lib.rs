//! # derrick-core
//!
//! Core types and utilities shared across all Derrick crates.
//!
//! This crate provides:
//! - Locator and Ident types for package instance identity
//! - DerrickError enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Package identity types (Locator, Ident)
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{DerrickError, DerrickResult};
pub use types::{Ident, Locator};

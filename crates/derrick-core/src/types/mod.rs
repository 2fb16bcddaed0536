//! Package identity types for the hoisting engine.
//!
//! This module provides the two notions of package instance identity the
//! engine distinguishes between:
//! - Locator: a concrete instance, virtual decoration included
//! - Ident: the instance modulo virtualization

pub mod locator;

// Re-export all public types
pub use locator::{Ident, Locator};

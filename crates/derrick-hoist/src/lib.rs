//! Dependency hoisting engine for flat installation layouts.
//!
//! Given a dependency graph where every package declares regular and peer
//! dependencies, this crate computes an equivalent graph in which duplicate
//! package instances have been promoted toward the root as far as correctness
//! allows. The flat layout convention resolves a package's imports by walking
//! up the directory tree, so a promotion is legal only when it preserves what
//! every package resolves for every name it declared:
//!
//! - regular dependencies must keep resolving to the same identity, and
//! - peer dependencies must keep resolving to whatever the parent resolves.
//!
//! The engine runs a candidate search / promotion cycle to a fixed point at
//! every node of the graph, breaking name collisions by popularity (how many
//! distinct packages depend on an instance) and handling cyclic graphs
//! throughout. See [`hoist`] for the entry point.

pub mod engine;
pub mod tree;

mod dump;
mod verify;
mod work;

// Re-export main types
pub use engine::{hoist, HoistOptions};
pub use tree::{
    DependencyTree, HoistedTree, InputNode, InputNodeId, OutputNode, OutputNodeId,
};

use derrick_core::error::DerrickError;

/// Result type for hoisting operations
pub type HoistResult<T> = Result<T, DerrickError>;

//! Derrick benchmarking suite
//!
//! Criterion benchmarks for the hoisting engine over synthetic dependency
//! graphs of different shapes.

pub mod common;

pub use common::*;

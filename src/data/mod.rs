//! Data sources that do not come from image files.
//!
//! - `synthetic`: seeded class-cluster training sets and held-out queries

pub mod synthetic;

pub use synthetic::*;

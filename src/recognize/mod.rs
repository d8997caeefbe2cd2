//! Recognition against a trained `Model`.

pub mod classifier;

pub use classifier::*;

//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the training input (`TrainingSet`) and its partitioning rules
//! - the trained, immutable recognizer (`Model`, `ModelMetadata`)
//! - recognition outputs (`Match`, `ClassLabel`)

pub mod types;

pub use types::*;

//! Training pipeline.
//!
//! Responsibilities:
//!
//! - project the raw vectors onto a (P−C)-dimensional PCA subspace (`pca`)
//! - find the C−1 Fisher discriminant directions inside it (`fisher`)
//! - run both stages and assemble a `Model` (`trainer`)

pub mod fisher;
pub mod pca;
pub mod trainer;

pub use fisher::*;
pub use pca::*;
pub use trainer::*;

//! Numeric primitives: dense matrix helpers and symmetric eigensolvers.

pub mod dense;
pub mod eigen;

pub use dense::*;
pub use eigen::*;

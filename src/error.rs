//! Crate-wide error type.
//!
//! Every fallible operation returns `Result<_, FaceError>`. The binary maps each
//! variant onto a process exit code via [`FaceError::exit_code`]:
//!
//! - `2`: caller-correctable input (training set, query, configuration, files, model)
//! - `3`: numeric failure (singular scatter, eigensolver non-convergence)
//! - `4`: internal invariant or resource failure (dimension mismatch, allocation)

use std::path::PathBuf;

/// Error type for all fallible operations in the crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FaceError {
    /// Returned when the training vectors violate a shape or partitioning
    /// precondition. Raised before any matrix is allocated.
    #[error("invalid training set: {reason}")]
    InvalidTrainingSet {
        /// Which precondition failed.
        reason: String,
    },

    /// Returned when two operands of a matrix operation have incompatible shapes,
    /// or when a query vector does not match the model's pixel count.
    #[error("dimension mismatch in {op}: {lhs_rows}x{lhs_cols} vs {rhs_rows}x{rhs_cols}")]
    DimensionMismatch {
        /// Operation that detected the mismatch.
        op: &'static str,
        lhs_rows: usize,
        lhs_cols: usize,
        rhs_rows: usize,
        rhs_cols: usize,
    },

    /// Returned when the within-class scatter matrix cannot be inverted.
    #[error("within-class scatter matrix is singular: {reason}")]
    SingularScatterMatrix {
        /// Why the matrix was rejected.
        reason: String,
    },

    /// Returned when the symmetric eigensolver fails to converge.
    #[error("eigensolver did not converge on a {dim}x{dim} matrix")]
    EigenSolverFailure {
        /// Order of the matrix being decomposed.
        dim: usize,
    },

    /// Returned when the backing buffer for a matrix cannot be allocated.
    #[error("out of memory allocating a {rows}x{cols} matrix")]
    OutOfMemory { rows: usize, cols: usize },

    /// Filesystem failure while reading or writing a collaborator file.
    #[error("I/O error on '{}': {message}", .path.display())]
    Io { path: PathBuf, message: String },

    /// Image decoding failure or an image with unexpected dimensions.
    #[error("image '{}': {message}", .path.display())]
    Image { path: PathBuf, message: String },

    /// A query vector holds NaN or infinite intensities.
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// A persisted or assembled model is internally inconsistent.
    #[error("invalid model: {0}")]
    Model(String),

    /// A configuration value could not be parsed or is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FaceError {
    pub fn invalid_training_set(reason: impl Into<String>) -> Self {
        Self::InvalidTrainingSet {
            reason: reason.into(),
        }
    }

    pub fn singular_scatter(reason: impl Into<String>) -> Self {
        Self::SingularScatterMatrix {
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn image(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Image {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Shape mismatch between two operands, given as `(rows, cols)` pairs.
    pub fn mismatch(op: &'static str, lhs: (usize, usize), rhs: (usize, usize)) -> Self {
        Self::DimensionMismatch {
            op,
            lhs_rows: lhs.0,
            lhs_cols: lhs.1,
            rhs_rows: rhs.0,
            rhs_cols: rhs.1,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            FaceError::InvalidTrainingSet { .. }
            | FaceError::Io { .. }
            | FaceError::Image { .. }
            | FaceError::InvalidQuery { .. }
            | FaceError::Model(_)
            | FaceError::Config(_) => 2,
            FaceError::SingularScatterMatrix { .. } | FaceError::EigenSolverFailure { .. } => 3,
            FaceError::DimensionMismatch { .. } | FaceError::OutOfMemory { .. } => 4,
        }
    }
}

//! Dense matrix helpers on top of `nalgebra::DMatrix`.
//!
//! `DMatrix<f64>` already gives us what the pipeline needs from a matrix type:
//! a single contiguous owned buffer, immutable shape and `(row, col)` indexing.
//! This module adds the few things it does not:
//!
//! - fallible allocation, so a too-large training set surfaces as
//!   `FaceError::OutOfMemory` instead of aborting the process
//! - a shape-checked multiply with per-operand transpose flags
//! - a column mean that rejects empty matrices instead of returning NaN

use nalgebra::{DMatrix, DVector};

use crate::error::FaceError;

/// Whether an operand of [`multiply`] is used as-is or transposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transpose {
    No,
    Yes,
}

impl Transpose {
    fn apply(self, shape: (usize, usize)) -> (usize, usize) {
        match self {
            Transpose::No => shape,
            Transpose::Yes => (shape.1, shape.0),
        }
    }
}

/// Allocate a zero-filled `rows x cols` matrix.
pub fn alloc_zeros(rows: usize, cols: usize) -> Result<DMatrix<f64>, FaceError> {
    let len = rows
        .checked_mul(cols)
        .ok_or(FaceError::OutOfMemory { rows, cols })?;

    let mut buf: Vec<f64> = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| FaceError::OutOfMemory { rows, cols })?;
    buf.resize(len, 0.0);

    Ok(DMatrix::from_vec(rows, cols, buf))
}

/// Compute `op(a) * op(b)` into a freshly allocated matrix.
///
/// Fails with `DimensionMismatch` when the inner dimensions disagree.
pub fn multiply(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    ta: Transpose,
    tb: Transpose,
) -> Result<DMatrix<f64>, FaceError> {
    let (m, ka) = ta.apply(a.shape());
    let (kb, n) = tb.apply(b.shape());
    if ka != kb {
        return Err(FaceError::mismatch("multiply", (m, ka), (kb, n)));
    }

    let mut out = alloc_zeros(m, n)?;
    match (ta, tb) {
        (Transpose::No, Transpose::No) => a.mul_to(b, &mut out),
        (Transpose::Yes, Transpose::No) => a.tr_mul_to(b, &mut out),
        (Transpose::No, Transpose::Yes) => a.mul_to(&b.transpose(), &mut out),
        (Transpose::Yes, Transpose::Yes) => a.tr_mul_to(&b.transpose(), &mut out),
    }
    Ok(out)
}

/// Per-row average across all columns (`rows x 1`).
pub fn column_mean(a: &DMatrix<f64>) -> Result<DVector<f64>, FaceError> {
    if a.ncols() == 0 {
        return Err(FaceError::mismatch("column_mean", a.shape(), (a.nrows(), 1)));
    }
    let mut mean = DVector::zeros(a.nrows());
    for col in a.column_iter() {
        mean += col;
    }
    mean.unscale_mut(a.ncols() as f64);
    Ok(mean)
}

/// Subtract `v` from every column of `a`, in place.
pub fn subtract_from_columns(a: &mut DMatrix<f64>, v: &DVector<f64>) -> Result<(), FaceError> {
    if a.nrows() != v.len() {
        return Err(FaceError::mismatch("subtract_from_columns", a.shape(), (v.len(), 1)));
    }
    for mut col in a.column_iter_mut() {
        col -= v;
    }
    Ok(())
}

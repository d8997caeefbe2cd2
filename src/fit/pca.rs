//! PCA stage: mean, deviation matrix, covariance surrogate and eigenbasis.
//!
//! With N pixels and P ≪ N images the true N×N covariance is never formed.
//! Instead we decompose the P×P surrogate `L = Aᵗ·A`: if `L·u = λ·u` then
//! `(A·Aᵗ)·(A·u) = λ·(A·u)`, so `A·u` is an eigenvector of the covariance with
//! the same eigenvalue and norm `√λ`.
//!
//! Only the top P−C eigenvectors are kept. Centering costs one dimension and
//! the C smallest directions are dropped so that the within-class scatter
//! built on top of this subspace stays invertible.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::config::TrainConfig;
use crate::domain::validate_partition;
use crate::error::FaceError;
use crate::math::{Transpose, alloc_zeros, column_mean, multiply, subtract_from_columns, symmetric_eigen};

/// Output of the PCA stage.
#[derive(Debug, Clone)]
pub struct PcaSubspace {
    /// N×1 pixel-wise mean of the training vectors.
    pub mean: DVector<f64>,
    /// N×(P−C) orthonormal basis, strongest direction first.
    pub basis: DMatrix<f64>,
    /// (P−C)×P training vectors in PCA coordinates.
    pub projected: DMatrix<f64>,
    /// Retained eigenvalues of the covariance surrogate, matching `basis` columns.
    pub eigenvalues: DVector<f64>,
}

impl PcaSubspace {
    /// P−C.
    pub fn dims(&self) -> usize {
        self.basis.ncols()
    }

    /// Express a centered N-vector in PCA coordinates.
    pub fn project(&self, centered: &DVector<f64>) -> Result<DVector<f64>, FaceError> {
        if centered.len() != self.basis.nrows() {
            return Err(FaceError::mismatch(
                "pca_project",
                self.basis.shape(),
                (centered.len(), 1),
            ));
        }
        Ok(self.basis.tr_mul(centered))
    }
}

/// Build the PCA subspace of `training` (N×P, one vector per column) for
/// `class_count` equal-size classes.
pub fn build_pca(
    training: &DMatrix<f64>,
    class_count: usize,
    config: &TrainConfig,
) -> Result<PcaSubspace, FaceError> {
    let (n, p) = training.shape();
    if class_count == 0 || p % class_count != 0 {
        return Err(FaceError::invalid_training_set(format!(
            "{p} vectors cannot be split into {class_count} equal classes"
        )));
    }
    validate_partition(n, p, p / class_count)?;
    if let Some(idx) = training.iter().position(|x| !x.is_finite()) {
        return Err(FaceError::invalid_training_set(format!(
            "non-finite intensity at pixel {} of vector {}",
            idx % n,
            idx / n
        )));
    }
    let keep = p - class_count;

    // 1) mean, 2) deviation matrix.
    let mean = column_mean(training)?;
    let mut a = alloc_zeros(n, p)?;
    a.copy_from(training);
    subtract_from_columns(&mut a, &mean)?;

    // 3) covariance surrogate, 4) eigendecomposition (ascending).
    let l = multiply(&a, &a, Transpose::Yes, Transpose::No)?;
    let eig = symmetric_eigen(l, config.solver())?;
    debug!(
        surrogate = p,
        largest = eig.values[p - 1],
        smallest = eig.values[0],
        "covariance surrogate decomposed"
    );

    // 5) keep the top P−C eigenpairs, largest first.
    let top = eig.largest(keep);
    let largest = top.values[0];
    let weakest = top.values[keep - 1];
    if largest <= 0.0 || weakest <= largest * config.rank_tolerance {
        return Err(FaceError::invalid_training_set(format!(
            "training vectors span fewer than {keep} dimensions after centering \
             (retained eigenvalue {weakest:.3e} vs largest {largest:.3e})"
        )));
    }

    // 6) lift to pixel space and normalise each direction.
    let mut basis = multiply(&a, &top.vectors, Transpose::No, Transpose::No)?;
    for mut col in basis.column_iter_mut() {
        let norm = col.norm();
        col.unscale_mut(norm);
    }

    // 7) project one training vector at a time.
    let mut projected = alloc_zeros(keep, p)?;
    for j in 0..p {
        let z = basis.tr_mul(&a.column(j));
        projected.set_column(j, &z);
    }
    drop(a);

    debug!(pixels = n, dims = keep, "pca subspace built");
    Ok(PcaSubspace {
        mean,
        basis,
        projected,
        eigenvalues: top.values,
    })
}

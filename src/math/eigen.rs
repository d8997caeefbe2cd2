//! Symmetric eigendecomposition.
//!
//! The solver itself is nalgebra's `SymmetricEigen` (Householder tridiagonal
//! reduction + implicit QR). nalgebra returns eigenpairs in no particular order;
//! everything downstream relies on ascending order, so we sort here.
//!
//! Ordering contract:
//! - eigenvalues ascending
//! - the sort is stable, so equal eigenvalues keep the solver's native order
//!   (degenerate spectra are only reproducible for a pinned nalgebra version)
//! - eigenvectors are columns, unit norm and mutually orthogonal

use nalgebra::{Cholesky, DMatrix, DVector};

use crate::error::FaceError;

/// Convergence knobs for the QR iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    /// Off-diagonal tolerance for deflation.
    pub epsilon: f64,
    /// Iteration cap; `0` means "iterate until convergence".
    pub max_iterations: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            epsilon: f64::EPSILON,
            max_iterations: 0,
        }
    }
}

/// Eigenvalues in ascending order with matching eigenvector columns.
#[derive(Debug, Clone)]
pub struct EigenPairs {
    pub values: DVector<f64>,
    pub vectors: DMatrix<f64>,
}

impl EigenPairs {
    /// The `k` largest eigenpairs, largest first.
    ///
    /// # Panics
    /// Panics if `k` exceeds the number of eigenpairs.
    pub fn largest(&self, k: usize) -> EigenPairs {
        let n = self.values.len();
        let order: Vec<usize> = (n - k..n).rev().collect();
        EigenPairs {
            values: DVector::from_iterator(k, order.iter().map(|&i| self.values[i])),
            vectors: self.vectors.select_columns(order.iter()),
        }
    }
}

/// Decompose a symmetric matrix. Only symmetry is assumed; the caller
/// guarantees it.
///
/// Non-finite entries are rejected up front: the QR iteration never deflates
/// on NaN, so an uncapped run would not return.
pub fn symmetric_eigen(s: DMatrix<f64>, opts: SolverOptions) -> Result<EigenPairs, FaceError> {
    let (rows, cols) = s.shape();
    if rows != cols {
        return Err(FaceError::mismatch("symmetric_eigen", (rows, cols), (cols, rows)));
    }
    if s.iter().any(|v| !v.is_finite()) {
        return Err(FaceError::EigenSolverFailure { dim: rows });
    }

    let eig = s
        .try_symmetric_eigen(opts.epsilon, opts.max_iterations)
        .ok_or(FaceError::EigenSolverFailure { dim: rows })?;

    if eig.eigenvalues.iter().any(|v| !v.is_finite()) {
        return Err(FaceError::EigenSolverFailure { dim: rows });
    }

    let mut order: Vec<usize> = (0..rows).collect();
    order.sort_by(|&i, &j| eig.eigenvalues[i].total_cmp(&eig.eigenvalues[j]));

    Ok(EigenPairs {
        values: DVector::from_iterator(rows, order.iter().map(|&i| eig.eigenvalues[i])),
        vectors: eig.eigenvectors.select_columns(order.iter()),
    })
}

/// Solve `a·v = λ·b·v` for symmetric `a` and symmetric positive definite `b`.
///
/// Reduction: `b = L·Lᵗ`, `M = L⁻¹·a·L⁻ᵗ`, `M·u = λ·u`, `v = L⁻ᵗ·u`.
/// The returned vectors are eigenvectors of `b⁻¹·a`, normalised so that
/// `vᵗ·b·v = 1`, in ascending eigenvalue order.
///
/// `b` is the within-class scatter in our only caller, hence the error kind:
/// a failed factorisation, or a smallest/largest squared pivot ratio below
/// `rank_tolerance`, is reported as `SingularScatterMatrix`.
pub fn generalized_symmetric_eigen(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    rank_tolerance: f64,
    opts: SolverOptions,
) -> Result<EigenPairs, FaceError> {
    let n = b.nrows();
    if !b.is_square() {
        return Err(FaceError::mismatch("generalized_symmetric_eigen", b.shape(), (n, n)));
    }
    if a.shape() != b.shape() {
        return Err(FaceError::mismatch("generalized_symmetric_eigen", a.shape(), b.shape()));
    }

    let chol = Cholesky::new(b.clone())
        .ok_or_else(|| FaceError::singular_scatter("Cholesky factorisation failed"))?;
    let l = chol.l();

    let pivots = l.diagonal();
    let max_pivot = pivots.iter().fold(0.0_f64, |acc, &p| acc.max(p));
    let min_pivot = pivots.iter().fold(f64::INFINITY, |acc, &p| acc.min(p));
    if pivots.iter().any(|p| !p.is_finite())
        || max_pivot <= 0.0
        || (min_pivot / max_pivot).powi(2) < rank_tolerance
    {
        return Err(FaceError::singular_scatter(format!(
            "pivot ratio {:.3e} below tolerance {rank_tolerance:.1e}",
            (min_pivot / max_pivot).powi(2)
        )));
    }

    // X = L⁻¹·a, then M = X·L⁻ᵗ = (L⁻¹·Xᵗ)ᵗ.
    let x = l
        .solve_lower_triangular(a)
        .ok_or_else(|| FaceError::singular_scatter("triangular solve failed"))?;
    let m = l
        .solve_lower_triangular(&x.transpose())
        .ok_or_else(|| FaceError::singular_scatter("triangular solve failed"))?
        .transpose();
    // Round-off leaves M slightly asymmetric.
    let m = (&m + m.transpose()) * 0.5;

    let reduced = symmetric_eigen(m, opts)?;
    let vectors = l
        .tr_solve_lower_triangular(&reduced.vectors)
        .ok_or_else(|| FaceError::singular_scatter("back-substitution failed"))?;

    Ok(EigenPairs {
        values: reduced.values,
        vectors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_symmetric() -> DMatrix<f64> {
        DMatrix::from_row_slice(3, 3, &[4.0, 1.0, 0.5, 1.0, 3.0, 0.2, 0.5, 0.2, 1.0])
    }

    #[test]
    fn non_finite_input_fails_without_iterating() {
        let mut s = sample_symmetric();
        s[(0, 1)] = f64::NAN;
        s[(1, 0)] = f64::NAN;
        let err = symmetric_eigen(s, SolverOptions::default()).unwrap_err();
        assert_eq!(err, FaceError::EigenSolverFailure { dim: 3 });

        let mut s = sample_symmetric();
        s[(2, 2)] = f64::INFINITY;
        assert!(symmetric_eigen(s, SolverOptions::default()).is_err());
    }

    #[test]
    fn eigenvalues_come_back_ascending() {
        let eig = symmetric_eigen(sample_symmetric(), SolverOptions::default()).unwrap();
        for w in eig.values.as_slice().windows(2) {
            assert!(w[0] <= w[1], "not ascending: {w:?}");
        }
    }

    #[test]
    fn eigenvectors_are_orthonormal_and_satisfy_definition() {
        let s = sample_symmetric();
        let eig = symmetric_eigen(s.clone(), SolverOptions::default()).unwrap();

        let gram = eig.vectors.transpose() * &eig.vectors;
        assert!((gram - DMatrix::identity(3, 3)).amax() < 1e-10);

        for k in 0..3 {
            let v = eig.vectors.column(k);
            let residual = &s * v - v * eig.values[k];
            assert!(residual.amax() < 1e-10);
        }
    }

    #[test]
    fn diagonal_matrix_sorts_and_keeps_pairs_together() {
        let s = DMatrix::from_diagonal(&DVector::from_row_slice(&[5.0, 1.0, 3.0]));
        let eig = symmetric_eigen(s, SolverOptions::default()).unwrap();
        assert!((eig.values[0] - 1.0).abs() < 1e-12);
        assert!((eig.values[2] - 5.0).abs() < 1e-12);
        // Eigenvalue 1.0 belongs to the second axis.
        assert!((eig.vectors[(1, 0)].abs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn largest_returns_descending_pairs() {
        let s = DMatrix::from_diagonal(&DVector::from_row_slice(&[2.0, 7.0, 4.0, 1.0]));
        let top = symmetric_eigen(s, SolverOptions::default()).unwrap().largest(2);
        assert_eq!(top.values.len(), 2);
        assert!((top.values[0] - 7.0).abs() < 1e-12);
        assert!((top.values[1] - 4.0).abs() < 1e-12);
        assert_eq!(top.vectors.shape(), (4, 2));
    }

    #[test]
    fn non_square_input_is_rejected() {
        let err = symmetric_eigen(DMatrix::zeros(2, 3), SolverOptions::default()).unwrap_err();
        assert!(matches!(err, FaceError::DimensionMismatch { .. }));
    }

    #[test]
    fn generalized_solution_satisfies_pencil() {
        let a = sample_symmetric();
        let b = DMatrix::from_row_slice(3, 3, &[2.0, 0.3, 0.0, 0.3, 1.5, 0.1, 0.0, 0.1, 1.0]);
        let eig = generalized_symmetric_eigen(&a, &b, 1e-12, SolverOptions::default()).unwrap();

        for k in 0..3 {
            let v = eig.vectors.column(k);
            let lhs = &a * v;
            let rhs = (&b * v) * eig.values[k];
            assert!((lhs - rhs).amax() < 1e-9);
            let b_norm = (v.transpose() * &b * v)[(0, 0)];
            assert!((b_norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn generalized_rejects_singular_b() {
        let a = sample_symmetric();
        let b = DMatrix::zeros(3, 3);
        let err = generalized_symmetric_eigen(&a, &b, 1e-12, SolverOptions::default()).unwrap_err();
        assert!(matches!(err, FaceError::SingularScatterMatrix { .. }));
    }
}

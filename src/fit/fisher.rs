//! Fisher linear discriminant on top of the PCA subspace.
//!
//! In PCA coordinates we accumulate
//!
//! ```text
//! Sw = Σ_i Σ_{j∈i} (x_j − μ_i)(x_j − μ_i)ᵗ
//! Sb = Σ_i K·(μ_i − μ)(μ_i − μ)ᵗ
//! ```
//!
//! and keep the C−1 leading eigenvectors of `Sw⁻¹·Sb`. `Sb` has rank at most
//! C−1, so no further direction carries between-class separation.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::config::TrainConfig;
use crate::error::FaceError;
use crate::fit::pca::PcaSubspace;
use crate::math::{Transpose, alloc_zeros, column_mean, generalized_symmetric_eigen, multiply};

/// Class means and scatter matrices in PCA space.
#[derive(Debug, Clone)]
pub struct Scatter {
    /// One (P−C)-vector per class.
    pub class_means: Vec<DVector<f64>>,
    pub global_mean: DVector<f64>,
    pub within: DMatrix<f64>,
    pub between: DMatrix<f64>,
}

/// Output of the discriminant stage.
#[derive(Debug, Clone)]
pub struct FisherSubspace {
    /// (P−C)×(C−1) discriminant directions, strongest first.
    pub basis: DMatrix<f64>,
    /// Matching eigenvalues of `Sw⁻¹·Sb`, descending.
    pub eigenvalues: DVector<f64>,
    /// (C−1)×N transform `V_Fisherᵗ·V_PCAᵗ`.
    pub combined: DMatrix<f64>,
    /// (C−1)×P training vectors in discriminant space.
    pub projected: DMatrix<f64>,
}

fn check_partition(projected: &DMatrix<f64>, class_count: usize, class_population: usize) -> Result<(), FaceError> {
    let p = projected.ncols();
    if class_count.checked_mul(class_population) != Some(p) {
        return Err(FaceError::invalid_training_set(format!(
            "{p} projected vectors are not {class_count} classes of {class_population}"
        )));
    }
    if class_count < 2 {
        return Err(FaceError::invalid_training_set(format!(
            "discriminant analysis needs at least 2 classes, got {class_count}"
        )));
    }
    if class_population < 2 {
        return Err(FaceError::singular_scatter(format!(
            "{class_population} vector per class leaves no within-class variation"
        )));
    }
    if projected.nrows() < class_count - 1 {
        return Err(FaceError::invalid_training_set(format!(
            "PCA subspace has {} dimensions, fewer than C-1 = {}",
            projected.nrows(),
            class_count - 1
        )));
    }
    Ok(())
}

/// Accumulate class means, Sw and Sb over the columns of `projected`.
pub fn scatter_matrices(
    projected: &DMatrix<f64>,
    class_count: usize,
    class_population: usize,
) -> Result<Scatter, FaceError> {
    check_partition(projected, class_count, class_population)?;
    let d = projected.nrows();

    let global_mean = column_mean(projected)?;
    let mut within = alloc_zeros(d, d)?;
    let mut between = alloc_zeros(d, d)?;
    let mut class_means = Vec::with_capacity(class_count);

    for i in 0..class_count {
        let start = i * class_population;
        let members = projected.columns(start, class_population).into_owned();
        let mu = column_mean(&members)?;

        for x in members.column_iter() {
            let dev = x - &mu;
            within.ger(1.0, &dev, &dev, 1.0);
        }

        let sep = &mu - &global_mean;
        between.ger(class_population as f64, &sep, &sep, 1.0);
        class_means.push(mu);
    }

    Ok(Scatter {
        class_means,
        global_mean,
        within,
        between,
    })
}

/// Solve for the C−1 Fisher directions of `projected`.
///
/// Returns the (P−C)×(C−1) basis and its eigenvalues, largest first.
pub fn fisher_basis(
    projected: &DMatrix<f64>,
    class_count: usize,
    class_population: usize,
    config: &TrainConfig,
) -> Result<(DMatrix<f64>, DVector<f64>), FaceError> {
    let scatter = scatter_matrices(projected, class_count, class_population)?;
    let eig = generalized_symmetric_eigen(
        &scatter.between,
        &scatter.within,
        config.rank_tolerance,
        config.solver(),
    )?;
    let top = eig.largest(class_count - 1);
    debug!(
        dims = class_count - 1,
        leading = top.values[0],
        "fisher directions solved"
    );
    Ok((top.vectors, top.values))
}

/// Build the discriminant stage from a finished PCA subspace.
pub fn build_fisher(
    pca: &PcaSubspace,
    class_count: usize,
    class_population: usize,
    config: &TrainConfig,
) -> Result<FisherSubspace, FaceError> {
    let (basis, eigenvalues) = fisher_basis(&pca.projected, class_count, class_population, config)?;

    // (V_PCA·V_Fisher)ᵗ = V_Fisherᵗ·V_PCAᵗ
    let combined = multiply(&pca.basis, &basis, Transpose::No, Transpose::No)?.transpose();
    let projected = multiply(&basis, &pca.projected, Transpose::Yes, Transpose::No)?;

    Ok(FisherSubspace {
        basis,
        eigenvalues,
        combined,
        projected,
    })
}

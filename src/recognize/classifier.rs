//! Nearest-neighbour recognition in discriminant space.
//!
//! A query is centred with the training mean, mapped through the combined
//! (C−1)×N transform and compared with every projected training vector by
//! squared Euclidean distance. The closest column wins; on an exact tie the
//! lowest column index wins.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::domain::{ClassLabel, Match, Model};
use crate::error::FaceError;

/// Map a raw N-vector into discriminant space: `combined·(query − mean)`.
pub fn project(
    query: &DVector<f64>,
    mean: &DVector<f64>,
    combined: &DMatrix<f64>,
) -> Result<DVector<f64>, FaceError> {
    if query.len() != mean.len() {
        return Err(FaceError::mismatch("classify", (query.len(), 1), (mean.len(), 1)));
    }
    if combined.ncols() != mean.len() {
        return Err(FaceError::mismatch("classify", combined.shape(), (mean.len(), 1)));
    }
    if let Some(i) = query.iter().position(|x| !x.is_finite()) {
        return Err(FaceError::InvalidQuery {
            reason: format!("pixel {i} is {}", query[i]),
        });
    }
    let centered = query - mean;
    Ok(combined * centered)
}

/// Index and squared distance of the column of `training` closest to `y`.
/// Ties go to the lowest index. A non-finite distance is an error, never a match.
pub fn nearest_column(training: &DMatrix<f64>, y: &DVector<f64>) -> Result<(usize, f64), FaceError> {
    if training.nrows() != y.len() {
        return Err(FaceError::mismatch("nearest_column", training.shape(), (y.len(), 1)));
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(FaceError::InvalidQuery {
            reason: "projection is not finite".into(),
        });
    }

    let mut best: Option<(usize, f64)> = None;
    for (j, col) in training.column_iter().enumerate() {
        let dist = (col - y).norm_squared();
        if !dist.is_finite() {
            return Err(FaceError::Model(format!("distance to training vector {j} is {dist}")));
        }
        match best {
            Some((_, d)) if dist >= d => {}
            _ => best = Some((j, dist)),
        }
    }
    best.ok_or_else(|| FaceError::Model("no training vectors to compare against".into()))
}

/// Classify against explicit matrices.
pub fn classify_with(
    query: &DVector<f64>,
    mean: &DVector<f64>,
    combined: &DMatrix<f64>,
    projected: &DMatrix<f64>,
    class_population: usize,
) -> Result<Match, FaceError> {
    if class_population == 0 {
        return Err(FaceError::Model("class population must be >= 1".into()));
    }
    let y = project(query, mean, combined)?;
    let (index, distance) = nearest_column(projected, &y)?;
    Ok(Match {
        index,
        label: ClassLabel::of_index(index, class_population),
        distance,
    })
}

/// Classify one query against a trained model.
pub fn classify(model: &Model, query: &DVector<f64>) -> Result<Match, FaceError> {
    classify_with(
        query,
        model.mean(),
        model.combined(),
        model.projected(),
        model.class_population(),
    )
}

/// Classify independent queries in parallel. The model is only read.
///
/// Results are in query order. The first failing query's error is returned.
pub fn classify_batch(model: &Model, queries: &[DVector<f64>]) -> Result<Vec<Match>, FaceError> {
    queries.par_iter().map(|q| classify(model, q)).collect()
}

impl Model {
    pub fn classify(&self, query: &DVector<f64>) -> Result<Match, FaceError> {
        classify(self, query)
    }

    pub fn classify_slice(&self, query: &[f64]) -> Result<Match, FaceError> {
        classify(self, &DVector::from_column_slice(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_model() -> Model {
        // 2 pixels, 1 discriminant dim, 2 classes of 2.
        let mean = DVector::from_row_slice(&[1.0, 1.0]);
        let combined = DMatrix::from_row_slice(1, 2, &[1.0, 0.0]);
        let projected = DMatrix::from_row_slice(1, 4, &[-2.0, -1.5, 1.5, 2.0]);
        Model::new(mean, combined, projected, 2).unwrap()
    }

    #[test]
    fn equidistant_columns_pick_lowest_index() {
        let training = DMatrix::from_row_slice(2, 3, &[1.0, -1.0, 1.0, 0.0, 0.0, 0.0]);
        let y = DVector::from_row_slice(&[0.0, 0.0]);
        for _ in 0..10 {
            let (index, dist) = nearest_column(&training, &y).unwrap();
            assert_eq!(index, 0);
            assert!((dist - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn non_finite_query_is_rejected() {
        let model = toy_model();
        let err = model.classify_slice(&[f64::NAN, 0.0]).unwrap_err();
        assert!(matches!(err, FaceError::InvalidQuery { .. }));
        assert_eq!(err.exit_code(), 2);

        let err = model.classify_slice(&[0.0, f64::NEG_INFINITY]).unwrap_err();
        assert!(matches!(err, FaceError::InvalidQuery { .. }));

        // A NaN that survives projection would otherwise lose every comparison.
        let training = DMatrix::from_row_slice(1, 3, &[0.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[f64::NAN]);
        assert!(nearest_column(&training, &y).is_err());
    }

    #[test]
    fn non_finite_training_column_is_not_a_match() {
        let training = DMatrix::from_row_slice(1, 3, &[5.0, f64::NAN, 0.1]);
        let y = DVector::from_row_slice(&[0.0]);
        let err = nearest_column(&training, &y).unwrap_err();
        assert!(matches!(err, FaceError::Model(_)));
    }

    #[test]
    fn tie_break_does_not_depend_on_column_values() {
        // Same geometry, columns swapped: still the first one.
        let training = DMatrix::from_row_slice(1, 2, &[3.0, -3.0]);
        let y = DVector::from_row_slice(&[0.0]);
        assert_eq!(nearest_column(&training, &y).unwrap().0, 0);
    }

    #[test]
    fn classify_maps_index_to_class() {
        let model = toy_model();
        // x = 3 centres to 2 → nearest column 3 → class 1.
        let m = model.classify_slice(&[3.0, 7.0]).unwrap();
        assert_eq!(m.index, 3);
        assert_eq!(m.label, ClassLabel(1));
        assert!(m.distance.abs() < 1e-12);

        let m = model.classify_slice(&[-0.4, 0.0]).unwrap();
        assert_eq!(m.index, 1);
        assert_eq!(m.label, ClassLabel(0));
    }

    #[test]
    fn wrong_query_length_is_a_dimension_mismatch() {
        let model = toy_model();
        let before = model.clone();
        let err = model.classify_slice(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, FaceError::DimensionMismatch { .. }));
        assert_eq!(model, before);
    }

    #[test]
    fn batch_matches_sequential() {
        let model = toy_model();
        let queries: Vec<DVector<f64>> = (0..20)
            .map(|i| DVector::from_row_slice(&[i as f64 * 0.3 - 3.0, 0.0]))
            .collect();
        let batch = classify_batch(&model, &queries).unwrap();
        for (q, m) in queries.iter().zip(&batch) {
            assert_eq!(*m, classify(&model, q).unwrap());
        }
    }

    #[test]
    fn batch_reports_bad_query() {
        let model = toy_model();
        let queries = vec![DVector::zeros(2), DVector::zeros(5)];
        assert!(classify_batch(&model, &queries).is_err());
    }
}

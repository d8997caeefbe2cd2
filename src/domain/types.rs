//! Shared domain types.
//!
//! These types are kept small and (where it matters) serializable so they can be:
//!
//! - built once by training and shared read-only during recognition
//! - saved to JSON and reloaded for later recognition runs

use std::fmt;
use std::ops::Range;

use chrono::{DateTime, Utc};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::FaceError;

/// Identity index of a class. Class `i` owns training columns `[i·K, (i+1)·K)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassLabel(pub usize);

impl ClassLabel {
    /// Class owning training column `index` when every class has `population` columns.
    pub fn of_index(index: usize, population: usize) -> Self {
        ClassLabel(index / population)
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// P training vectors of length N stored as the columns of an N×P matrix,
/// partitioned into C contiguous classes of K vectors each.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    data: DMatrix<f64>,
    class_population: usize,
}

impl TrainingSet {
    /// Build from per-image vectors, validating shape and partitioning before
    /// the N×P matrix is allocated.
    pub fn from_vectors(vectors: &[Vec<f64>], class_population: usize) -> Result<Self, FaceError> {
        let images = vectors.len();
        let pixels = vectors.first().map(Vec::len).unwrap_or(0);
        validate_partition(pixels, images, class_population)?;

        if let Some((j, v)) = vectors.iter().enumerate().find(|(_, v)| v.len() != pixels) {
            return Err(FaceError::invalid_training_set(format!(
                "vector {j} has length {}, expected {pixels}",
                v.len()
            )));
        }
        if vectors.iter().flatten().any(|x| !x.is_finite()) {
            return Err(FaceError::invalid_training_set("non-finite intensity value"));
        }

        let mut data = crate::math::alloc_zeros(pixels, images)?;
        for (j, v) in vectors.iter().enumerate() {
            data.column_mut(j).copy_from_slice(v);
        }
        Ok(Self {
            data,
            class_population,
        })
    }

    /// Wrap an existing N×P matrix whose columns are the training vectors.
    pub fn from_matrix(data: DMatrix<f64>, class_population: usize) -> Result<Self, FaceError> {
        validate_partition(data.nrows(), data.ncols(), class_population)?;
        if data.iter().any(|x| !x.is_finite()) {
            return Err(FaceError::invalid_training_set("non-finite intensity value"));
        }
        Ok(Self {
            data,
            class_population,
        })
    }

    /// The N×P data matrix.
    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// N, the length of every vector.
    pub fn pixels(&self) -> usize {
        self.data.nrows()
    }

    /// P, the number of training vectors.
    pub fn images(&self) -> usize {
        self.data.ncols()
    }

    /// K, vectors per class.
    pub fn class_population(&self) -> usize {
        self.class_population
    }

    /// C, the number of classes.
    pub fn class_count(&self) -> usize {
        self.images() / self.class_population
    }

    pub fn class_of(&self, index: usize) -> ClassLabel {
        ClassLabel::of_index(index, self.class_population)
    }

    /// Column range owned by `class`.
    pub fn class_range(&self, class: ClassLabel) -> Range<usize> {
        let start = class.0 * self.class_population;
        start..start + self.class_population
    }

    /// Copy of training vector `index`.
    pub fn vector(&self, index: usize) -> DVector<f64> {
        self.data.column(index).into_owned()
    }
}

/// Shape and partitioning preconditions shared by every training entry point.
pub fn validate_partition(pixels: usize, images: usize, class_population: usize) -> Result<(), FaceError> {
    if class_population == 0 {
        return Err(FaceError::invalid_training_set("class population must be >= 1"));
    }
    if pixels == 0 {
        return Err(FaceError::invalid_training_set("training vectors are empty"));
    }
    if images % class_population != 0 {
        return Err(FaceError::invalid_training_set(format!(
            "{images} vectors cannot be split into classes of {class_population}"
        )));
    }
    let classes = images / class_population;
    if classes == 0 {
        return Err(FaceError::invalid_training_set("no training vectors"));
    }
    if images <= classes {
        return Err(FaceError::invalid_training_set(format!(
            "need more vectors than classes (P={images}, C={classes})"
        )));
    }
    Ok(())
}

/// Result of recognising one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    /// Column of the nearest training vector.
    pub index: usize,
    /// Class owning that column.
    pub label: ClassLabel,
    /// Squared Euclidean distance in discriminant space.
    pub distance: f64,
}

/// Provenance recorded alongside a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub tool: String,
    pub version: String,
    pub trained_at: DateTime<Utc>,
    /// Retained Fisher eigenvalues, largest first.
    pub fisher_eigenvalues: Vec<f64>,
}

impl ModelMetadata {
    pub fn now(fisher_eigenvalues: Vec<f64>) -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            trained_at: Utc::now(),
            fisher_eigenvalues,
        }
    }
}

/// A trained recognizer. Immutable once built; shared by `&` across queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    mean: DVector<f64>,
    combined: DMatrix<f64>,
    projected: DMatrix<f64>,
    class_population: usize,
    #[serde(default)]
    image_dims: Option<(u32, u32)>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    metadata: Option<ModelMetadata>,
}

impl Model {
    /// Assemble a model, checking that the pieces fit together:
    /// `mean` is N×1, `combined` is D×N, `projected` is D×P with P a multiple of K.
    pub fn new(
        mean: DVector<f64>,
        combined: DMatrix<f64>,
        projected: DMatrix<f64>,
        class_population: usize,
    ) -> Result<Self, FaceError> {
        let model = Self {
            mean,
            combined,
            projected,
            class_population,
            image_dims: None,
            labels: Vec::new(),
            metadata: None,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Result<Self, FaceError> {
        if labels.len() != self.class_count() {
            return Err(FaceError::Model(format!(
                "{} labels for {} classes",
                labels.len(),
                self.class_count()
            )));
        }
        self.labels = labels;
        Ok(self)
    }

    pub fn with_image_dims(mut self, width: u32, height: u32) -> Result<Self, FaceError> {
        if (width as usize) * (height as usize) != self.pixels() {
            return Err(FaceError::Model(format!(
                "{width}x{height} image does not have {} pixels",
                self.pixels()
            )));
        }
        self.image_dims = Some((width, height));
        Ok(self)
    }

    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Re-check every shape invariant. Used after deserialization.
    pub fn validate(&self) -> Result<(), FaceError> {
        let n = self.mean.len();
        let (d, cn) = self.combined.shape();
        let (pd, p) = self.projected.shape();

        if self.class_population == 0 {
            return Err(FaceError::Model("class population must be >= 1".into()));
        }
        if n == 0 || cn != n {
            return Err(FaceError::Model(format!(
                "combined transform is {d}x{cn} but the mean has {n} pixels"
            )));
        }
        if pd != d {
            return Err(FaceError::Model(format!(
                "projected training is {pd}x{p} but the transform has {d} rows"
            )));
        }
        if p == 0 || p % self.class_population != 0 {
            return Err(FaceError::Model(format!(
                "{p} projected vectors cannot be split into classes of {}",
                self.class_population
            )));
        }
        if !self.labels.is_empty() && self.labels.len() != p / self.class_population {
            return Err(FaceError::Model(format!(
                "{} labels for {} classes",
                self.labels.len(),
                p / self.class_population
            )));
        }
        if let Some((w, h)) = self.image_dims {
            if (w as usize) * (h as usize) != n {
                return Err(FaceError::Model(format!("{w}x{h} image does not have {n} pixels")));
            }
        }
        Ok(())
    }

    /// N×1 training mean.
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    /// (C−1)×N combined PCA+FLD transform.
    pub fn combined(&self) -> &DMatrix<f64> {
        &self.combined
    }

    /// (C−1)×P training vectors in discriminant space.
    pub fn projected(&self) -> &DMatrix<f64> {
        &self.projected
    }

    pub fn class_population(&self) -> usize {
        self.class_population
    }

    pub fn class_count(&self) -> usize {
        self.projected.ncols() / self.class_population
    }

    pub fn pixels(&self) -> usize {
        self.mean.len()
    }

    pub fn training_size(&self) -> usize {
        self.projected.ncols()
    }

    /// Dimension of the discriminant space (C−1).
    pub fn discriminant_dims(&self) -> usize {
        self.combined.nrows()
    }

    pub fn image_dims(&self) -> Option<(u32, u32)> {
        self.image_dims
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.metadata.as_ref()
    }

    /// Human-readable name of `label`; falls back to the numeric index.
    pub fn label_name(&self, label: ClassLabel) -> String {
        self.labels
            .get(label.0)
            .cloned()
            .unwrap_or_else(|| label.to_string())
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

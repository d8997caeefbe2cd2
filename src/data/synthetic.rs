//! Synthetic face-like training sets.
//!
//! Each class gets a random "identity" vector with intensities in
//! `[0, intensity_max)`; its K training images are that vector plus Gaussian
//! jitter. Everything is driven by a seeded `StdRng`, so the same
//! `SyntheticSpec` always yields the same data.

use nalgebra::DVector;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{ClassLabel, TrainingSet};
use crate::error::FaceError;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSpec {
    pub classes: usize,
    pub per_class: usize,
    pub pixels: usize,
    /// Standard deviation of per-image jitter.
    pub jitter: f64,
    pub intensity_max: f64,
    pub seed: u64,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            classes: 3,
            per_class: 4,
            pixels: 16,
            jitter: 2.0,
            intensity_max: 255.0,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticData {
    pub training: TrainingSet,
    /// Noise-free identity vector of each class.
    pub centers: Vec<DVector<f64>>,
}

/// A held-out query with the class it was generated from.
#[derive(Debug, Clone)]
pub struct LabelledQuery {
    pub name: String,
    pub vector: DVector<f64>,
    pub expected: ClassLabel,
}

pub fn generate(spec: &SyntheticSpec) -> Result<SyntheticData, FaceError> {
    if spec.classes == 0 || spec.per_class == 0 || spec.pixels == 0 {
        return Err(FaceError::Config(
            "synthetic classes, per-class count and pixels must all be > 0".into(),
        ));
    }
    if !(spec.intensity_max.is_finite() && spec.intensity_max > 0.0) {
        return Err(FaceError::Config(format!(
            "intensity max must be finite and positive, got {}",
            spec.intensity_max
        )));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let noise = jitter_distribution(spec.jitter)?;

    let centers: Vec<DVector<f64>> = (0..spec.classes)
        .map(|_| DVector::from_fn(spec.pixels, |_, _| rng.gen_range(0.0..spec.intensity_max)))
        .collect();

    let mut vectors = Vec::with_capacity(spec.classes * spec.per_class);
    for center in &centers {
        for _ in 0..spec.per_class {
            vectors.push(center.iter().map(|&c| c + noise.sample(&mut rng)).collect::<Vec<f64>>());
        }
    }

    let training = TrainingSet::from_vectors(&vectors, spec.per_class)?;
    Ok(SyntheticData { training, centers })
}

impl SyntheticData {
    /// One query per class: the class center plus jitter of standard deviation
    /// `epsilon`.
    pub fn queries(&self, epsilon: f64, seed: u64) -> Result<Vec<LabelledQuery>, FaceError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = jitter_distribution(epsilon)?;
        Ok(self
            .centers
            .iter()
            .enumerate()
            .map(|(i, center)| LabelledQuery {
                name: format!("synthetic-{i}"),
                vector: center.map(|c| c + noise.sample(&mut rng)),
                expected: ClassLabel(i),
            })
            .collect())
    }
}

fn jitter_distribution(std_dev: f64) -> Result<Normal<f64>, FaceError> {
    if !(std_dev.is_finite() && std_dev >= 0.0) {
        return Err(FaceError::Config(format!(
            "jitter must be finite and non-negative, got {std_dev}"
        )));
    }
    Normal::new(0.0, std_dev).map_err(|e| FaceError::Config(format!("jitter distribution: {e}")))
}

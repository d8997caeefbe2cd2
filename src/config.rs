//! Training and runtime configuration.
//!
//! Precedence, lowest to highest:
//!
//! 1. built-in defaults
//! 2. process environment (a `.env` file in the working directory is loaded first)
//! 3. CLI flags, applied by `app` on top of [`Settings`]

use crate::error::FaceError;
use crate::math::SolverOptions;

pub const ENV_CLASS_POPULATION: &str = "FISHERFACE_CLASS_POPULATION";
pub const ENV_RANK_TOLERANCE: &str = "FISHERFACE_RANK_TOLERANCE";
pub const ENV_EIGEN_MAX_ITERATIONS: &str = "FISHERFACE_EIGEN_MAX_ITERATIONS";
pub const ENV_IMAGE_WIDTH: &str = "FISHERFACE_IMAGE_WIDTH";
pub const ENV_IMAGE_HEIGHT: &str = "FISHERFACE_IMAGE_HEIGHT";

/// Images per person in the reference face database layout.
pub const DEFAULT_CLASS_POPULATION: usize = 4;

/// Numeric knobs for a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    /// Images per class (K). Classes are contiguous runs of K vectors.
    pub class_population: usize,
    /// Deflation tolerance passed to the symmetric eigensolver.
    pub eigen_epsilon: f64,
    /// QR iteration cap; `0` iterates until convergence.
    pub eigen_max_iterations: usize,
    /// Relative threshold under which a retained PCA eigenvalue, or a squared
    /// Cholesky pivot ratio of Sw, counts as zero.
    pub rank_tolerance: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            class_population: DEFAULT_CLASS_POPULATION,
            eigen_epsilon: f64::EPSILON,
            eigen_max_iterations: 0,
            rank_tolerance: 1e-10,
        }
    }
}

impl TrainConfig {
    pub fn solver(&self) -> SolverOptions {
        SolverOptions {
            epsilon: self.eigen_epsilon,
            max_iterations: self.eigen_max_iterations,
        }
    }

    pub fn validate(&self) -> Result<(), FaceError> {
        if self.class_population == 0 {
            return Err(FaceError::Config("class population must be >= 1".into()));
        }
        if !(self.eigen_epsilon.is_finite() && self.eigen_epsilon > 0.0) {
            return Err(FaceError::Config(format!(
                "eigen epsilon must be finite and positive, got {}",
                self.eigen_epsilon
            )));
        }
        if !(self.rank_tolerance.is_finite() && self.rank_tolerance >= 0.0) {
            return Err(FaceError::Config(format!(
                "rank tolerance must be finite and non-negative, got {}",
                self.rank_tolerance
            )));
        }
        Ok(())
    }
}

/// Everything the binary needs besides its subcommand arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub train: TrainConfig,
    /// Expected image width; images of any other width are rejected.
    pub image_width: Option<u32>,
    /// Expected image height.
    pub image_height: Option<u32>,
}

impl Settings {
    /// Defaults overlaid with the process environment (and `.env`).
    pub fn from_env() -> Result<Self, FaceError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each known key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FaceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(v) = parse_var::<usize>(&lookup, ENV_CLASS_POPULATION)? {
            settings.train.class_population = v;
        }
        if let Some(v) = parse_var::<f64>(&lookup, ENV_RANK_TOLERANCE)? {
            settings.train.rank_tolerance = v;
        }
        if let Some(v) = parse_var::<usize>(&lookup, ENV_EIGEN_MAX_ITERATIONS)? {
            settings.train.eigen_max_iterations = v;
        }
        settings.image_width = parse_var::<u32>(&lookup, ENV_IMAGE_WIDTH)?;
        settings.image_height = parse_var::<u32>(&lookup, ENV_IMAGE_HEIGHT)?;

        settings.train.validate()?;
        Ok(settings)
    }

    /// Expected `(width, height)` if both are configured.
    pub fn image_dims(&self) -> Option<(u32, u32)> {
        self.image_width.zip(self.image_height)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, FaceError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| FaceError::Config(format!("{key}={raw:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let s = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.train.class_population, 4);
        assert_eq!(s.image_dims(), None);
    }

    #[test]
    fn environment_overrides_defaults() {
        let s = Settings::from_lookup(lookup_from(&[
            (ENV_CLASS_POPULATION, "6"),
            (ENV_RANK_TOLERANCE, "1e-8"),
            (ENV_IMAGE_WIDTH, "128"),
            (ENV_IMAGE_HEIGHT, " 192 "),
        ]))
        .unwrap();
        assert_eq!(s.train.class_population, 6);
        assert!((s.train.rank_tolerance - 1e-8).abs() < 1e-20);
        assert_eq!(s.image_dims(), Some((128, 192)));
    }

    #[test]
    fn malformed_value_is_a_config_error() {
        let err = Settings::from_lookup(lookup_from(&[(ENV_CLASS_POPULATION, "four")])).unwrap_err();
        assert!(matches!(err, FaceError::Config(_)));
        assert!(err.to_string().contains(ENV_CLASS_POPULATION));
    }

    #[test]
    fn zero_class_population_is_rejected() {
        let err = Settings::from_lookup(lookup_from(&[(ENV_CLASS_POPULATION, "0")])).unwrap_err();
        assert!(matches!(err, FaceError::Config(_)));
    }
}

//! Training orchestration: PCA, then FLD, then assemble the immutable `Model`.

use tracing::{debug, info};

use crate::config::TrainConfig;
use crate::domain::{Model, ModelMetadata, TrainingSet};
use crate::error::FaceError;
use crate::fit::fisher::{FisherSubspace, build_fisher};
use crate::fit::pca::{PcaSubspace, build_pca};

/// Everything produced by one training run.
///
/// `model` is all recognition needs; the intermediate subspaces are kept for
/// diagnostics and export.
#[derive(Debug, Clone)]
pub struct Training {
    pub model: Model,
    pub pca: PcaSubspace,
    pub fisher: FisherSubspace,
}

/// Train a recognizer on `set`.
///
/// Nothing is returned on failure; every intermediate matrix of the run is
/// dropped before the error propagates.
pub fn train(set: &TrainingSet, config: &TrainConfig) -> Result<Training, FaceError> {
    config.validate()?;
    if set.class_population() != config.class_population {
        return Err(FaceError::invalid_training_set(format!(
            "training set has {} vectors per class, configuration says {}",
            set.class_population(),
            config.class_population
        )));
    }

    let classes = set.class_count();
    info!(
        pixels = set.pixels(),
        images = set.images(),
        classes,
        per_class = set.class_population(),
        "training started"
    );

    let pca = build_pca(set.data(), classes, config)?;
    debug!(dims = pca.dims(), "pca stage done");

    let fisher = build_fisher(&pca, classes, set.class_population(), config)?;
    debug!(dims = fisher.combined.nrows(), "fisher stage done");

    let model = Model::new(
        pca.mean.clone(),
        fisher.combined.clone(),
        fisher.projected.clone(),
        set.class_population(),
    )?
    .with_metadata(ModelMetadata::now(fisher.eigenvalues.iter().copied().collect()));

    info!(
        discriminant_dims = model.discriminant_dims(),
        "training finished"
    );
    Ok(Training { model, pca, fisher })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::{SyntheticSpec, generate};

    #[test]
    fn trained_model_has_documented_shapes() {
        let spec = SyntheticSpec {
            classes: 4,
            per_class: 3,
            pixels: 20,
            ..SyntheticSpec::default()
        };
        let data = generate(&spec).unwrap();
        let config = TrainConfig {
            class_population: 3,
            ..TrainConfig::default()
        };
        let t = train(&data.training, &config).unwrap();

        assert_eq!(t.pca.basis.shape(), (20, 8));
        assert_eq!(t.fisher.basis.shape(), (8, 3));
        assert_eq!(t.model.combined().shape(), (3, 20));
        assert_eq!(t.model.projected().shape(), (3, 12));
        assert_eq!(t.model.class_count(), 4);
        let meta = t.model.metadata().unwrap();
        assert_eq!(meta.fisher_eigenvalues.len(), 3);
    }

    #[test]
    fn class_population_must_match_config() {
        let data = generate(&SyntheticSpec::default()).unwrap();
        let config = TrainConfig {
            class_population: data.training.class_population() + 1,
            ..TrainConfig::default()
        };
        let err = train(&data.training, &config).unwrap_err();
        assert!(matches!(err, FaceError::InvalidTrainingSet { .. }));
    }
}

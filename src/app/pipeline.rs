//! Shared workflows behind the CLI subcommands.
//!
//! Each function does the work and returns the computed outputs; `app`
//! decides what to print.

use std::path::{Path, PathBuf};

use nalgebra::DVector;
use tracing::info;

use crate::config::Settings;
use crate::data::{LabelledQuery, SyntheticSpec, generate};
use crate::domain::{ClassLabel, Match, Model};
use crate::error::FaceError;
use crate::fit::{Training, train};
use crate::io::{LoadedDatabase, export_legacy, list_images, load_image, load_training_set, write_model_json};
use crate::recognize::classify_batch;
use crate::report::{EvaluationReport, evaluate};

/// Outputs of a directory training run.
#[derive(Debug, Clone)]
pub struct TrainOutput {
    pub database: LoadedDatabase,
    pub training: Training,
}

/// Outputs of a synthetic demo run.
#[derive(Debug, Clone)]
pub struct DemoOutput {
    pub training: Training,
    pub report: EvaluationReport,
}

/// Load `dir`, train, attach image size and class names, and save the model.
pub fn train_from_dir(
    dir: &Path,
    settings: &Settings,
    out: &Path,
    export_mat: Option<&Path>,
) -> Result<TrainOutput, FaceError> {
    let database = load_training_set(dir, settings.train.class_population, settings.image_dims())?;
    info!(
        dir = %dir.display(),
        images = database.files.len(),
        width = database.width,
        height = database.height,
        "training database loaded"
    );

    let mut training = train(&database.set, &settings.train)?;
    training.model = training
        .model
        .with_image_dims(database.width, database.height)?
        .with_labels(database.labels.clone())?;

    write_model_json(out, &training.model)?;
    if let Some(mat_dir) = export_mat {
        export_legacy(mat_dir, &training)?;
    }

    Ok(TrainOutput { database, training })
}

/// Load and classify each image with `model`. Results follow `images` order.
pub fn recognize_files(model: &Model, images: &[PathBuf]) -> Result<Vec<(PathBuf, Match)>, FaceError> {
    let queries = load_queries(model, images)?;
    let matches = classify_batch(model, &queries)?;
    Ok(images.iter().cloned().zip(matches).collect())
}

/// Classify every image in `dir`, expecting image i (natural order) to be class i.
pub fn evaluate_dir(model: &Model, dir: &Path) -> Result<EvaluationReport, FaceError> {
    let files = list_images(dir)?;
    if files.is_empty() {
        return Err(FaceError::io(dir, "no test images found"));
    }
    if files.len() > model.class_count() {
        return Err(FaceError::Model(format!(
            "{} test images but the model only knows {} classes",
            files.len(),
            model.class_count()
        )));
    }

    let vectors = load_queries(model, &files)?;
    let queries: Vec<LabelledQuery> = files
        .iter()
        .zip(vectors)
        .enumerate()
        .map(|(i, (path, vector))| LabelledQuery {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            vector,
            expected: ClassLabel(i),
        })
        .collect();

    evaluate(model, &queries)
}

/// Train on synthetic clusters and score one noisy query per class.
pub fn run_demo(spec: &SyntheticSpec, settings: &Settings, query_noise: f64) -> Result<DemoOutput, FaceError> {
    let data = generate(spec)?;
    let mut config = settings.train.clone();
    config.class_population = spec.per_class;

    let training = train(&data.training, &config)?;
    let queries = data.queries(query_noise, spec.seed.wrapping_add(1))?;
    let report = evaluate(&training.model, &queries)?;
    Ok(DemoOutput { training, report })
}

fn load_queries(model: &Model, paths: &[PathBuf]) -> Result<Vec<DVector<f64>>, FaceError> {
    paths
        .iter()
        .map(|path| {
            let face = load_image(path, model.image_dims())?;
            if face.pixels.len() != model.pixels() {
                return Err(FaceError::image(
                    path,
                    format!("has {} pixels, model expects {}", face.pixels.len(), model.pixels()),
                ));
            }
            Ok(DVector::from_vec(face.pixels))
        })
        .collect()
}

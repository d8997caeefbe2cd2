//! Read/write model JSON files.
//!
//! Model JSON is the portable form of a trained recognizer:
//! - training mean, combined transform and projected training vectors
//! - class population, optional image size and class names
//! - provenance (tool, version, training time, Fisher eigenvalues)
//!
//! The schema is defined by `domain::Model`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::domain::Model;
use crate::error::FaceError;

/// Write a model JSON file.
pub fn write_model_json(path: &Path, model: &Model) -> Result<(), FaceError> {
    let file = File::create(path).map_err(|e| FaceError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, model)
        .map_err(|e| FaceError::Model(format!("failed to write '{}': {e}", path.display())))?;
    writer.flush().map_err(|e| FaceError::io(path, e))?;

    debug!(path = %path.display(), "model written");
    Ok(())
}

/// Read a model JSON file and re-check its shapes.
pub fn read_model_json(path: &Path) -> Result<Model, FaceError> {
    let file = File::open(path).map_err(|e| FaceError::io(path, e))?;
    let model: Model = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| FaceError::Model(format!("invalid model JSON '{}': {e}", path.display())))?;
    model.validate()?;
    Ok(model)
}
